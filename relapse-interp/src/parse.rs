//! XML tokenizing parser producing the labelled-tree form consumed by the
//! matcher.
//!
//! Labels follow the prefix convention the value predicates rely on:
//! elements become `elem_<name>` nodes, attributes `attr_<name>` nodes
//! holding a single `text_<value>` leaf, and text content `text_<content>`
//! leaves. `xmlns` declarations are surfaced as ordinary attributes, which
//! is what the translated grammars' synthetic namespace checks expect.

use xmlparser::{ElementEnd, Token, Tokenizer};

pub const ELEM_PREFIX: &str = "elem_";
pub const ATTR_PREFIX: &str = "attr_";
pub const TEXT_PREFIX: &str = "text_";

/// A node of the labelled document tree. Leaves are nodes without children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub label: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(label: String) -> XmlNode {
        XmlNode {
            label,
            children: vec![],
        }
    }
}

#[derive(Debug)]
pub enum ParseError {
    Xml(xmlparser::Error),
    UndefinedEntity { name: String },
    UnbalancedElement,
    NoRootElement,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Xml(e) => write!(f, "{}", e),
            ParseError::UndefinedEntity { name } => write!(f, "undefined entity &{};", name),
            ParseError::UnbalancedElement => write!(f, "unbalanced element"),
            ParseError::NoRootElement => write!(f, "no root element"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<xmlparser::Error> for ParseError {
    fn from(e: xmlparser::Error) -> ParseError {
        ParseError::Xml(e)
    }
}

/// Parses a document into its root element's labelled tree.
pub fn parse_document(text: &str) -> Result<XmlNode, ParseError> {
    // index 0 is a virtual document node
    let mut stack = vec![XmlNode::new(String::new())];
    for token in Tokenizer::from(text) {
        match token? {
            Token::ElementStart { local, .. } => {
                stack.push(XmlNode::new(format!("{}{}", ELEM_PREFIX, local.as_str())));
            }
            Token::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                let name = if prefix.as_str().is_empty() {
                    local.as_str().to_string()
                } else {
                    format!("{}:{}", prefix.as_str(), local.as_str())
                };
                let value = decode_entities(value.as_str())?;
                let parent = stack.last_mut().ok_or(ParseError::UnbalancedElement)?;
                let mut attr = XmlNode::new(format!("{}{}", ATTR_PREFIX, name));
                attr.children
                    .push(XmlNode::new(format!("{}{}", TEXT_PREFIX, value)));
                parent.children.push(attr);
            }
            Token::ElementEnd { end, .. } => match end {
                ElementEnd::Open => {}
                ElementEnd::Close(..) | ElementEnd::Empty => {
                    if stack.len() < 2 {
                        return Err(ParseError::UnbalancedElement);
                    }
                    let node = stack.pop().expect("element on stack");
                    stack
                        .last_mut()
                        .expect("parent on stack")
                        .children
                        .push(node);
                }
            },
            Token::Text { text } => {
                if stack.len() == 1 {
                    // whitespace around the root element is not content
                    continue;
                }
                let content = decode_entities(text.as_str())?;
                stack
                    .last_mut()
                    .expect("element on stack")
                    .children
                    .push(XmlNode::new(format!("{}{}", TEXT_PREFIX, content)));
            }
            Token::Cdata { text, .. } => {
                stack
                    .last_mut()
                    .ok_or(ParseError::UnbalancedElement)?
                    .children
                    .push(XmlNode::new(format!("{}{}", TEXT_PREFIX, text.as_str())));
            }
            Token::Declaration { .. }
            | Token::ProcessingInstruction { .. }
            | Token::Comment { .. }
            | Token::DtdStart { .. }
            | Token::EmptyDtd { .. }
            | Token::EntityDeclaration { .. }
            | Token::DtdEnd { .. } => {}
        }
    }
    let document = stack.pop().ok_or(ParseError::UnbalancedElement)?;
    if !stack.is_empty() {
        return Err(ParseError::UnbalancedElement);
    }
    document
        .children
        .into_iter()
        .find(|node| node.label.starts_with(ELEM_PREFIX))
        .ok_or(ParseError::NoRootElement)
}

fn decode_entities(text: &str) -> Result<String, ParseError> {
    if !text.contains('&') {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        let end = rest.find(';').ok_or_else(|| ParseError::UndefinedEntity {
            name: rest.to_string(),
        })?;
        let name = &rest[..end];
        match name {
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "amp" => out.push('&'),
            "apos" => out.push('\''),
            "quot" => out.push('"'),
            _ => {
                let code = name
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| name.strip_prefix('#').map(str::parse))
                    .and_then(Result::ok)
                    .and_then(char::from_u32);
                match code {
                    Some(c) => out.push(c),
                    None => {
                        return Err(ParseError::UndefinedEntity {
                            name: name.to_string(),
                        })
                    }
                }
            }
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

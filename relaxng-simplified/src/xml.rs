//! Deserializer from the simplified RELAX NG XML wire shape into the
//! [`crate::types`] data model.

use crate::types::*;
use roxmltree::Node;
use std::ops::Range;

pub type Span = Range<usize>;

#[derive(Debug)]
pub enum Error {
    /// Expected value was not present in the input
    Expected(Span, &'static str),
    /// An unexpected value was present in the input
    Unexpected(Span, &'static str),
    Xml(Span, String),
}

impl Error {
    pub fn span(&self) -> &Span {
        match self {
            Error::Expected(span, _) | Error::Unexpected(span, _) | Error::Xml(span, _) => span,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Expected(_, what) => write!(f, "expected {}", what),
            Error::Unexpected(_, what) => write!(f, "unexpected {}", what),
            Error::Xml(_, msg) => write!(f, "{}", msg),
        }
    }
}

type Result<T> = std::result::Result<T, Error>;

const NS: &str = "http://relaxng.org/ns/structure/1.0";

pub fn parse(text: &str) -> Result<Grammar> {
    let doc = roxmltree::Document::parse(text).map_err(|e| {
        let pos = e.pos();
        let off = text
            .lines()
            .take(pos.row.saturating_sub(1) as usize)
            .map(|line| line.len() + 1)
            .sum::<usize>()
            + pos.col.saturating_sub(1) as usize;
        Error::Xml(off..off + 1, e.to_string())
    })?;
    grammar(doc.root_element())
}

fn grammar(node: Node) -> Result<Grammar> {
    if !is_el(node, "grammar") {
        return Err(Error::Expected(node.range(), "<grammar> root element"));
    }
    let start_el = first_srng_child(node)
        .ok_or_else(|| Error::Expected(node.range(), "<start> child element"))?;
    if !is_el(start_el, "start") {
        return Err(Error::Expected(start_el.range(), "<start> element"));
    }
    let start_child = first_srng_child(start_el)
        .ok_or_else(|| Error::Expected(start_el.range(), "pattern child of <start>"))?;
    let start = name_or_pattern(start_child)?;
    if let Some(extra) = next_srng_sibling(start_child) {
        return Err(Error::Unexpected(
            extra.range(),
            "second child element of <start>",
        ));
    }
    let mut defines = vec![];
    let mut next = next_srng_sibling(start_el);
    while let Some(child) = next {
        defines.push(define(child)?);
        next = next_srng_sibling(child);
    }
    Ok(Grammar { start, defines })
}

fn define(node: Node) -> Result<Define> {
    if !is_el(node, "define") {
        return Err(Error::Expected(node.range(), "<define> element"));
    }
    let name = node
        .attribute("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Expected(node.range(), "non-empty name attribute"))?;
    let element = first_srng_child(node)
        .ok_or_else(|| Error::Expected(node.range(), "<element> child of <define>"))?;
    if !is_el(element, "element") {
        return Err(Error::Expected(element.range(), "<element> element"));
    }
    if let Some(extra) = next_srng_sibling(element) {
        return Err(Error::Unexpected(
            extra.range(),
            "second child element of <define>",
        ));
    }
    Ok(Define {
        name: name.to_string(),
        element: pair(element)?,
    })
}

fn name_or_pattern(node: Node) -> Result<NameOrPattern> {
    if !node.is_element() || !is_srng(node.tag_name().namespace()) {
        return Err(Error::Expected(node.range(), "pattern or name-class element"));
    }
    match node.tag_name().name() {
        "notAllowed" => leaf(node).map(|()| NameOrPattern::NotAllowed),
        "empty" => leaf(node).map(|()| NameOrPattern::Empty),
        "text" => leaf(node).map(|()| NameOrPattern::Text),
        "data" => data(node).map(NameOrPattern::Data),
        "value" => value(node).map(NameOrPattern::Value),
        "list" => single_child(node).map(|p| NameOrPattern::List(Box::new(p))),
        "attribute" => pair(node).map(NameOrPattern::Attribute),
        "ref" => ref_patt(node),
        "oneOrMore" => single_child(node).map(|p| NameOrPattern::OneOrMore(Box::new(p))),
        "choice" => pair(node).map(NameOrPattern::Choice),
        "group" => pair(node).map(NameOrPattern::Group),
        "interleave" => pair(node).map(NameOrPattern::Interleave),
        "anyName" => any_name(node),
        "nsName" => ns_name(node),
        "name" => name(node),
        _ => Err(Error::Expected(node.range(), "pattern or name-class element")),
    }
}

/// Containers like `<choice>` and `<group>` have exactly two children in the
/// simplified syntax.
fn pair(node: Node) -> Result<Pair> {
    let left_el = first_srng_child(node)
        .ok_or_else(|| Error::Expected(node.range(), "two child elements"))?;
    let right_el = next_srng_sibling(left_el)
        .ok_or_else(|| Error::Expected(node.range(), "second child element"))?;
    if let Some(extra) = next_srng_sibling(right_el) {
        return Err(Error::Unexpected(extra.range(), "third child element"));
    }
    Ok(Pair::new(name_or_pattern(left_el)?, name_or_pattern(right_el)?))
}

fn single_child(node: Node) -> Result<NameOrPattern> {
    let child = first_srng_child(node)
        .ok_or_else(|| Error::Expected(node.range(), "child pattern element"))?;
    if let Some(extra) = next_srng_sibling(child) {
        return Err(Error::Unexpected(extra.range(), "second child element"));
    }
    name_or_pattern(child)
}

fn leaf(node: Node) -> Result<()> {
    if let Some(child) = first_srng_child(node) {
        return Err(Error::Unexpected(child.range(), "child element"));
    }
    Ok(())
}

fn ref_patt(node: Node) -> Result<NameOrPattern> {
    leaf(node)?;
    let name = node
        .attribute("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Expected(node.range(), "non-empty name attribute"))?;
    Ok(NameOrPattern::Ref(name.to_string()))
}

fn data(node: Node) -> Result<Data> {
    let type_name = node.attribute("type").unwrap_or("").trim().to_string();
    let datatype_library = node.attribute("datatypeLibrary").unwrap_or("").to_string();
    let mut params = vec![];
    let mut next = first_srng_child(node);
    while let Some(child) = next {
        if !is_el(child, "param") {
            break;
        }
        params.push(param(child)?);
        next = next_srng_sibling(child);
    }
    let except = if let Some(child) = next {
        if !is_el(child, "except") {
            return Err(Error::Expected(child.range(), "<param> or <except> element"));
        }
        if let Some(extra) = next_srng_sibling(child) {
            return Err(Error::Unexpected(extra.range(), "element after <except>"));
        }
        Some(Box::new(except_patterns(child)?))
    } else {
        None
    };
    Ok(Data {
        type_name,
        datatype_library,
        params,
        except,
    })
}

/// `<except>` holds one pattern; several children fold into nested choices.
fn except_patterns(node: Node) -> Result<NameOrPattern> {
    let mut child = first_srng_child(node)
        .ok_or_else(|| Error::Expected(node.range(), "child pattern element"))?;
    let mut patt = name_or_pattern(child)?;
    while let Some(next) = next_srng_sibling(child) {
        patt = NameOrPattern::Choice(Pair::new(patt, name_or_pattern(next)?));
        child = next;
    }
    Ok(patt)
}

fn param(node: Node) -> Result<Param> {
    let name = node
        .attribute("name")
        .ok_or_else(|| Error::Expected(node.range(), "name attribute"))?;
    Ok(Param {
        name: name.trim().to_string(),
        value: node.text().unwrap_or("").to_string(),
    })
}

fn value(node: Node) -> Result<Value> {
    if let Some(child) = node.first_element_child() {
        return Err(Error::Unexpected(child.range(), "child element of <value>"));
    }
    Ok(Value {
        type_name: node.attribute("type").unwrap_or("").trim().to_string(),
        datatype_library: node.attribute("datatypeLibrary").unwrap_or("").to_string(),
        ns: node.attribute("ns").unwrap_or("").to_string(),
        text: node.text().unwrap_or("").to_string(),
    })
}

fn any_name(node: Node) -> Result<NameOrPattern> {
    Ok(NameOrPattern::AnyName {
        except: name_class_except(node)?.map(Box::new),
    })
}

fn ns_name(node: Node) -> Result<NameOrPattern> {
    Ok(NameOrPattern::NsName {
        ns: node.attribute("ns").unwrap_or("").to_string(),
        except: name_class_except(node)?.map(Box::new),
    })
}

fn name_class_except(node: Node) -> Result<Option<NameOrPattern>> {
    let child = match first_srng_child(node) {
        Some(child) => child,
        None => return Ok(None),
    };
    if !is_el(child, "except") {
        return Err(Error::Expected(child.range(), "<except> element"));
    }
    if let Some(extra) = next_srng_sibling(child) {
        return Err(Error::Unexpected(extra.range(), "element after <except>"));
    }
    except_patterns(child).map(Some)
}

fn name(node: Node) -> Result<NameOrPattern> {
    if let Some(child) = node.first_element_child() {
        return Err(Error::Unexpected(child.range(), "child element of <name>"));
    }
    let text = node.text().unwrap_or("").trim();
    if text.is_empty() {
        return Err(Error::Expected(node.range(), "text content in <name>"));
    }
    Ok(NameOrPattern::Name {
        ns: node.attribute("ns").unwrap_or("").to_string(),
        text: text.to_string(),
    })
}

fn first_srng_child<'a, 'input: 'a>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    let mut child = node.first_element_child();
    while let Some(node) = child {
        if is_srng_node(node) {
            return Some(node);
        }
        child = node.next_sibling_element();
    }
    None
}

fn next_srng_sibling<'a, 'input: 'a>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    let mut child = node.next_sibling_element();
    while let Some(node) = child {
        if is_srng_node(node) {
            return Some(node);
        }
        child = node.next_sibling_element();
    }
    None
}

fn is_el(node: Node, name: &'static str) -> bool {
    node.is_element() && node.tag_name().name() == name && is_srng_node(node)
}

fn is_srng_node(node: Node) -> bool {
    is_srng(node.tag_name().namespace())
}

// Simplifier output is seen both with and without the structure namespace,
// so an absent namespace is accepted too.
fn is_srng(ns: Option<&str>) -> bool {
    ns.is_none() || ns == Some(NS)
}

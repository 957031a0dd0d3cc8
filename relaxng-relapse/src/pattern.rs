//! The recursive rewrites from the simplified RELAX NG algebra into Relapse
//! patterns and name expressions.

use crate::analysis::has_attr;
use crate::funcs::{
    new_any_value, new_list, new_text_value, new_token_value, new_whitespace,
    normalize_token_literal,
};
use crate::TranslateError;
use relapse_syntax::{NameExpr, Pattern};
use relaxng_simplified::NameOrPattern;

/// Rewrites a pattern subtree. `attr` is true iff we are inside an
/// `<attribute>` body, where whitespace and grouping behave differently.
pub(crate) fn translate_pattern(
    p: &NameOrPattern,
    attr: bool,
) -> Result<Pattern, TranslateError> {
    match p {
        NameOrPattern::NotAllowed => Ok(Pattern::empty_set()),
        NameOrPattern::Empty => {
            // element content may still contain whitespace text; attribute
            // values present exactly one token, which must then be blank
            if attr {
                Ok(new_whitespace())
            } else {
                Ok(Pattern::or(Pattern::Empty, new_whitespace()))
            }
        }
        NameOrPattern::Text => Ok(Pattern::zero_or_more(new_any_value())),
        NameOrPattern::Data(data) => {
            if !data.datatype_library.is_empty() {
                return Err(TranslateError::DatatypeLibraryNotSupported {
                    library: data.datatype_library.clone(),
                });
            }
            if let Some(param) = data.params.first() {
                return Err(TranslateError::ParamNotSupported {
                    name: param.name.clone(),
                });
            }
            match &data.except {
                None => Ok(Pattern::or(new_any_value(), Pattern::Empty)),
                Some(except) => {
                    let (excluded, nullable) = translate_leaf(except)?;
                    let v = Pattern::and(new_any_value(), Pattern::not(excluded));
                    if nullable {
                        Ok(Pattern::and(v, Pattern::not(Pattern::Empty)))
                    } else {
                        Ok(Pattern::or(v, Pattern::Empty))
                    }
                }
            }
        }
        NameOrPattern::Value(_) => {
            let (v, nullable) = translate_leaf(p)?;
            if nullable {
                Ok(Pattern::or(v, Pattern::Empty))
            } else {
                Ok(v)
            }
        }
        NameOrPattern::List(inner) => new_list(inner),
        NameOrPattern::Attribute(pair) => {
            let name = translate_name_class(&pair.left, true)?;
            let body = translate_pattern(&pair.right, true)?;
            Ok(Pattern::tree_node(name, body))
        }
        NameOrPattern::Ref(name) => Ok(Pattern::reference(name.clone())),
        NameOrPattern::OneOrMore(inner) => {
            let inside = translate_pattern(inner, attr)?;
            Ok(Pattern::concat(
                inside.clone(),
                Pattern::zero_or_more(inside),
            ))
        }
        NameOrPattern::Choice(pair) => {
            if p.is_name_class() {
                return Err(TranslateError::NameClassInPatternPosition { found: "choice" });
            }
            let left = translate_pattern(&pair.left, attr)?;
            let right = translate_pattern(&pair.right, attr)?;
            Ok(Pattern::or(left, right))
        }
        NameOrPattern::Group(pair) => {
            let left = translate_pattern(&pair.left, attr)?;
            let right = translate_pattern(&pair.right, attr)?;
            if attr {
                return Ok(Pattern::interleave(left, right));
            }
            // Attributes in a group may appear in any order in the start
            // tag; the target form canonicalizes to attributes-first.
            if has_attr(&pair.right) {
                if has_attr(&pair.left) {
                    Ok(Pattern::interleave(left, right))
                } else {
                    Ok(Pattern::concat(right, left))
                }
            } else {
                Ok(Pattern::concat(left, right))
            }
        }
        NameOrPattern::Interleave(pair) => {
            let left = translate_pattern(&pair.left, attr)?;
            let right = translate_pattern(&pair.right, attr)?;
            Ok(Pattern::interleave(left, right))
        }
        NameOrPattern::AnyName { .. }
        | NameOrPattern::NsName { .. }
        | NameOrPattern::Name { .. } => Err(TranslateError::NameClassInPatternPosition {
            found: p.variant_name(),
        }),
    }
}

/// Rewrites a `<value>` (or choice of values) leaf, returning the value
/// pattern plus whether it matches the empty string.
pub(crate) fn translate_leaf(p: &NameOrPattern) -> Result<(Pattern, bool), TranslateError> {
    match p {
        NameOrPattern::Value(value) => {
            if !value.ns.is_empty() {
                return Err(TranslateError::ValueNsNotSupported {
                    ns: value.ns.clone(),
                });
            }
            if !value.datatype_library.is_empty() {
                return Err(TranslateError::DatatypeLibraryNotSupported {
                    library: value.datatype_library.clone(),
                });
            }
            if value.is_string() {
                Ok((new_text_value(&value.text), value.text.is_empty()))
            } else {
                let normalized = normalize_token_literal(&value.text);
                let nullable = normalized.is_empty();
                Ok((new_token_value(&normalized), nullable))
            }
        }
        NameOrPattern::Choice(pair) => {
            let (left, left_nullable) = translate_leaf(&pair.left)?;
            let (right, right_nullable) = translate_leaf(&pair.right)?;
            Ok((Pattern::or(left, right), left_nullable || right_nullable))
        }
        other => Err(TranslateError::UnsupportedLeafPattern {
            found: other.variant_name(),
        }),
    }
}

/// Rewrites a name class for `TreeNode` position. `attr` selects the label
/// prefix: attribute names become `attr_*`, element names `elem_*`.
pub(crate) fn translate_name_class(
    nc: &NameOrPattern,
    attr: bool,
) -> Result<NameExpr, TranslateError> {
    match nc {
        NameOrPattern::Choice(pair) => Ok(NameExpr::choice(
            translate_name_class(&pair.left, attr)?,
            translate_name_class(&pair.right, attr)?,
        )),
        NameOrPattern::AnyName { except: None } => Ok(NameExpr::AnyName),
        NameOrPattern::AnyName { except: Some(except) } => Ok(NameExpr::any_name_except(
            translate_name_class(except, attr)?,
        )),
        NameOrPattern::NsName { .. } => Err(TranslateError::NsNameNotSupported),
        NameOrPattern::Name { ns, text } => {
            if !ns.is_empty() {
                // namespaced names are only handled by the element wrapper
                return Err(TranslateError::NameNsNotSupported {
                    name: text.clone(),
                    ns: ns.clone(),
                });
            }
            let prefix = if attr { "attr_" } else { "elem_" };
            Ok(NameExpr::name(format!("{}{}", prefix, text)))
        }
        other => Err(TranslateError::PatternInNameClassPosition {
            found: other.variant_name(),
        }),
    }
}

/// Builds the tree-node wrapper for an element definition. Unlike
/// [`translate_name_class`], a literal name here may carry a namespace: the
/// wrapper then demands an `xmlns` attribute equal to that namespace.
pub(crate) fn new_tree_node(
    nc: &NameOrPattern,
    body: Pattern,
) -> Result<Pattern, TranslateError> {
    match nc {
        NameOrPattern::Choice(pair) => Ok(Pattern::or(
            new_tree_node(&pair.left, body.clone())?,
            new_tree_node(&pair.right, body)?,
        )),
        NameOrPattern::AnyName { except: None } => {
            Ok(Pattern::tree_node(NameExpr::AnyName, body))
        }
        NameOrPattern::AnyName { except: Some(except) } => Ok(Pattern::tree_node(
            NameExpr::any_name_except(translate_name_class(except, false)?),
            body,
        )),
        NameOrPattern::NsName { .. } => Err(TranslateError::NsNameNotSupported),
        NameOrPattern::Name { ns, text } => {
            let name = NameExpr::name(format!("elem_{}", text));
            if ns.is_empty() {
                Ok(Pattern::tree_node(name, body))
            } else {
                let xmlns_check =
                    Pattern::tree_node(NameExpr::name("attr_xmlns"), new_text_value(ns));
                Ok(Pattern::tree_node(name, Pattern::concat(xmlns_check, body)))
            }
        }
        other => Err(TranslateError::PatternInNameClassPosition {
            found: other.variant_name(),
        }),
    }
}

//! Translation of simplified RELAX NG grammars into Relapse, a small
//! tree-automaton validation language.
//!
//! The entry point is [`translate`]; the result is a Relapse reference table
//! whose `main` production corresponds to the grammar's `<start>` and which
//! carries one production per `<define>`, plus whitespace and any-text
//! helper productions.

use relapse_syntax::{NameExpr, Pattern};
use relaxng_simplified::Grammar;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;

pub mod analysis;
mod funcs;
mod pattern;

pub use analysis::{has_attr, has_ns_name};

#[derive(Debug, PartialEq, Eq)]
pub enum TranslateError {
    /// Only the built-in datatype library is supported
    DatatypeLibraryNotSupported { library: String },
    /// Datatype parameters are not supported
    ParamNotSupported { name: String },
    /// The `nsName` name class is not supported, namespaced or not
    NsNameNotSupported,
    ValueNsNotSupported { ns: String },
    ListValueNsNotSupported { ns: String },
    /// A namespaced literal name outside the element-wrapper position
    NameNsNotSupported { name: String, ns: String },
    NameClassInPatternPosition { found: &'static str },
    PatternInNameClassPosition { found: &'static str },
    UnsupportedListPattern { found: &'static str },
    UnsupportedLeafPattern { found: &'static str },
    DuplicateDefine { name: String },
    ReservedDefineName { name: String },
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::DatatypeLibraryNotSupported { library } => {
                write!(f, "datatypeLibrary {:?} is not supported", library)
            }
            TranslateError::ParamNotSupported { name } => {
                write!(f, "datatype param {:?} is not supported", name)
            }
            TranslateError::NsNameNotSupported => write!(f, "nsName is not supported"),
            TranslateError::ValueNsNotSupported { ns } => {
                write!(f, "value ns {:?} is not supported", ns)
            }
            TranslateError::ListValueNsNotSupported { ns } => {
                write!(f, "list value ns {:?} is not supported", ns)
            }
            TranslateError::NameNsNotSupported { name, ns } => write!(
                f,
                "name {:?} with ns {:?} is only supported on elements",
                name, ns
            ),
            TranslateError::NameClassInPatternPosition { found } => {
                write!(f, "name class <{}> found where a pattern was expected", found)
            }
            TranslateError::PatternInNameClassPosition { found } => {
                write!(f, "pattern <{}> found where a name class was expected", found)
            }
            TranslateError::UnsupportedListPattern { found } => {
                write!(f, "<{}> is not supported inside <list>", found)
            }
            TranslateError::UnsupportedLeafPattern { found } => {
                write!(f, "<{}> is not supported as a value leaf", found)
            }
            TranslateError::DuplicateDefine { name } => {
                write!(f, "duplicate definition of {:?}", name)
            }
            TranslateError::ReservedDefineName { name } => {
                write!(f, "definition name {:?} is reserved", name)
            }
        }
    }
}

impl std::error::Error for TranslateError {}

/// Translates a simplified RELAX NG grammar into a Relapse grammar.
///
/// Run [`relaxng_simplified::remove_todos`] over the input first if it came
/// from an upstream simplifier.
pub fn translate(g: &Grammar) -> Result<relapse_syntax::Grammar, TranslateError> {
    let mut names: HashSet<&str> = HashSet::with_capacity(g.defines.len() + 1);
    names.insert(relapse_syntax::MAIN);
    for define in &g.defines {
        if define.name == relapse_syntax::MAIN {
            return Err(TranslateError::ReservedDefineName {
                name: define.name.clone(),
            });
        }
        if !names.insert(&define.name) {
            return Err(TranslateError::DuplicateDefine {
                name: define.name.clone(),
            });
        }
    }
    // helper productions must not shadow user definitions
    let ws_name = fresh_name("ws", &names);
    let text_name = fresh_name("text", &names);

    let mut refs = BTreeMap::new();
    refs.insert(
        relapse_syntax::MAIN.to_string(),
        pattern::translate_pattern(&g.start, false)?,
    );
    for define in &g.defines {
        let mut body = pattern::translate_pattern(&define.element.right, false)?;
        if !has_ns_name(&define.element.left) {
            // permit (but do not check) an xmlns attribute on the element
            body = Pattern::concat(
                Pattern::optional(Pattern::tree_node(
                    NameExpr::name("attr_xmlns"),
                    Pattern::ZAny,
                )),
                body,
            );
        }
        body = pattern::new_tree_node(&define.element.left, body)?;
        // whitespace text may surround the element wherever it is referenced
        body = Pattern::interleave(
            body,
            Pattern::zero_or_more(Pattern::reference(ws_name.clone())),
        );
        refs.insert(define.name.clone(), body);
    }
    refs.insert(ws_name, funcs::new_whitespace());
    refs.insert(text_name, funcs::new_any_value());
    Ok(relapse_syntax::Grammar::new(refs))
}

/// Appends `1`s until the name no longer collides with a user definition.
fn fresh_name(base: &str, taken: &HashSet<&str>) -> String {
    let mut name = base.to_string();
    while taken.contains(name.as_str()) {
        name.push('1');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use relaxng_simplified::xml;

    fn translated(src: &str) -> relapse_syntax::Grammar {
        let mut g = xml::parse(src).unwrap();
        relaxng_simplified::remove_todos(&mut g);
        translate(&g).unwrap()
    }

    const FOO_EMPTY: &str = r#"<grammar>
        <start><ref name="e"/></start>
        <define name="e">
            <element><name ns="">foo</name><empty/></element>
        </define>
    </grammar>"#;

    #[test]
    fn emits_main_defines_and_helpers() {
        let g = translated(FOO_EMPTY);
        let names: Vec<&str> = g.names().collect();
        assert_eq!(names, vec!["e", "main", "text", "ws"]);
        assert_eq!(g.main().unwrap().to_string(), "@e");
    }

    #[test]
    fn unnamespaced_define_permits_unchecked_xmlns() {
        let g = translated(FOO_EMPTY);
        assert_eq!(
            g.lookup("e").unwrap().to_string(),
            "{elem_foo: [(attr_xmlns: *)?, (<empty> | ->whitespace($string))]; (@ws)*}"
        );
    }

    #[test]
    fn namespaced_define_requires_matching_xmlns() {
        let g = translated(
            r#"<grammar>
                <start><ref name="e"/></start>
                <define name="e">
                    <element><name ns="urn:x">foo</name><empty/></element>
                </define>
            </grammar>"#,
        );
        assert_eq!(
            g.lookup("e").unwrap().to_string(),
            "{elem_foo: [attr_xmlns: ->text($string, \"urn:x\"), \
             (<empty> | ->whitespace($string))]; (@ws)*}"
        );
    }

    #[test]
    fn helpers_dodge_colliding_define_names() {
        let g = translated(
            r#"<grammar>
                <start><ref name="ws"/></start>
                <define name="ws">
                    <element><name>ws</name><empty/></element>
                </define>
                <define name="ws1">
                    <element><name>w</name><empty/></element>
                </define>
            </grammar>"#,
        );
        let names: Vec<&str> = g.names().collect();
        assert_eq!(names, vec!["main", "text", "ws", "ws1", "ws11"]);
        // define bodies reference the fresh helper name
        assert!(g.lookup("ws").unwrap().to_string().contains("(@ws11)*"));
        assert_eq!(
            g.lookup("ws11").unwrap().to_string(),
            "->whitespace($string)"
        );
    }

    #[test]
    fn translation_is_deterministic() {
        assert_eq!(
            translated(FOO_EMPTY).to_string(),
            translated(FOO_EMPTY).to_string()
        );
    }

    #[test]
    fn main_is_a_reserved_name() {
        let g = xml::parse(
            r#"<grammar>
                <start><ref name="main"/></start>
                <define name="main">
                    <element><name>foo</name><empty/></element>
                </define>
            </grammar>"#,
        )
        .unwrap();
        assert_matches!(
            translate(&g),
            Err(TranslateError::ReservedDefineName { name }) if name == "main"
        );
    }

    #[test]
    fn duplicate_defines_are_rejected() {
        let g = xml::parse(
            r#"<grammar>
                <start><ref name="e"/></start>
                <define name="e">
                    <element><name>foo</name><empty/></element>
                </define>
                <define name="e">
                    <element><name>bar</name><empty/></element>
                </define>
            </grammar>"#,
        )
        .unwrap();
        assert_matches!(
            translate(&g),
            Err(TranslateError::DuplicateDefine { name }) if name == "e"
        );
    }

    #[test]
    fn ns_name_in_a_define_is_fatal() {
        let g = xml::parse(
            r#"<grammar>
                <start><ref name="e"/></start>
                <define name="e">
                    <element><nsName ns="urn:x"/><empty/></element>
                </define>
            </grammar>"#,
        )
        .unwrap();
        assert_matches!(translate(&g), Err(TranslateError::NsNameNotSupported));
    }

    #[test]
    fn todo_scrub_then_translate_treats_ns_as_absent() {
        let mut g = xml::parse(
            r#"<grammar>
                <start><ref name="e"/></start>
                <define name="e">
                    <element><name ns="TODO">foo</name><empty/></element>
                </define>
            </grammar>"#,
        )
        .unwrap();
        relaxng_simplified::remove_todos(&mut g);
        let out = translate(&g).unwrap();
        // scrubbed ns means the permissive xmlns form
        assert!(out
            .lookup("e")
            .unwrap()
            .to_string()
            .starts_with("{elem_foo: [(attr_xmlns: *)?"));
    }
}

//! Removal of the `ns="TODO"` sentinel.
//!
//! Converting RELAX NG to simplified RELAX NG with the usual upstream tooling
//! leaves `ns` attributes holding the literal `TODO` where no namespace was
//! resolved; those fields are cleared to the empty string before translation.

use crate::types::*;

const SENTINEL: &str = "TODO";

pub fn remove_todos(grammar: &mut Grammar) {
    scrub_pattern(&mut grammar.start);
    for define in &mut grammar.defines {
        scrub_pair(&mut define.element);
    }
}

fn scrub_pair(pair: &mut Pair) {
    scrub_pattern(&mut pair.left);
    scrub_pattern(&mut pair.right);
}

fn scrub_ns(ns: &mut String) {
    if ns == SENTINEL {
        ns.clear();
    }
}

fn scrub_pattern(p: &mut NameOrPattern) {
    match p {
        NameOrPattern::NotAllowed
        | NameOrPattern::Empty
        | NameOrPattern::Text
        | NameOrPattern::Ref(_) => {}
        NameOrPattern::Data(data) => {
            if let Some(except) = &mut data.except {
                scrub_pattern(except);
            }
        }
        NameOrPattern::Value(value) => scrub_ns(&mut value.ns),
        NameOrPattern::List(inner) | NameOrPattern::OneOrMore(inner) => scrub_pattern(inner),
        NameOrPattern::Attribute(pair)
        | NameOrPattern::Choice(pair)
        | NameOrPattern::Group(pair)
        | NameOrPattern::Interleave(pair) => scrub_pair(pair),
        NameOrPattern::AnyName { except } => {
            if let Some(except) = except {
                scrub_pattern(except);
            }
        }
        NameOrPattern::NsName { ns, except } => {
            scrub_ns(ns);
            if let Some(except) = except {
                scrub_pattern(except);
            }
        }
        NameOrPattern::Name { ns, .. } => scrub_ns(ns),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn fixture() -> Grammar {
        xml::parse(
            r#"<grammar>
                <start><ref name="e"/></start>
                <define name="e">
                    <element>
                        <name ns="TODO">foo</name>
                        <group>
                            <attribute><name ns="TODO">a</name><value ns="TODO">x</value></attribute>
                            <value ns="http://example.com/kept">y</value>
                        </group>
                    </element>
                </define>
            </grammar>"#,
        )
        .unwrap()
    }

    fn collected_ns(g: &Grammar) -> Vec<String> {
        fn walk(p: &NameOrPattern, out: &mut Vec<String>) {
            match p {
                NameOrPattern::Name { ns, .. } | NameOrPattern::NsName { ns, .. } => {
                    out.push(ns.clone())
                }
                NameOrPattern::Value(v) => out.push(v.ns.clone()),
                NameOrPattern::Attribute(pair)
                | NameOrPattern::Choice(pair)
                | NameOrPattern::Group(pair)
                | NameOrPattern::Interleave(pair) => {
                    walk(&pair.left, out);
                    walk(&pair.right, out);
                }
                NameOrPattern::List(inner) | NameOrPattern::OneOrMore(inner) => walk(inner, out),
                _ => {}
            }
        }
        let mut out = vec![];
        walk(&g.start, &mut out);
        for d in &g.defines {
            walk(&d.element.left, &mut out);
            walk(&d.element.right, &mut out);
        }
        out
    }

    #[test]
    fn clears_only_todo_sentinels() {
        let mut g = fixture();
        remove_todos(&mut g);
        assert_eq!(
            collected_ns(&g),
            vec!["", "", "", "http://example.com/kept"]
        );
    }

    #[test]
    fn is_idempotent() {
        let mut once = fixture();
        remove_todos(&mut once);
        let mut twice = once.clone();
        remove_todos(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn leaves_non_ns_text_alone() {
        let mut g = xml::parse(
            r#"<grammar>
                <start><ref name="e"/></start>
                <define name="e">
                    <element><name>TODO</name><value>TODO</value></element>
                </define>
            </grammar>"#,
        )
        .unwrap();
        remove_todos(&mut g);
        // only `ns` fields are scrubbed, not name or value text
        match (&*g.defines[0].element.left, &*g.defines[0].element.right) {
            (NameOrPattern::Name { text, .. }, NameOrPattern::Value(v)) => {
                assert_eq!(text, "TODO");
                assert_eq!(v.text, "TODO");
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }
}

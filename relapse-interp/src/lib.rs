//! Interpreter for Relapse grammars over XML documents.
//!
//! Matching is derivative-based: for each child node the current pattern is
//! rewritten to the pattern that must match the remaining children, and a
//! sequence is accepted when the final pattern is nullable. Tree nodes
//! recurse into their children the same way.

use crate::compose::ValueEval;
use crate::parse::{ParseError, XmlNode};
use relapse_syntax::{Grammar, NameExpr, Pattern};

pub mod compose;
pub mod parse;

#[derive(Debug)]
pub enum InterpError {
    /// The grammar has no `main` production
    NoMainProduction,
    UndefinedReference { name: String },
    /// A chain of references that never passes through a tree node
    RecursiveReference { name: String },
    /// A regex operand position held a variable rather than a literal
    NonConstantRegex,
    BadRegex { pattern: String, error: regex::Error },
    Xml(ParseError),
}

impl std::fmt::Display for InterpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpError::NoMainProduction => write!(f, "grammar has no main production"),
            InterpError::UndefinedReference { name } => {
                write!(f, "reference to undefined production {:?}", name)
            }
            InterpError::RecursiveReference { name } => {
                write!(f, "production {:?} refers back to itself", name)
            }
            InterpError::NonConstantRegex => write!(f, "regex operand must be a literal"),
            InterpError::BadRegex { pattern, error } => {
                write!(f, "regex {:?} failed to compile: {}", pattern, error)
            }
            InterpError::Xml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for InterpError {}

impl From<ParseError> for InterpError {
    fn from(e: ParseError) -> InterpError {
        InterpError::Xml(e)
    }
}

/// Translates then matches in one call; use [`Interpreter`] to amortize
/// grammar loading over several documents.
pub fn validate(grammar: &Grammar, xml: &str) -> Result<bool, InterpError> {
    Interpreter::new(grammar.clone())?.validate(xml)
}

pub struct Interpreter {
    grammar: Grammar,
    values: ValueEval,
}

impl Interpreter {
    pub fn new(grammar: Grammar) -> Result<Interpreter, InterpError> {
        if grammar.main().is_none() {
            return Err(InterpError::NoMainProduction);
        }
        for (_, pattern) in grammar.iter() {
            check_references(&grammar, pattern)?;
        }
        for name in grammar.names() {
            check_reference_chain(&grammar, name)?;
        }
        let values = ValueEval::compile(&grammar)?;
        Ok(Interpreter { grammar, values })
    }

    pub fn validate(&self, xml: &str) -> Result<bool, InterpError> {
        let root = parse::parse_document(xml)?;
        Ok(self.accepts(&root))
    }

    /// Does the document's root node match the grammar's `main` production?
    pub fn accepts(&self, root: &XmlNode) -> bool {
        let main = self.grammar.main().expect("checked in new()");
        let after_root = self.deriv(main, root);
        self.nullable(&after_root)
    }

    fn nullable(&self, p: &Pattern) -> bool {
        self.nullable_inner(p, &mut Vec::new())
    }

    // `pending` holds references currently being expanded; re-entering one
    // yields false, the least fixed point.
    fn nullable_inner(&self, p: &Pattern, pending: &mut Vec<String>) -> bool {
        match p {
            Pattern::Empty | Pattern::ZAny | Pattern::ZeroOrMore(_) | Pattern::Optional(_) => true,
            Pattern::Not(inner) => !self.nullable_inner(inner, pending),
            Pattern::Or(a, b) => {
                self.nullable_inner(a, pending) || self.nullable_inner(b, pending)
            }
            Pattern::Concat(a, b) | Pattern::And(a, b) | Pattern::Interleave(a, b) => {
                self.nullable_inner(a, pending) && self.nullable_inner(b, pending)
            }
            Pattern::TreeNode(..) | Pattern::Value(_) => false,
            Pattern::Reference(name) => {
                if pending.iter().any(|pending_name| pending_name == name) {
                    return false;
                }
                match self.grammar.lookup(name) {
                    Some(body) => {
                        pending.push(name.clone());
                        let result = self.nullable_inner(body, pending);
                        pending.pop();
                        result
                    }
                    None => false,
                }
            }
        }
    }

    /// The pattern that the children remaining after `node` must match.
    fn deriv(&self, p: &Pattern, node: &XmlNode) -> Pattern {
        match p {
            Pattern::Empty => Pattern::empty_set(),
            Pattern::ZAny => Pattern::ZAny,
            Pattern::Not(inner) => mk_not(self.deriv(inner, node)),
            Pattern::ZeroOrMore(inner) => {
                mk_concat(self.deriv(inner, node), p.clone())
            }
            Pattern::Optional(inner) => self.deriv(inner, node),
            Pattern::Concat(a, b) => {
                let step = mk_concat(self.deriv(a, node), (**b).clone());
                if self.nullable(a) {
                    mk_or(step, self.deriv(b, node))
                } else {
                    step
                }
            }
            Pattern::Or(a, b) => mk_or(self.deriv(a, node), self.deriv(b, node)),
            Pattern::And(a, b) => mk_and(self.deriv(a, node), self.deriv(b, node)),
            Pattern::Interleave(a, b) => mk_or(
                mk_interleave(self.deriv(a, node), (**b).clone()),
                mk_interleave((**a).clone(), self.deriv(b, node)),
            ),
            Pattern::Reference(name) => match self.grammar.lookup(name) {
                Some(body) => self.deriv(body, node),
                None => Pattern::empty_set(),
            },
            Pattern::TreeNode(name, body) => {
                if name_match(name, &node.label) && self.matches_children(body, &node.children) {
                    Pattern::Empty
                } else {
                    Pattern::empty_set()
                }
            }
            Pattern::Value(expr) => {
                if node.children.is_empty() && self.values.eval(expr, &node.label) {
                    Pattern::Empty
                } else {
                    Pattern::empty_set()
                }
            }
        }
    }

    fn matches_children(&self, p: &Pattern, children: &[XmlNode]) -> bool {
        let mut current = p.clone();
        for child in children {
            current = self.deriv(&current, child);
            if is_empty_set(&current) {
                return false;
            }
        }
        self.nullable(&current)
    }
}

fn name_match(name: &NameExpr, label: &str) -> bool {
    match name {
        NameExpr::AnyName => true,
        NameExpr::AnyNameExcept(except) => !name_match(except, label),
        NameExpr::Name(text) => text == label,
        NameExpr::NameChoice(a, b) => name_match(a, label) || name_match(b, label),
    }
}

fn check_references(grammar: &Grammar, pattern: &Pattern) -> Result<(), InterpError> {
    match pattern {
        Pattern::Empty | Pattern::ZAny | Pattern::Value(_) => Ok(()),
        Pattern::Not(p)
        | Pattern::ZeroOrMore(p)
        | Pattern::Optional(p)
        | Pattern::TreeNode(_, p) => check_references(grammar, p),
        Pattern::Concat(a, b)
        | Pattern::Or(a, b)
        | Pattern::And(a, b)
        | Pattern::Interleave(a, b) => {
            check_references(grammar, a)?;
            check_references(grammar, b)
        }
        Pattern::Reference(name) => {
            if grammar.lookup(name).is_none() {
                Err(InterpError::UndefinedReference { name: name.clone() })
            } else {
                Ok(())
            }
        }
    }
}

// A production that is nothing but a reference to another production could
// make deriv() recurse without consuming input; reject such chains up front.
fn check_reference_chain(grammar: &Grammar, start: &str) -> Result<(), InterpError> {
    let mut seen = vec![start.to_string()];
    let mut current = grammar.lookup(start);
    while let Some(Pattern::Reference(next)) = current {
        if seen.iter().any(|name| name == next) {
            return Err(InterpError::RecursiveReference { name: next.clone() });
        }
        seen.push(next.clone());
        current = grammar.lookup(next);
    }
    Ok(())
}

fn is_empty_set(p: &Pattern) -> bool {
    matches!(p, Pattern::Not(inner) if **inner == Pattern::ZAny)
}

// The constructors below collapse degenerate operands as patterns are
// rewritten, keeping derivative growth in check.

fn mk_or(a: Pattern, b: Pattern) -> Pattern {
    if is_empty_set(&a) {
        return b;
    }
    if is_empty_set(&b) || a == b {
        return a;
    }
    Pattern::or(a, b)
}

fn mk_and(a: Pattern, b: Pattern) -> Pattern {
    if is_empty_set(&a) || is_empty_set(&b) {
        return Pattern::empty_set();
    }
    if a == b {
        return a;
    }
    Pattern::and(a, b)
}

fn mk_concat(a: Pattern, b: Pattern) -> Pattern {
    if is_empty_set(&a) || is_empty_set(&b) {
        return Pattern::empty_set();
    }
    if a == Pattern::Empty {
        return b;
    }
    if b == Pattern::Empty {
        return a;
    }
    Pattern::concat(a, b)
}

fn mk_interleave(a: Pattern, b: Pattern) -> Pattern {
    if is_empty_set(&a) || is_empty_set(&b) {
        return Pattern::empty_set();
    }
    if a == Pattern::Empty {
        return b;
    }
    if b == Pattern::Empty {
        return a;
    }
    Pattern::interleave(a, b)
}

fn mk_not(p: Pattern) -> Pattern {
    if let Pattern::Not(inner) = p {
        return *inner;
    }
    Pattern::not(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relapse_syntax::{BoolExpr, StrExpr, MAIN};
    use std::collections::BTreeMap;

    fn grammar(entries: Vec<(&str, Pattern)>) -> Grammar {
        let refs: BTreeMap<String, Pattern> = entries
            .into_iter()
            .map(|(name, p)| (name.to_string(), p))
            .collect();
        Grammar::new(refs)
    }

    fn accepts(g: &Grammar, xml: &str) -> bool {
        validate(g, xml).unwrap()
    }

    #[test]
    fn tree_node_matches_label_and_children() {
        let g = grammar(vec![(
            MAIN,
            Pattern::tree_node(NameExpr::name("elem_foo"), Pattern::Empty),
        )]);
        assert!(accepts(&g, "<foo/>"));
        assert!(!accepts(&g, "<bar/>"));
        assert!(!accepts(&g, "<foo><x/></foo>"));
    }

    #[test]
    fn zany_matches_anything() {
        let g = grammar(vec![(
            MAIN,
            Pattern::tree_node(NameExpr::name("elem_foo"), Pattern::ZAny),
        )]);
        assert!(accepts(&g, "<foo/>"));
        assert!(accepts(&g, r#"<foo a="1"><deep><er/></deep>text</foo>"#));
    }

    #[test]
    fn concat_orders_children() {
        let body = Pattern::concat(
            Pattern::tree_node(NameExpr::name("elem_a"), Pattern::Empty),
            Pattern::tree_node(NameExpr::name("elem_b"), Pattern::Empty),
        );
        let g = grammar(vec![(
            MAIN,
            Pattern::tree_node(NameExpr::name("elem_x"), body),
        )]);
        assert!(accepts(&g, "<x><a/><b/></x>"));
        assert!(!accepts(&g, "<x><b/><a/></x>"));
        assert!(!accepts(&g, "<x><a/></x>"));
    }

    #[test]
    fn interleave_allows_either_order() {
        let body = Pattern::interleave(
            Pattern::tree_node(NameExpr::name("elem_a"), Pattern::Empty),
            Pattern::tree_node(NameExpr::name("elem_b"), Pattern::Empty),
        );
        let g = grammar(vec![(
            MAIN,
            Pattern::tree_node(NameExpr::name("elem_x"), body),
        )]);
        assert!(accepts(&g, "<x><a/><b/></x>"));
        assert!(accepts(&g, "<x><b/><a/></x>"));
        assert!(!accepts(&g, "<x><a/></x>"));
    }

    #[test]
    fn not_inverts_a_value_leaf() {
        let body = Pattern::and(
            Pattern::value(BoolExpr::AnyText(StrExpr::Var)),
            Pattern::not(Pattern::value(BoolExpr::Token(
                StrExpr::Var,
                StrExpr::constant("no"),
            ))),
        );
        let g = grammar(vec![(
            MAIN,
            Pattern::tree_node(NameExpr::name("elem_x"), body),
        )]);
        assert!(accepts(&g, "<x>yes</x>"));
        assert!(!accepts(&g, "<x>no</x>"));
    }

    #[test]
    fn references_resolve_through_the_table() {
        let g = grammar(vec![
            (MAIN, Pattern::reference("e")),
            (
                "e",
                Pattern::tree_node(NameExpr::name("elem_foo"), Pattern::Empty),
            ),
        ]);
        assert!(accepts(&g, "<foo/>"));
    }

    #[test]
    fn undefined_reference_is_a_load_error() {
        let g = grammar(vec![(MAIN, Pattern::reference("ghost"))]);
        match Interpreter::new(g) {
            Err(InterpError::UndefinedReference { name }) => assert_eq!(name, "ghost"),
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn reference_cycle_is_a_load_error() {
        let g = grammar(vec![
            (MAIN, Pattern::reference("a")),
            ("a", Pattern::reference("b")),
            ("b", Pattern::reference("a")),
        ]);
        match Interpreter::new(g) {
            Err(InterpError::RecursiveReference { .. }) => {}
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn name_choice_and_except() {
        assert!(name_match(
            &NameExpr::choice(NameExpr::name("elem_a"), NameExpr::name("elem_b")),
            "elem_b"
        ));
        assert!(!name_match(
            &NameExpr::any_name_except(NameExpr::name("elem_a")),
            "elem_a"
        ));
        assert!(name_match(
            &NameExpr::any_name_except(NameExpr::name("elem_a")),
            "elem_b"
        ));
    }

    #[test]
    fn smart_constructors_collapse_degenerate_operands() {
        assert_eq!(mk_or(Pattern::empty_set(), Pattern::Empty), Pattern::Empty);
        assert_eq!(
            mk_concat(Pattern::Empty, Pattern::ZAny),
            Pattern::ZAny
        );
        assert_eq!(
            mk_and(Pattern::empty_set(), Pattern::Empty),
            Pattern::empty_set()
        );
        assert_eq!(mk_not(Pattern::empty_set()), Pattern::ZAny);
        assert_eq!(
            mk_interleave(Pattern::Empty, Pattern::Empty),
            Pattern::Empty
        );
    }
}

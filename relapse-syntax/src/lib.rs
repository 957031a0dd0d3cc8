//! AST for the Relapse validation language, plus the textual formatter used
//! when emitting a translated grammar.

use std::collections::BTreeMap;
use std::fmt;

/// A Relapse pattern over labelled trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches the empty sequence of children
    Empty,
    /// Matches any subtree
    ZAny,
    Not(Box<Pattern>),
    ZeroOrMore(Box<Pattern>),
    Optional(Box<Pattern>),
    Concat(Box<Pattern>, Box<Pattern>),
    Or(Box<Pattern>, Box<Pattern>),
    And(Box<Pattern>, Box<Pattern>),
    Interleave(Box<Pattern>, Box<Pattern>),
    /// Reference to a named production in the enclosing grammar
    Reference(String),
    /// Matches a single child node whose label is accepted by the name
    /// expression and whose own children match the body
    TreeNode(NameExpr, Box<Pattern>),
    /// Leaf predicate over the label of a single child node
    Value(BoolExpr),
}

impl Pattern {
    pub fn not(p: Pattern) -> Pattern {
        Pattern::Not(Box::new(p))
    }
    pub fn zero_or_more(p: Pattern) -> Pattern {
        Pattern::ZeroOrMore(Box::new(p))
    }
    pub fn optional(p: Pattern) -> Pattern {
        Pattern::Optional(Box::new(p))
    }
    pub fn concat(left: Pattern, right: Pattern) -> Pattern {
        Pattern::Concat(Box::new(left), Box::new(right))
    }
    pub fn or(left: Pattern, right: Pattern) -> Pattern {
        Pattern::Or(Box::new(left), Box::new(right))
    }
    pub fn and(left: Pattern, right: Pattern) -> Pattern {
        Pattern::And(Box::new(left), Box::new(right))
    }
    pub fn interleave(left: Pattern, right: Pattern) -> Pattern {
        Pattern::Interleave(Box::new(left), Box::new(right))
    }
    pub fn reference(name: impl Into<String>) -> Pattern {
        Pattern::Reference(name.into())
    }
    pub fn tree_node(name: NameExpr, body: Pattern) -> Pattern {
        Pattern::TreeNode(name, Box::new(body))
    }
    pub fn value(expr: BoolExpr) -> Pattern {
        Pattern::Value(expr)
    }
    /// The pattern matching nothing at all, in its canonical `!(*)` form
    pub fn empty_set() -> Pattern {
        Pattern::not(Pattern::ZAny)
    }
}

/// An expression over node labels, used in `TreeNode` position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameExpr {
    AnyName,
    AnyNameExcept(Box<NameExpr>),
    Name(String),
    NameChoice(Box<NameExpr>, Box<NameExpr>),
}

impl NameExpr {
    pub fn name(text: impl Into<String>) -> NameExpr {
        NameExpr::Name(text.into())
    }
    pub fn any_name_except(except: NameExpr) -> NameExpr {
        NameExpr::AnyNameExcept(Box::new(except))
    }
    pub fn choice(left: NameExpr, right: NameExpr) -> NameExpr {
        NameExpr::NameChoice(Box::new(left), Box::new(right))
    }
}

/// String-valued operand of a predicate: either the label currently under
/// test, or a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrExpr {
    Var,
    Const(String),
}

impl StrExpr {
    pub fn constant(s: impl Into<String>) -> StrExpr {
        StrExpr::Const(s.into())
    }
}

/// The boolean expression language of `Pattern::Value` leaves.
///
/// `Token`, `Whitespace`, `AnyText`, `Text` and `List` are the
/// domain-specific predicates; all of them strip the `text_` content prefix
/// before comparison and fail (without error) when the prefix is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolExpr {
    StringEq(StrExpr, StrExpr),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
    Not(Box<BoolExpr>),
    /// `Regex(pattern, subject)` — anchoring is the caller's concern
    Regex(StrExpr, StrExpr),
    TypeString(StrExpr),
    /// Whitespace-collapsed comparison against a literal
    Token(StrExpr, StrExpr),
    /// True iff the content is whitespace only
    Whitespace(StrExpr),
    /// True iff the label carries the content prefix at all
    AnyText(StrExpr),
    /// Exact comparison against a literal
    Text(StrExpr, StrExpr),
    /// Whitespace-tokenized content matched against an anchored regex
    List(StrExpr, StrExpr),
}

/// A grammar is a table of named productions; `main` is the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    refs: BTreeMap<String, Pattern>,
}

pub const MAIN: &str = "main";

impl Grammar {
    pub fn new(refs: BTreeMap<String, Pattern>) -> Grammar {
        Grammar { refs }
    }

    pub fn lookup(&self, name: &str) -> Option<&Pattern> {
        self.refs.get(name)
    }

    pub fn main(&self) -> Option<&Pattern> {
        self.refs.get(MAIN)
    }

    /// Productions in formatter order: `main` first, the rest by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.refs
            .get_key_value(MAIN)
            .into_iter()
            .chain(self.refs.iter().filter(|(name, _)| name.as_str() != MAIN))
            .map(|(name, patt)| (name.as_str(), patt))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.refs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, patt) in self.iter() {
            writeln!(f, "#{} = {}", name, patt)?;
        }
        Ok(())
    }
}

fn is_bare_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Empty => write!(f, "<empty>"),
            Pattern::ZAny => write!(f, "*"),
            Pattern::Not(p) => write!(f, "!({})", p),
            Pattern::ZeroOrMore(p) => write!(f, "({})*", p),
            Pattern::Optional(p) => write!(f, "({})?", p),
            Pattern::Concat(a, b) => write!(f, "[{}, {}]", a, b),
            Pattern::Or(a, b) => write!(f, "({} | {})", a, b),
            Pattern::And(a, b) => write!(f, "({} & {})", a, b),
            Pattern::Interleave(a, b) => write!(f, "{{{}; {}}}", a, b),
            Pattern::Reference(name) => write!(f, "@{}", name),
            Pattern::TreeNode(name, body) => write!(f, "{}: {}", name, body),
            Pattern::Value(expr) => write!(f, "->{}", expr),
        }
    }
}

impl fmt::Display for NameExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameExpr::AnyName => write!(f, "_"),
            NameExpr::AnyNameExcept(except) => write!(f, "!({})", except),
            NameExpr::Name(text) => {
                if is_bare_name(text) {
                    write!(f, "{}", text)
                } else {
                    write!(f, "{:?}", text)
                }
            }
            NameExpr::NameChoice(a, b) => write!(f, "({}|{})", a, b),
        }
    }
}

impl fmt::Display for StrExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrExpr::Var => write!(f, "$string"),
            StrExpr::Const(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::StringEq(a, b) => write!(f, "eq({}, {})", a, b),
            BoolExpr::And(a, b) => write!(f, "and({}, {})", a, b),
            BoolExpr::Or(a, b) => write!(f, "or({}, {})", a, b),
            BoolExpr::Not(e) => write!(f, "not({})", e),
            BoolExpr::Regex(pattern, subject) => write!(f, "regex({}, {})", pattern, subject),
            BoolExpr::TypeString(s) => write!(f, "type({})", s),
            BoolExpr::Token(s, c) => write!(f, "token({}, {})", s, c),
            BoolExpr::Whitespace(s) => write!(f, "whitespace({})", s),
            BoolExpr::AnyText(s) => write!(f, "anytext({})", s),
            BoolExpr::Text(s, c) => write!(f, "text({}, {})", s, c),
            BoolExpr::List(s, c) => write!(f, "list({}, {})", s, c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_patterns() {
        let p = Pattern::concat(
            Pattern::tree_node(
                NameExpr::name("elem_foo"),
                Pattern::or(Pattern::Empty, Pattern::value(BoolExpr::Whitespace(StrExpr::Var))),
            ),
            Pattern::zero_or_more(Pattern::reference("ws")),
        );
        assert_eq!(
            p.to_string(),
            "[elem_foo: (<empty> | ->whitespace($string)), (@ws)*]"
        );
    }

    #[test]
    fn formats_empty_set() {
        assert_eq!(Pattern::empty_set().to_string(), "!(*)");
    }

    #[test]
    fn quotes_non_bare_names() {
        assert_eq!(NameExpr::name("elem_a").to_string(), "elem_a");
        assert_eq!(NameExpr::name("elem_a b").to_string(), "\"elem_a b\"");
    }

    #[test]
    fn grammar_lists_main_first() {
        let mut refs = BTreeMap::new();
        refs.insert("a".to_string(), Pattern::Empty);
        refs.insert(MAIN.to_string(), Pattern::reference("a"));
        refs.insert("ws".to_string(), Pattern::value(BoolExpr::Whitespace(StrExpr::Var)));
        let g = Grammar::new(refs);
        assert_eq!(
            g.to_string(),
            "#main = @a\n#a = <empty>\n#ws = ->whitespace($string)\n"
        );
    }

    #[test]
    fn formatting_is_deterministic() {
        let build = || {
            let mut refs = BTreeMap::new();
            refs.insert("b".to_string(), Pattern::ZAny);
            refs.insert("a".to_string(), Pattern::Empty);
            refs.insert(MAIN.to_string(), Pattern::reference("b"));
            Grammar::new(refs)
        };
        assert_eq!(build().to_string(), build().to_string());
    }
}

//! Builders for the value-predicate leaves of the target algebra, and the
//! collapse of `<list>` subtrees into anchored regular expressions.

use crate::TranslateError;
use relapse_syntax::{BoolExpr, Pattern, StrExpr};
use relaxng_simplified::NameOrPattern;

/// Matches a text token that is entirely whitespace.
pub(crate) fn new_whitespace() -> Pattern {
    Pattern::value(BoolExpr::Whitespace(StrExpr::Var))
}

/// Matches any text token, regardless of content.
pub(crate) fn new_any_value() -> Pattern {
    Pattern::value(BoolExpr::AnyText(StrExpr::Var))
}

/// Matches a text token equal to `literal`, character for character.
pub(crate) fn new_text_value(literal: &str) -> Pattern {
    Pattern::value(BoolExpr::Text(StrExpr::Var, StrExpr::constant(literal)))
}

/// Matches a text token equal to `literal` after whitespace collapsing.
pub(crate) fn new_token_value(literal: &str) -> Pattern {
    Pattern::value(BoolExpr::Token(StrExpr::Var, StrExpr::constant(literal)))
}

fn new_list_value(regex: String) -> Pattern {
    Pattern::value(BoolExpr::List(StrExpr::Var, StrExpr::Const(regex)))
}

/// Normalization applied to `<value>` literals in token mode: newline,
/// carriage-return and tab characters are removed and outer whitespace
/// trimmed before the literal is compared token-wise at match time.
pub(crate) fn normalize_token_literal(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect();
    stripped.trim().to_string()
}

/// Result of collapsing one node of a `<list>` subtree.
#[derive(Debug)]
pub(crate) enum ListOutcome {
    Regex { regex: String, nullable: bool },
    /// The subtree cannot be expressed over whitespace-separated tokens
    /// (e.g. a literal containing a space); the enclosing list matches
    /// nothing, but translation of the grammar continues.
    Unmatchable,
}

/// Wraps a `<list>` body into a pattern: an anchored regex value leaf, made
/// optional when the token sequence may be empty, or the empty set when the
/// list is unmatchable.
pub(crate) fn new_list(p: &NameOrPattern) -> Result<Pattern, TranslateError> {
    Ok(match list_to_regex(p)? {
        ListOutcome::Unmatchable => Pattern::empty_set(),
        ListOutcome::Regex { regex, nullable } => {
            let val = new_list_value(format!("^{}$", regex));
            if nullable {
                Pattern::or(val, Pattern::Empty)
            } else {
                val
            }
        }
    })
}

pub(crate) fn list_to_regex(p: &NameOrPattern) -> Result<ListOutcome, TranslateError> {
    match p {
        NameOrPattern::Empty => Ok(ListOutcome::Regex {
            regex: String::new(),
            nullable: true,
        }),
        NameOrPattern::Data(data) if data.except.is_none() => Ok(ListOutcome::Regex {
            regex: r"(\S)*".to_string(),
            nullable: false,
        }),
        NameOrPattern::Value(value) => {
            if !value.ns.is_empty() {
                return Err(TranslateError::ListValueNsNotSupported {
                    ns: value.ns.clone(),
                });
            }
            if value.text.contains(' ') {
                // a literal with an embedded space can never equal a single
                // whitespace-separated token
                return Ok(ListOutcome::Unmatchable);
            }
            Ok(ListOutcome::Regex {
                nullable: value.text.is_empty(),
                regex: value.text.clone(),
            })
        }
        NameOrPattern::OneOrMore(inner) => Ok(match list_to_regex(inner)? {
            ListOutcome::Unmatchable => ListOutcome::Unmatchable,
            ListOutcome::Regex { regex, nullable } => ListOutcome::Regex {
                regex: format!(r"(\s)?{}(\s{})*", regex, regex),
                nullable,
            },
        }),
        NameOrPattern::Choice(pair) => {
            let left = list_to_regex(&pair.left)?;
            let right = list_to_regex(&pair.right)?;
            Ok(match (left, right) {
                (ListOutcome::Unmatchable, right) => right,
                (left, ListOutcome::Unmatchable) => left,
                (
                    ListOutcome::Regex {
                        regex: l,
                        nullable: nl,
                    },
                    ListOutcome::Regex {
                        regex: r,
                        nullable: nr,
                    },
                ) => ListOutcome::Regex {
                    regex: format!("({}|{})", l, r),
                    nullable: nl || nr,
                },
            })
        }
        NameOrPattern::Group(pair) => {
            let left = list_to_regex(&pair.left)?;
            let right = list_to_regex(&pair.right)?;
            Ok(match (left, right) {
                (
                    ListOutcome::Regex {
                        regex: l,
                        nullable: nl,
                    },
                    ListOutcome::Regex {
                        regex: r,
                        nullable: nr,
                    },
                ) => ListOutcome::Regex {
                    regex: format!(r"{}\s{}", l, r),
                    nullable: nl && nr,
                },
                _ => ListOutcome::Unmatchable,
            })
        }
        other => Err(TranslateError::UnsupportedListPattern {
            found: other.variant_name(),
        }),
    }
}

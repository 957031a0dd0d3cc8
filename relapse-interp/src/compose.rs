//! Compilation and evaluation of the value-predicate expressions attached to
//! `Pattern::Value` leaves.
//!
//! Every regular expression appearing in a grammar is compiled once when the
//! grammar is loaded; a malformed regex is therefore reported before any
//! document is examined.

use crate::parse::TEXT_PREFIX;
use crate::InterpError;
use regex::Regex;
use relapse_syntax::{BoolExpr, Grammar, Pattern, StrExpr};
use std::collections::HashMap;

/// Pre-compiled regex table for one grammar's predicates.
#[derive(Default)]
pub(crate) struct ValueEval {
    regexes: HashMap<String, Regex>,
}

impl ValueEval {
    pub fn compile(grammar: &Grammar) -> Result<ValueEval, InterpError> {
        let mut eval = ValueEval::default();
        for (_, pattern) in grammar.iter() {
            eval.collect_pattern(pattern)?;
        }
        Ok(eval)
    }

    fn collect_pattern(&mut self, pattern: &Pattern) -> Result<(), InterpError> {
        match pattern {
            Pattern::Empty | Pattern::ZAny | Pattern::Reference(_) => Ok(()),
            Pattern::Not(p)
            | Pattern::ZeroOrMore(p)
            | Pattern::Optional(p)
            | Pattern::TreeNode(_, p) => self.collect_pattern(p),
            Pattern::Concat(a, b)
            | Pattern::Or(a, b)
            | Pattern::And(a, b)
            | Pattern::Interleave(a, b) => {
                self.collect_pattern(a)?;
                self.collect_pattern(b)
            }
            Pattern::Value(expr) => self.collect_expr(expr),
        }
    }

    fn collect_expr(&mut self, expr: &BoolExpr) -> Result<(), InterpError> {
        match expr {
            BoolExpr::And(a, b) | BoolExpr::Or(a, b) => {
                self.collect_expr(a)?;
                self.collect_expr(b)
            }
            BoolExpr::Not(e) => self.collect_expr(e),
            BoolExpr::Regex(pattern, _) | BoolExpr::List(_, pattern) => self.add_regex(pattern),
            BoolExpr::StringEq(..)
            | BoolExpr::TypeString(_)
            | BoolExpr::Token(..)
            | BoolExpr::Whitespace(_)
            | BoolExpr::AnyText(_)
            | BoolExpr::Text(..) => Ok(()),
        }
    }

    fn add_regex(&mut self, pattern: &StrExpr) -> Result<(), InterpError> {
        let pattern = match pattern {
            StrExpr::Const(p) => p,
            StrExpr::Var => return Err(InterpError::NonConstantRegex),
        };
        if !self.regexes.contains_key(pattern) {
            let compiled = Regex::new(pattern).map_err(|error| InterpError::BadRegex {
                pattern: pattern.clone(),
                error,
            })?;
            self.regexes.insert(pattern.clone(), compiled);
        }
        Ok(())
    }

    /// Evaluates a predicate against a node label.
    pub fn eval(&self, expr: &BoolExpr, label: &str) -> bool {
        match expr {
            BoolExpr::StringEq(a, b) => eval_str(a, label) == eval_str(b, label),
            BoolExpr::And(a, b) => self.eval(a, label) && self.eval(b, label),
            BoolExpr::Or(a, b) => self.eval(a, label) || self.eval(b, label),
            BoolExpr::Not(e) => !self.eval(e, label),
            BoolExpr::Regex(pattern, subject) => self
                .regex(pattern)
                .map(|re| re.is_match(eval_str(subject, label)))
                .unwrap_or(false),
            BoolExpr::TypeString(s) => strip_text_prefix(eval_str(s, label)).is_some(),
            BoolExpr::Token(s, c) => strip_text_prefix(eval_str(s, label))
                .map(|content| tokenize(content).join(" ") == eval_str(c, label))
                .unwrap_or(false),
            BoolExpr::Whitespace(s) => strip_text_prefix(eval_str(s, label))
                .map(|content| content.trim().is_empty())
                .unwrap_or(false),
            BoolExpr::AnyText(s) => strip_text_prefix(eval_str(s, label)).is_some(),
            BoolExpr::Text(s, c) => strip_text_prefix(eval_str(s, label))
                .map(|content| content == eval_str(c, label))
                .unwrap_or(false),
            BoolExpr::List(s, pattern) => strip_text_prefix(eval_str(s, label))
                .and_then(|content| {
                    self.regex(pattern)
                        .map(|re| re.is_match(&tokenize(content).join(" ")))
                })
                .unwrap_or(false),
        }
    }

    fn regex(&self, pattern: &StrExpr) -> Option<&Regex> {
        match pattern {
            StrExpr::Const(p) => self.regexes.get(p),
            StrExpr::Var => None,
        }
    }
}

fn eval_str<'a>(e: &'a StrExpr, label: &'a str) -> &'a str {
    match e {
        StrExpr::Var => label,
        StrExpr::Const(s) => s,
    }
}

/// Text content carries the `text_` marker; a label without it is not text,
/// and every text predicate fails on it (without error).
fn strip_text_prefix(label: &str) -> Option<&str> {
    label.strip_prefix(TEXT_PREFIX)
}

/// Splits on space, LF, CR and tab, trims each piece and drops empties.
pub fn tokenize(s: &str) -> Vec<&str> {
    s.split(|c: char| matches!(c, ' ' | '\n' | '\r' | '\t'))
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

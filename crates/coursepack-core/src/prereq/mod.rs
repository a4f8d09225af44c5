/// The AICC prerequisite expression engine.
///
/// AICC `.pre` files (and SCORM 1.2 `adlcp:prerequisites` elements) carry
/// boolean expressions over AU/block identifiers in the CMI001 script
/// dialect. The engine is three small, independent pieces:
///
/// - [`lexer`] — an immutable, restartable, single-pass tokenizer;
/// - [`parser`] — recursive descent over the grammar below, producing a
///   [`PrereqExpr`] AST;
/// - [`evaluate`] / [`render`] — a pure depth-first fold over the AST and
///   its inverse-direction pretty-printer.
///
/// Grammar (the CMI guidelines do not pin operator precedence; this
/// implementation binds `~` tightest, then `&`/`*`, then `|`/`,`,
/// left-associative at each binary level):
///
/// ```text
/// expr    := or
/// or      := and ( ('|' | ',') and )*
/// and     := unary ( ('&' | '*') unary )*
/// unary   := '~' unary | primary
/// primary := IDENT | '(' expr ')'
/// ```
///
/// Unknown identifiers are *not* a parse error; they resolve against the
/// AU table during validation.
pub mod lexer;
pub mod parser;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use parser::{parse, PrereqParseError};

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// A parsed prerequisite expression.
///
/// N-ary `And`/`Or` nodes flatten chains of the same operator, so
/// `A & B & C` is one `And` with three children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrereqExpr {
    /// An AU or block identifier.
    Identifier(String),
    /// Conjunction of all children.
    And(Vec<PrereqExpr>),
    /// Disjunction of all children.
    Or(Vec<PrereqExpr>),
    /// Negation.
    Not(Box<PrereqExpr>),
}

impl PrereqExpr {
    /// Every identifier mentioned in the expression, in first-occurrence
    /// order, deduplicated.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Identifier(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_identifiers(out);
                }
            }
            Self::Not(child) => child.collect_identifiers(out),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluates `expr` under `env`.
///
/// A depth-first fold; identifiers absent from `env` evaluate to `false`
/// (an unsatisfied AU). Identifier lookup is case-insensitive, matching
/// AICC identifier semantics.
pub fn evaluate(expr: &PrereqExpr, env: &BTreeMap<String, bool>) -> bool {
    // Normalize once per call; expressions are tiny.
    let lowered: BTreeMap<String, bool> = env
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), *v))
        .collect();
    evaluate_inner(expr, &lowered)
}

fn evaluate_inner(expr: &PrereqExpr, env: &BTreeMap<String, bool>) -> bool {
    match expr {
        PrereqExpr::Identifier(name) => {
            env.get(&name.to_ascii_lowercase()).copied().unwrap_or(false)
        }
        PrereqExpr::And(children) => children.iter().all(|c| evaluate_inner(c, env)),
        PrereqExpr::Or(children) => children.iter().any(|c| evaluate_inner(c, env)),
        PrereqExpr::Not(child) => !evaluate_inner(child, env),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Renders an AST back to expression text.
///
/// Parenthesizes only where precedence demands, so `render(parse(e))`
/// re-parses to the same AST (round-trip modulo redundant parentheses).
pub fn render(expr: &PrereqExpr) -> String {
    render_prec(expr, Prec::Or)
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Or,
    And,
    Unary,
}

fn render_prec(expr: &PrereqExpr, outer: Prec) -> String {
    match expr {
        PrereqExpr::Identifier(name) => name.clone(),
        PrereqExpr::Not(child) => format!("~{}", render_prec(child, Prec::Unary)),
        PrereqExpr::And(children) => {
            let body = children
                .iter()
                .map(|c| render_prec(c, Prec::And))
                .collect::<Vec<_>>()
                .join(" & ");
            if outer > Prec::And {
                format!("({body})")
            } else {
                body
            }
        }
        PrereqExpr::Or(children) => {
            let body = children
                .iter()
                .map(|c| render_prec(c, Prec::Or))
                .collect::<Vec<_>>()
                .join(" | ");
            if outer > Prec::Or {
                format!("({body})")
            } else {
                body
            }
        }
    }
}

impl fmt::Display for PrereqExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn env(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), *v))
            .collect()
    }

    #[test]
    fn evaluates_mixed_expression() {
        let expr = parse("A & (B | ~C)").expect("parses");
        assert_eq!(
            expr,
            PrereqExpr::And(vec![
                PrereqExpr::Identifier("A".to_owned()),
                PrereqExpr::Or(vec![
                    PrereqExpr::Identifier("B".to_owned()),
                    PrereqExpr::Not(Box::new(PrereqExpr::Identifier("C".to_owned()))),
                ]),
            ])
        );
        assert!(evaluate(&expr, &env(&[("A", true), ("B", false), ("C", false)])));
        assert!(!evaluate(&expr, &env(&[("A", false), ("B", true), ("C", false)])));
    }

    #[test]
    fn unknown_identifiers_evaluate_false() {
        let expr = parse("ghost").expect("parses");
        assert!(!evaluate(&expr, &env(&[])));
        assert!(evaluate(
            &PrereqExpr::Not(Box::new(expr)),
            &env(&[])
        ));
    }

    #[test]
    fn identifier_lookup_is_case_insensitive() {
        let expr = parse("lesson1").expect("parses");
        assert!(evaluate(&expr, &env(&[("LESSON1", true)])));
    }

    #[test]
    fn identifiers_deduplicated_in_order() {
        let expr = parse("A & B | A & C").expect("parses");
        assert_eq!(expr.identifiers(), vec!["A", "B", "C"]);
    }

    #[test]
    fn render_round_trips() {
        for source in [
            "A",
            "~A",
            "A & B & C",
            "A | B | C",
            "A & (B | ~C)",
            "~(A & B) | C",
            "(A | B) & (C | D)",
            "~~A",
        ] {
            let expr = parse(source).expect("parses");
            let rendered = render(&expr);
            let reparsed = parse(&rendered).expect("re-parses");
            assert_eq!(reparsed, expr, "render of {source:?} was {rendered:?}");
        }
    }

    #[test]
    fn render_minimizes_parentheses() {
        let expr = parse("(A & B) | C").expect("parses");
        assert_eq!(render(&expr), "A & B | C");
        let expr = parse("A & (B | C)").expect("parses");
        assert_eq!(render(&expr), "A & (B | C)");
    }
}

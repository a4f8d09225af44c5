/// Recursive-descent parser for prerequisite expressions.
///
/// Consumes the token stream from [`super::lexer`] and produces a
/// [`PrereqExpr`]. Chains of the same binary operator flatten into one
/// n-ary node, which keeps ASTs canonical regardless of how the source
/// was parenthesized.
use std::fmt;

use super::lexer::{LexError, Lexer, Token, TokenKind};
use super::PrereqExpr;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Parse failure over a prerequisite expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrereqParseError {
    /// The tokenizer rejected the source.
    Lex(LexError),
    /// A token appeared where the grammar does not allow it.
    UnexpectedToken {
        /// The token's text.
        text: String,
        /// Its byte offset.
        offset: usize,
    },
    /// The source ended mid-expression.
    UnexpectedEnd,
    /// A `(` was never closed.
    UnbalancedParen {
        /// Byte offset of the opening parenthesis.
        offset: usize,
    },
    /// The expression is empty (whitespace only).
    Empty,
}

impl fmt::Display for PrereqParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::UnexpectedToken { text, offset } => {
                write!(f, "unexpected token {text:?} at byte {offset}")
            }
            Self::UnexpectedEnd => f.write_str("expression ended unexpectedly"),
            Self::UnbalancedParen { offset } => {
                write!(f, "unclosed parenthesis opened at byte {offset}")
            }
            Self::Empty => f.write_str("empty expression"),
        }
    }
}

impl std::error::Error for PrereqParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lex(e) => Some(e),
            Self::UnexpectedToken { .. }
            | Self::UnexpectedEnd
            | Self::UnbalancedParen { .. }
            | Self::Empty => None,
        }
    }
}

impl From<LexError> for PrereqParseError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parses a prerequisite expression into its AST.
pub fn parse(source: &str) -> Result<PrereqExpr, PrereqParseError> {
    let tokens = Lexer::tokenize(source)?;
    if tokens.is_empty() {
        return Err(PrereqParseError::Empty);
    }
    let mut parser = Parser { tokens, index: 0 };
    let expr = parser.or_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(PrereqParseError::UnexpectedToken {
            text: extra.text.to_owned(),
            offset: extra.offset,
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.index)
    }

    fn bump(&mut self) -> Option<&Token<'a>> {
        let index = self.index;
        if index < self.tokens.len() {
            self.index += 1;
            Some(&self.tokens[index])
        } else {
            None
        }
    }

    /// `or := and ( ('|' | ',') and )*`
    fn or_expr(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        let first = self.and_expr()?;
        let mut children = vec![first];
        while self.eat_operator(&["|", ","]) {
            children.push(self.and_expr()?);
        }
        Ok(flatten(children, Combinator::Or))
    }

    /// `and := unary ( ('&' | '*') unary )*`
    fn and_expr(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        let first = self.unary_expr()?;
        let mut children = vec![first];
        while self.eat_operator(&["&", "*"]) {
            children.push(self.unary_expr()?);
        }
        Ok(flatten(children, Combinator::And))
    }

    /// `unary := '~' unary | primary`
    fn unary_expr(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        if self.eat_operator(&["~"]) {
            let inner = self.unary_expr()?;
            return Ok(PrereqExpr::Not(Box::new(inner)));
        }
        self.primary()
    }

    /// `primary := IDENT | '(' expr ')'`
    fn primary(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        let Some(token) = self.bump() else {
            return Err(PrereqParseError::UnexpectedEnd);
        };
        match token.kind {
            TokenKind::Identifier => Ok(PrereqExpr::Identifier(token.text.to_owned())),
            TokenKind::LeftParen => {
                let open_offset = token.offset;
                let inner = self.or_expr()?;
                match self.bump() {
                    Some(close) if close.kind == TokenKind::RightParen => Ok(inner),
                    Some(other) => Err(PrereqParseError::UnexpectedToken {
                        text: other.text.to_owned(),
                        offset: other.offset,
                    }),
                    None => Err(PrereqParseError::UnbalancedParen {
                        offset: open_offset,
                    }),
                }
            }
            TokenKind::Operator | TokenKind::RightParen => {
                Err(PrereqParseError::UnexpectedToken {
                    text: token.text.to_owned(),
                    offset: token.offset,
                })
            }
        }
    }

    /// Consumes the next token when it is an operator with one of the
    /// given spellings.
    fn eat_operator(&mut self, spellings: &[&str]) -> bool {
        let matched = matches!(
            self.peek(),
            Some(token) if token.kind == TokenKind::Operator && spellings.contains(&token.text)
        );
        if matched {
            self.index += 1;
        }
        matched
    }
}

enum Combinator {
    And,
    Or,
}

/// Wraps children in an n-ary node, flattening same-operator nesting and
/// collapsing the single-child case.
fn flatten(mut children: Vec<PrereqExpr>, combinator: Combinator) -> PrereqExpr {
    if children.len() == 1 {
        return children.remove(0);
    }
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match (&combinator, child) {
            (Combinator::And, PrereqExpr::And(grandchildren)) => flat.extend(grandchildren),
            (Combinator::Or, PrereqExpr::Or(grandchildren)) => flat.extend(grandchildren),
            (_, other) => flat.push(other),
        }
    }
    match combinator {
        Combinator::And => PrereqExpr::And(flat),
        Combinator::Or => PrereqExpr::Or(flat),
    }
}

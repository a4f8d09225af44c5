/// Tokenizer for the AICC prerequisite script dialect.
///
/// The lexer is an immutable, restartable, single-pass producer: it
/// borrows the source text, hands out [`Token`] values with byte spans,
/// and can be re-created cheaply to restart. Whitespace is skipped;
/// any character outside the vocabulary is a [`LexError::Unexpected`]
/// carrying its byte offset.
use std::fmt;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// The token vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An AU/block identifier (letters, digits, `.`, `_`, `-`).
    Identifier,
    /// A binary or unary operator (`&`, `*`, `|`, `,`, `~`, `=`, `<>`).
    Operator,
    /// `(`.
    LeftParen,
    /// `)`.
    RightParen,
}

/// One lexed token.
///
/// `optional` and `unary` are dialect flags: the CMI001 script dialect
/// marks an element optional with a leading `*` count form, and `~` is
/// the only unary operator. Both flags ride on the token so parsers for
/// stricter dialects can reject what this crate's parser accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Which vocabulary entry this is.
    pub kind: TokenKind,
    /// The source slice.
    pub text: &'a str,
    /// Byte offset of `text` in the source.
    pub offset: usize,
    /// Dialect flag: the element is optional.
    pub optional: bool,
    /// Dialect flag: the operator is unary (`~`).
    pub unary: bool,
}

impl Token<'_> {
    fn new(kind: TokenKind, text: &str, offset: usize) -> Token<'_> {
        Token {
            kind,
            text,
            offset,
            optional: false,
            unary: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Lexing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character outside the vocabulary.
    Unexpected {
        /// The offending character.
        character: char,
        /// Its byte offset in the source.
        offset: usize,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unexpected { character, offset } => {
                write!(f, "unexpected character {character:?} at byte {offset}")
            }
        }
    }
}

impl std::error::Error for LexError {}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// A restartable tokenizer over one source string.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Lexes the whole source into a token vector.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Produces the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, LexError> {
        let rest = &self.source[self.position..];
        let skipped = rest.len() - rest.trim_start().len();
        self.position += skipped;

        let offset = self.position;
        let mut chars = self.source[offset..].chars();
        let Some(ch) = chars.next() else {
            return Ok(None);
        };

        let token = match ch {
            '(' => {
                self.position += 1;
                Token::new(TokenKind::LeftParen, &self.source[offset..offset + 1], offset)
            }
            ')' => {
                self.position += 1;
                Token::new(TokenKind::RightParen, &self.source[offset..offset + 1], offset)
            }
            '&' | '*' | '|' | ',' | '=' => {
                self.position += 1;
                Token::new(TokenKind::Operator, &self.source[offset..offset + 1], offset)
            }
            '~' => {
                self.position += 1;
                let mut token =
                    Token::new(TokenKind::Operator, &self.source[offset..offset + 1], offset);
                token.unary = true;
                token
            }
            '<' if chars.next() == Some('>') => {
                self.position += 2;
                Token::new(TokenKind::Operator, &self.source[offset..offset + 2], offset)
            }
            c if is_identifier_char(c) => {
                let end = self.source[offset..]
                    .char_indices()
                    .find(|(_, c)| !is_identifier_char(*c))
                    .map_or(self.source.len(), |(i, _)| offset + i);
                self.position = end;
                Token::new(TokenKind::Identifier, &self.source[offset..end], offset)
            }
            other => {
                return Err(LexError::Unexpected {
                    character: other,
                    offset,
                });
            }
        };
        Ok(Some(token))
    }
}

/// Identifier characters: ASCII alphanumerics plus `.`, `_`, `-`.
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn tokenizes_mixed_expression() {
        let tokens = Lexer::tokenize("A1 & (B.2 | ~C_3)").expect("lexes");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::RightParen,
            ]
        );
        assert_eq!(tokens[0].text, "A1");
        assert_eq!(tokens[3].text, "B.2");
        assert!(tokens[5].unary);
        assert!(!tokens[1].unary);
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = Lexer::tokenize("  AB | C").expect("lexes");
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[1].offset, 5);
        assert_eq!(tokens[2].offset, 7);
    }

    #[test]
    fn unexpected_character_reports_offset() {
        let err = Lexer::tokenize("A ! B").expect_err("must fail");
        assert_eq!(
            err,
            LexError::Unexpected {
                character: '!',
                offset: 2
            }
        );
    }

    #[test]
    fn lexer_is_restartable() {
        let source = "A & B";
        let first = Lexer::tokenize(source).expect("lexes");
        let second = Lexer::tokenize(source).expect("lexes");
        assert_eq!(first, second);
    }

    #[test]
    fn comparison_dialect_tokens_lex() {
        let tokens = Lexer::tokenize("score=1 & grade<>2").expect("lexes");
        assert_eq!(tokens[1].text, "=");
        assert_eq!(tokens[5].text, "<>");
    }
}

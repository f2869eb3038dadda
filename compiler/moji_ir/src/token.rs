//! Tokens and the token-stream interface.
//!
//! Lexing is not this compiler's job: an external lexer produces
//! `Token`s (interning names and literals into the shared [`StringPool`])
//! and the parser consumes them through [`TokenStream`]'s `peek`/`consume`
//! interface.

use std::fmt;

use crate::{Glyph, Name, SourcePosition, TokenRange};

/// Kind and payload of a token.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum TokenKind {
    /// A single emoji glyph.
    Identifier(Glyph),
    /// A free (non-emoji) identifier.
    Variable(Name),
    Integer(i64),
    Double(f64),
    String(Name),
    Symbol(char),
    DocComment(Name),
}

impl TokenKind {
    /// The class of this token, for `consume(class)` checks.
    pub fn class(&self) -> TokenClass {
        match self {
            TokenKind::Identifier(_) => TokenClass::Identifier,
            TokenKind::Variable(_) => TokenClass::Variable,
            TokenKind::Integer(_) => TokenClass::Integer,
            TokenKind::Double(_) => TokenClass::Double,
            TokenKind::String(_) => TokenClass::String,
            TokenKind::Symbol(_) => TokenClass::Symbol,
            TokenKind::DocComment(_) => TokenClass::DocComment,
        }
    }
}

/// Token class without payload.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenClass {
    Identifier,
    Variable,
    Integer,
    Double,
    String,
    Symbol,
    DocComment,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenClass::Identifier => "identifier",
            TokenClass::Variable => "variable",
            TokenClass::Integer => "integer literal",
            TokenClass::Double => "double literal",
            TokenClass::String => "string literal",
            TokenClass::Symbol => "symbol literal",
            TokenClass::DocComment => "documentation comment",
        };
        f.write_str(text)
    }
}

/// One token with its source position.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub position: SourcePosition,
}

impl Token {
    pub const fn new(kind: TokenKind, position: SourcePosition) -> Self {
        Token { kind, position }
    }

    /// The glyph of an identifier token, if it is one.
    pub fn glyph(&self) -> Option<Glyph> {
        match self.kind {
            TokenKind::Identifier(glyph) => Some(glyph),
            _ => None,
        }
    }
}

/// Failure of a `consume` call.
#[derive(Clone, PartialEq, Debug)]
pub enum TokenStreamError {
    /// The stream ended where a token was required.
    UnexpectedEnd {
        expected: TokenClass,
        position: SourcePosition,
    },
    /// The next token had the wrong class.
    ClassMismatch { expected: TokenClass, found: Token },
    /// The next token was an identifier, but not the requested glyph.
    GlyphMismatch { expected: Glyph, found: Token },
}

impl TokenStreamError {
    /// Position the failure should be reported at.
    pub fn position(&self) -> SourcePosition {
        match self {
            TokenStreamError::UnexpectedEnd { position, .. } => *position,
            TokenStreamError::ClassMismatch { found, .. }
            | TokenStreamError::GlyphMismatch { found, .. } => found.position,
        }
    }
}

/// Cursor over a lexed token sequence.
///
/// This is the whole interface the compiler has to the lexer's output:
/// one-token lookahead plus class- and glyph-checked consumption.
#[derive(Clone, Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream { tokens, pos: 0 }
    }

    /// Current index into the token sequence.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether any tokens remain.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// Look at the next token without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Check whether the next token is the given identifier glyph.
    pub fn peek_is(&self, glyph: Glyph) -> bool {
        matches!(self.peek(), Some(token) if token.glyph() == Some(glyph))
    }

    /// Check whether the next token exists and is anything but `glyph`.
    pub fn peek_is_everything_but(&self, glyph: Glyph) -> bool {
        matches!(self.peek(), Some(token) if token.glyph() != Some(glyph))
    }

    /// Position of the next token, or of the end of the stream.
    pub fn peek_position(&self) -> SourcePosition {
        match self.peek() {
            Some(token) => token.position,
            None => self
                .tokens
                .last()
                .map(|token| token.position)
                .unwrap_or(SourcePosition::generated()),
        }
    }

    /// Consume the next token unconditionally.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume a token of the given class.
    pub fn consume(&mut self, class: TokenClass) -> Result<Token, TokenStreamError> {
        match self.peek() {
            Some(&token) if token.kind.class() == class => {
                self.pos += 1;
                Ok(token)
            }
            Some(&token) => Err(TokenStreamError::ClassMismatch {
                expected: class,
                found: token,
            }),
            None => Err(TokenStreamError::UnexpectedEnd {
                expected: class,
                position: self.peek_position(),
            }),
        }
    }

    /// Consume a specific identifier glyph.
    pub fn consume_identifier(&mut self, glyph: Glyph) -> Result<Token, TokenStreamError> {
        match self.peek() {
            Some(&token) if token.glyph() == Some(glyph) => {
                self.pos += 1;
                Ok(token)
            }
            Some(&token) => Err(TokenStreamError::GlyphMismatch {
                expected: glyph,
                found: token,
            }),
            None => Err(TokenStreamError::UnexpectedEnd {
                expected: TokenClass::Identifier,
                position: self.peek_position(),
            }),
        }
    }

    /// Consume an identifier that must be one of the given glyphs.
    pub fn consume_any_of(&mut self, choices: &[Glyph]) -> Result<Token, TokenStreamError> {
        let token = self.consume(TokenClass::Identifier)?;
        match token.glyph() {
            Some(glyph) if choices.contains(&glyph) => Ok(token),
            _ => Err(TokenStreamError::GlyphMismatch {
                expected: choices.first().copied().unwrap_or(Glyph(' ')),
                found: token,
            }),
        }
    }

    /// A new stream over a sub-range of this stream's tokens.
    ///
    /// Used to parse function bodies that were recorded as token ranges
    /// during declaration parsing.
    pub fn subrange(&self, range: TokenRange) -> TokenStream {
        TokenStream::new(self.tokens[range.start..range.end].to_vec())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::glyphs;
    use pretty_assertions::assert_eq;

    fn ident(glyph: Glyph) -> Token {
        Token::new(TokenKind::Identifier(glyph), SourcePosition::generated())
    }

    #[test]
    fn test_peek_does_not_consume() {
        let stream = TokenStream::new(vec![ident(glyphs::CLASS)]);
        assert!(stream.peek_is(glyphs::CLASS));
        assert!(stream.peek_is(glyphs::CLASS));
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_consume_checks_glyph() {
        let mut stream = TokenStream::new(vec![ident(glyphs::CLASS)]);
        let err = stream.consume_identifier(glyphs::ENUM).unwrap_err();
        assert!(matches!(err, TokenStreamError::GlyphMismatch { .. }));
        assert!(stream.consume_identifier(glyphs::CLASS).is_ok());
        assert!(!stream.has_more());
    }

    #[test]
    fn test_consume_any_of() {
        let mut stream = TokenStream::new(vec![ident(glyphs::PRIVATE)]);
        let token = stream
            .consume_any_of(&[glyphs::PRIVATE, glyphs::PROTECTED])
            .unwrap();
        assert_eq!(token.glyph(), Some(glyphs::PRIVATE));
    }
}

//! Test support: hand-assembled token streams.
//!
//! Lexing is external to the compiler, so tests build token streams
//! directly, one token per call, with positions advancing column-wise.

use moji_ir::{Glyph, Name, SourcePosition, StringPool, Token, TokenKind, TokenStream};

/// Builds a token stream against a shared string pool.
pub struct TokenBuilder<'a> {
    pool: &'a StringPool,
    tokens: Vec<Token>,
    file: Name,
    line: u32,
    column: u32,
}

impl<'a> TokenBuilder<'a> {
    pub fn new(pool: &'a StringPool, file: &str) -> Self {
        TokenBuilder {
            pool,
            tokens: Vec::new(),
            file: pool.pool(file),
            line: 1,
            column: 1,
        }
    }

    fn push(&mut self, kind: TokenKind) -> &mut Self {
        let position = SourcePosition::new(self.line, self.column, self.file);
        self.tokens.push(Token::new(kind, position));
        self.column += 2;
        self
    }

    /// An identifier glyph.
    pub fn g(&mut self, glyph: char) -> &mut Self {
        self.push(TokenKind::Identifier(Glyph(glyph)))
    }

    /// A free identifier.
    pub fn v(&mut self, name: &str) -> &mut Self {
        let name = self.pool.pool(name);
        self.push(TokenKind::Variable(name))
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        self.push(TokenKind::Integer(value))
    }

    #[allow(dead_code)]
    pub fn dbl(&mut self, value: f64) -> &mut Self {
        self.push(TokenKind::Double(value))
    }

    #[allow(dead_code)]
    pub fn string(&mut self, value: &str) -> &mut Self {
        let value = self.pool.pool(value);
        self.push(TokenKind::String(value))
    }

    #[allow(dead_code)]
    pub fn doc(&mut self, text: &str) -> &mut Self {
        let text = self.pool.pool(text);
        self.push(TokenKind::DocComment(text))
    }

    /// Start the following tokens on a fresh line.
    pub fn nl(&mut self) -> &mut Self {
        self.line += 1;
        self.column = 1;
        self
    }

    pub fn build(&mut self) -> TokenStream {
        TokenStream::new(std::mem::take(&mut self.tokens))
    }
}

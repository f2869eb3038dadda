//! Declaration attributes.
//!
//! Attributes appear in a fixed order before a declaration or member.
//! Each attribute rejects duplication, and positions that do not accept
//! an attribute reject it with "disallowed here".

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{glyphs, Glyph, SourcePosition, TokenStream};
use moji_types::AccessLevel;

use crate::token_error;

/// One optional attribute glyph.
#[derive(Clone, Debug)]
pub struct Attribute {
    glyph: Glyph,
    position: Option<SourcePosition>,
}

impl Attribute {
    /// Consume the attribute if present. A second occurrence is a
    /// duplicate-attribute error.
    pub fn parse(stream: &mut TokenStream, glyph: Glyph) -> Result<Attribute, CompilerError> {
        let mut position = None;
        if stream.peek_is(glyph) {
            let token = stream.consume_identifier(glyph).map_err(token_error)?;
            position = Some(token.position);
            if stream.peek_is(glyph) {
                return Err(CompilerError::new(
                    ErrorCode::E1002,
                    stream.peek_position(),
                    format!("Duplicate attribute {glyph}."),
                ));
            }
        }
        Ok(Attribute { glyph, position })
    }

    pub fn is_set(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<SourcePosition> {
        self.position
    }

    /// Reject the attribute at this position.
    pub fn disallow(&self) -> Result<(), CompilerError> {
        match self.position {
            Some(position) => Err(CompilerError::new(
                ErrorCode::E1003,
                position,
                format!("{} is disallowed here.", self.glyph),
            )),
            None => Ok(()),
        }
    }
}

/// Read an access level. Defaults to 🔓.
pub fn parse_access_level(stream: &mut TokenStream) -> Result<AccessLevel, CompilerError> {
    if stream.peek_is(glyphs::PROTECTED) {
        stream.consume_identifier(glyphs::PROTECTED).map_err(token_error)?;
        Ok(AccessLevel::Protected)
    } else if stream.peek_is(glyphs::PRIVATE) {
        stream.consume_identifier(glyphs::PRIVATE).map_err(token_error)?;
        Ok(AccessLevel::Private)
    } else if stream.peek_is(glyphs::PUBLIC) {
        stream.consume_identifier(glyphs::PUBLIC).map_err(token_error)?;
        Ok(AccessLevel::Public)
    } else {
        Ok(AccessLevel::Public)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use moji_ir::{SourcePosition, Token, TokenKind};
    use pretty_assertions::assert_eq;

    fn stream_of(glyph: Glyph, count: usize) -> TokenStream {
        TokenStream::new(
            std::iter::repeat_with(|| {
                Token::new(TokenKind::Identifier(glyph), SourcePosition::generated())
            })
            .take(count)
            .collect(),
        )
    }

    #[test]
    fn test_absent_attribute() {
        let mut stream = stream_of(glyphs::EXPORTED, 0);
        let attr = Attribute::parse(&mut stream, glyphs::EXPORTED).unwrap();
        assert!(!attr.is_set());
        assert!(attr.disallow().is_ok());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut stream = stream_of(glyphs::EXPORTED, 2);
        let err = Attribute::parse(&mut stream, glyphs::EXPORTED).unwrap_err();
        assert_eq!(err.code, ErrorCode::E1002);
    }

    #[test]
    fn test_disallowed_attribute() {
        let mut stream = stream_of(glyphs::FINAL, 1);
        let attr = Attribute::parse(&mut stream, glyphs::FINAL).unwrap();
        assert!(attr.is_set());
        let err = attr.disallow().unwrap_err();
        assert_eq!(err.code, ErrorCode::E1003);
    }
}

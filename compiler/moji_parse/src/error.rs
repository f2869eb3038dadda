//! Parse-error helpers.

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{Token, TokenKind, TokenStreamError};

/// Short description of a token for error messages.
pub fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Identifier(glyph) => glyph.to_string(),
        TokenKind::Variable(_) => "a variable".to_string(),
        TokenKind::Integer(_) => "an integer literal".to_string(),
        TokenKind::Double(_) => "a double literal".to_string(),
        TokenKind::String(_) => "a string literal".to_string(),
        TokenKind::Symbol(_) => "a symbol literal".to_string(),
        TokenKind::DocComment(_) => "a documentation comment".to_string(),
    }
}

/// Turn a stream failure into a compile error.
pub fn token_error(error: TokenStreamError) -> CompilerError {
    let position = error.position();
    let message = match &error {
        TokenStreamError::UnexpectedEnd { expected, .. } => {
            format!("Expected {expected} but the file ended.")
        }
        TokenStreamError::ClassMismatch { expected, found } => {
            format!("Expected {expected} but found {} instead.", describe_token(found))
        }
        TokenStreamError::GlyphMismatch { expected, found } => {
            format!("Expected {expected} but found {} instead.", describe_token(found))
        }
    };
    CompilerError::new(ErrorCode::E1001, position, message)
}

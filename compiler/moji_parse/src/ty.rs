//! Type-syntax parsing.
//!
//! Produces unresolved [`TypeExpr`] nodes; resolution against the
//! registry happens later, once the package's names are registered.

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{
    glyphs, Ast, Glyph, SourcePosition, TokenClass, TokenKind, TokenStream, TypeExpr, TypeExprId,
    TypeExprKind,
};

use crate::{describe_token, token_error};

/// Namespace qualifier prefix: `🔶 namespace name`.
pub const NAMESPACE_PREFIX: Glyph = Glyph('🔶');

/// A parsed `[🍬][🔶 ns] name` type name, before any generic arguments.
#[derive(Copy, Clone, Debug)]
pub struct ParsedTypeName {
    pub name: Glyph,
    pub namespace: Option<Glyph>,
    pub optional: bool,
    pub position: SourcePosition,
}

/// Read a plain type name.
pub fn parse_type_name(stream: &mut TokenStream) -> Result<ParsedTypeName, CompilerError> {
    let position = stream.peek_position();
    let mut optional = false;
    if stream.peek_is(glyphs::OPTIONAL) {
        stream
            .consume_identifier(glyphs::OPTIONAL)
            .map_err(token_error)?;
        optional = true;
    }
    let mut namespace = None;
    if stream.peek_is(NAMESPACE_PREFIX) {
        stream
            .consume_identifier(NAMESPACE_PREFIX)
            .map_err(token_error)?;
        let ns = stream.consume(TokenClass::Identifier).map_err(token_error)?;
        namespace = ns.glyph();
    }
    let name = stream.consume(TokenClass::Identifier).map_err(token_error)?;
    let Some(name) = name.glyph() else {
        return Err(CompilerError::new(
            ErrorCode::E1001,
            name.position,
            format!("Expected a type name but found {} instead.", describe_token(&name)),
        ));
    };
    Ok(ParsedTypeName {
        name,
        namespace,
        optional,
        position,
    })
}

/// Parse a full type expression into the arena.
pub fn parse_type_expr(stream: &mut TokenStream, ast: &mut Ast) -> Result<TypeExprId, CompilerError> {
    let position = stream.peek_position();
    let mut optional = false;
    if stream.peek_is(glyphs::OPTIONAL) {
        stream
            .consume_identifier(glyphs::OPTIONAL)
            .map_err(token_error)?;
        optional = true;
    }

    let Some(token) = stream.peek().copied() else {
        return Err(CompilerError::new(
            ErrorCode::E1001,
            position,
            "Expected a type but the file ended.",
        ));
    };

    let kind = match token.kind {
        TokenKind::Variable(name) => {
            stream.advance();
            TypeExprKind::GenericVariable { name }
        }
        TokenKind::Identifier(glyph) => {
            if glyph == glyphs::THIS_TYPE {
                stream.advance();
                TypeExprKind::ThisType
            } else if glyph == glyphs::INFER {
                stream.advance();
                TypeExprKind::Infer
            } else if glyph == glyphs::GRAPES {
                stream.advance();
                parse_callable_tail(stream, ast)?
            } else if glyph == glyphs::ERROR_TYPE {
                stream.advance();
                let enumeration = parse_type_expr(stream, ast)?;
                let value = parse_type_expr(stream, ast)?;
                TypeExprKind::Error { enumeration, value }
            } else if glyph == glyphs::MULTI_PROTOCOL {
                stream.advance();
                let mut protocols = Vec::new();
                while stream.peek_is_everything_but(glyphs::SERIES_END) {
                    protocols.push(parse_type_expr(stream, ast)?);
                }
                stream
                    .consume_identifier(glyphs::SERIES_END)
                    .map_err(token_error)?;
                TypeExprKind::MultiProtocol { protocols }
            } else {
                let mut namespace = None;
                let name;
                if glyph == NAMESPACE_PREFIX {
                    stream.advance();
                    let ns = stream.consume(TokenClass::Identifier).map_err(token_error)?;
                    namespace = ns.glyph();
                    let name_token = stream.consume(TokenClass::Identifier).map_err(token_error)?;
                    name = name_token.glyph().ok_or_else(|| {
                        CompilerError::new(ErrorCode::E1001, name_token.position, "Expected a type name.")
                    })?;
                } else {
                    stream.advance();
                    name = glyph;
                }
                let generic_args = parse_generic_argument_list(stream, ast)?;
                TypeExprKind::Named {
                    namespace,
                    name,
                    generic_args,
                }
            }
        }
        _ => {
            return Err(CompilerError::new(
                ErrorCode::E1001,
                token.position,
                format!("Expected a type but found {} instead.", describe_token(&token)),
            ));
        }
    };

    Ok(ast.alloc_type_expr(TypeExpr {
        kind,
        optional,
        position,
    }))
}

/// Parse `🐚 Type… 🍆` if present.
pub fn parse_generic_argument_list(
    stream: &mut TokenStream,
    ast: &mut Ast,
) -> Result<Vec<TypeExprId>, CompilerError> {
    if !stream.peek_is(glyphs::GENERICS) {
        return Ok(Vec::new());
    }
    stream
        .consume_identifier(glyphs::GENERICS)
        .map_err(token_error)?;
    let mut args = Vec::new();
    while stream.peek_is_everything_but(glyphs::SERIES_END) {
        args.push(parse_type_expr(stream, ast)?);
    }
    stream
        .consume_identifier(glyphs::SERIES_END)
        .map_err(token_error)?;
    Ok(args)
}

/// Parse the rest of `🍇 Type… [➡ Type] 🍉` after the 🍇.
fn parse_callable_tail(
    stream: &mut TokenStream,
    ast: &mut Ast,
) -> Result<TypeExprKind, CompilerError> {
    let mut parameters = Vec::new();
    let mut return_type = None;
    loop {
        if stream.peek_is(glyphs::WATERMELON) {
            stream
                .consume_identifier(glyphs::WATERMELON)
                .map_err(token_error)?;
            break;
        }
        if stream.peek_is(glyphs::RETURN_TYPE) {
            stream
                .consume_identifier(glyphs::RETURN_TYPE)
                .map_err(token_error)?;
            return_type = Some(parse_type_expr(stream, ast)?);
            stream
                .consume_identifier(glyphs::WATERMELON)
                .map_err(token_error)?;
            break;
        }
        parameters.push(parse_type_expr(stream, ast)?);
    }
    Ok(TypeExprKind::Callable {
        parameters,
        return_type,
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use moji_ir::Token;
    use pretty_assertions::assert_eq;

    fn ident(glyph: Glyph) -> Token {
        Token::new(TokenKind::Identifier(glyph), SourcePosition::generated())
    }

    #[test]
    fn test_optional_named_type() {
        let mut stream = TokenStream::new(vec![ident(glyphs::OPTIONAL), ident(glyphs::INTEGER)]);
        let mut ast = Ast::new();
        let id = parse_type_expr(&mut stream, &mut ast).unwrap();
        let parsed = ast.type_expr(id);
        assert!(parsed.optional);
        assert!(matches!(
            parsed.kind,
            TypeExprKind::Named { name, .. } if name == glyphs::INTEGER
        ));
    }

    #[test]
    fn test_callable_type() {
        // 🍇 🚂 ➡ 👌 🍉
        let mut stream = TokenStream::new(vec![
            ident(glyphs::GRAPES),
            ident(glyphs::INTEGER),
            ident(glyphs::RETURN_TYPE),
            ident(glyphs::BOOLEAN),
            ident(glyphs::WATERMELON),
        ]);
        let mut ast = Ast::new();
        let id = parse_type_expr(&mut stream, &mut ast).unwrap();
        match &ast.type_expr(id).kind {
            TypeExprKind::Callable {
                parameters,
                return_type,
            } => {
                assert_eq!(parameters.len(), 1);
                assert!(return_type.is_some());
            }
            other => panic!("expected callable, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_argument_list() {
        // 📥 🐚 🚂 🍆
        let mut stream = TokenStream::new(vec![
            ident(Glyph('📥')),
            ident(glyphs::GENERICS),
            ident(glyphs::INTEGER),
            ident(glyphs::SERIES_END),
        ]);
        let mut ast = Ast::new();
        let id = parse_type_expr(&mut stream, &mut ast).unwrap();
        match &ast.type_expr(id).kind {
            TypeExprKind::Named { generic_args, .. } => assert_eq!(generic_args.len(), 1),
            other => panic!("expected named type, got {other:?}"),
        }
    }
}

//! Statement and expression parsing.
//!
//! Runs over a body's recorded token range, after every signature in the
//! package resolved, and produces a fresh AST arena per function.

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{
    glyphs, Ast, BlockId, ExprId, ExprKind, Glyph, IfBranch, SourcePosition, StmtKind, Token,
    TokenClass, TokenKind, TokenStream, TypeExpr, TypeExprId, TypeExprKind,
};

use crate::{describe_token, parse_type_expr, token_error};

/// Parse one function body from its token range.
pub fn parse_function_body(stream: TokenStream) -> Result<Ast, CompilerError> {
    let mut parser = BodyParser {
        stream,
        ast: Ast::new(),
    };
    let position = parser.stream.peek_position();
    let mut stmts = Vec::new();
    while parser.stream.has_more() {
        stmts.push(parser.parse_statement()?);
    }
    let root = parser.ast.alloc_block(stmts, position);
    parser.ast.root = Some(root);
    Ok(parser.ast)
}

struct BodyParser {
    stream: TokenStream,
    ast: Ast,
}

/// Infix operator precedence; higher binds tighter.
fn operator_precedence(glyph: Glyph) -> Option<u8> {
    if glyph == glyphs::MULTIPLY || glyph == glyphs::DIVIDE || glyph == glyphs::REMAINDER {
        Some(3)
    } else if glyph == glyphs::ADD || glyph == glyphs::SUBTRACT {
        Some(2)
    } else if glyph == glyphs::LESS || glyph == glyphs::GREATER {
        Some(1)
    } else if glyph == glyphs::EQUAL || glyph == glyphs::AND || glyph == glyphs::OR {
        Some(0)
    } else {
        None
    }
}

impl BodyParser {
    fn parse_statement(&mut self) -> Result<moji_ir::StmtId, CompilerError> {
        let position = self.stream.peek_position();
        let Some(token) = self.stream.peek().copied() else {
            return Err(CompilerError::new(
                ErrorCode::E1001,
                position,
                "Expected a statement but the block ended.",
            ));
        };

        let kind = match token.glyph() {
            Some(glyph) if glyph == glyphs::ASSIGN => {
                self.stream.advance();
                self.parse_assignment()?
            }
            Some(glyph) if glyph == glyphs::FROZEN => {
                self.stream.advance();
                let name = self.consume_variable()?;
                let value = self.parse_expression()?;
                StmtKind::ConstantBind { name, value }
            }
            Some(glyph) if glyph == glyphs::DECLARE => {
                self.stream.advance();
                let name = self.consume_variable()?;
                let type_expr = self.parse_type_expr_dynamic()?;
                StmtKind::VariableDeclaration { name, type_expr }
            }
            Some(glyph) if glyph == glyphs::RETURN => {
                self.stream.advance();
                let value = self.parse_expression()?;
                StmtKind::Return(value)
            }
            Some(glyph) if glyph == glyphs::RAISE => {
                self.stream.advance();
                let value = self.parse_expression()?;
                StmtKind::Raise(value)
            }
            Some(glyph) if glyph == glyphs::REPEAT_WHILE => {
                self.stream.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_block()?;
                StmtKind::RepeatWhile { condition, body }
            }
            Some(glyph) if glyph == glyphs::FOR_IN => {
                self.stream.advance();
                let variable = self.consume_variable()?;
                let iteratee = self.parse_expression()?;
                let body = self.parse_block()?;
                StmtKind::ForIn {
                    variable,
                    iteratee,
                    body,
                }
            }
            Some(glyph) if glyph == glyphs::IF => {
                self.stream.advance();
                self.parse_if()?
            }
            Some(glyph) if glyph == glyphs::UNSAFE => {
                self.stream.advance();
                StmtKind::Unsafe(self.parse_block()?)
            }
            Some(glyph) if glyph == glyphs::ERROR_HANDLER => {
                self.stream.advance();
                let variable = self.consume_variable()?;
                let value = self.parse_expression()?;
                let body = self.parse_block()?;
                let else_block = if self.stream.peek_is(glyphs::ELSE) {
                    self.stream.advance();
                    Some(self.parse_block()?)
                } else {
                    None
                };
                StmtKind::ErrorHandler {
                    variable,
                    value,
                    body,
                    else_block,
                }
            }
            Some(glyph) if glyph == glyphs::GRAPES => StmtKind::Block(self.parse_block()?),
            _ => StmtKind::Expression(self.parse_expression()?),
        };
        Ok(self.ast.alloc_stmt(kind, position))
    }

    /// `🍮 name expr` or the operator-assignment sugar `🍮 op name expr`,
    /// which desugars to `🍮 name (op name expr)`.
    fn parse_assignment(&mut self) -> Result<StmtKind, CompilerError> {
        let operator = match self.stream.peek().and_then(Token::glyph) {
            Some(glyph) if operator_precedence(glyph).is_some() => {
                self.stream.advance();
                Some(glyph)
            }
            _ => None,
        };
        let name_position = self.stream.peek_position();
        let name = self.consume_variable()?;
        let value = self.parse_expression()?;
        let value = match operator {
            Some(operator) => {
                let left = self
                    .ast
                    .alloc_expr(ExprKind::GetVariable { name }, name_position);
                self.ast.alloc_expr(
                    ExprKind::BinaryOperator {
                        operator,
                        left,
                        right: value,
                    },
                    name_position,
                )
            }
            None => value,
        };
        Ok(StmtKind::VariableAssignment { name, value })
    }

    fn parse_if(&mut self) -> Result<StmtKind, CompilerError> {
        let mut branches = Vec::new();
        let condition = self.parse_condition()?;
        let block = self.parse_block()?;
        branches.push(IfBranch { condition, block });
        while self.stream.peek_is(glyphs::ELSE_IF) {
            self.stream.advance();
            let condition = self.parse_condition()?;
            let block = self.parse_block()?;
            branches.push(IfBranch { condition, block });
        }
        let else_block = if self.stream.peek_is(glyphs::ELSE) {
            self.stream.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(StmtKind::If {
            branches,
            else_block,
        })
    }

    /// A type expression in a body position, where `⬜ expr` (the type
    /// of a value) is additionally allowed.
    fn parse_type_expr_dynamic(&mut self) -> Result<TypeExprId, CompilerError> {
        if self.stream.peek_is(glyphs::TYPE_FROM_VALUE) {
            let position = self.stream.peek_position();
            self.stream.advance();
            let value = self.parse_primary()?;
            return Ok(self.ast.alloc_type_expr(TypeExpr {
                kind: TypeExprKind::TypeFromValue { value },
                optional: false,
                position,
            }));
        }
        parse_type_expr(&mut self.stream, &mut self.ast)
    }

    fn parse_block(&mut self) -> Result<BlockId, CompilerError> {
        let open = self
            .stream
            .consume_identifier(glyphs::GRAPES)
            .map_err(token_error)?;
        let mut stmts = Vec::new();
        while self.stream.peek_is_everything_but(glyphs::WATERMELON) {
            stmts.push(self.parse_statement()?);
        }
        self.stream
            .consume_identifier(glyphs::WATERMELON)
            .map_err(token_error)?;
        Ok(self.ast.alloc_block(stmts, open.position))
    }

    /// An 🍊/🍋/🔁 condition; `expr ➡ name` binds `name` inside the true
    /// branch only.
    fn parse_condition(&mut self) -> Result<ExprId, CompilerError> {
        let position = self.stream.peek_position();
        let value = self.parse_expression()?;
        if self.stream.peek_is(glyphs::CONDITIONAL_ASSIGNMENT) {
            self.stream.advance();
            let name = self.consume_variable()?;
            return Ok(self
                .ast
                .alloc_expr(ExprKind::ConditionalAssignment { name, value }, position));
        }
        Ok(value)
    }

    fn parse_expression(&mut self) -> Result<ExprId, CompilerError> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<ExprId, CompilerError> {
        let position = self.stream.peek_position();
        let mut left = self.parse_primary()?;
        while let Some(operator) = self.stream.peek().and_then(Token::glyph) {
            let Some(precedence) = operator_precedence(operator) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.stream.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = self.ast.alloc_expr(
                ExprKind::BinaryOperator {
                    operator,
                    left,
                    right,
                },
                position,
            );
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<ExprId, CompilerError> {
        let position = self.stream.peek_position();
        let Some(token) = self.stream.peek().copied() else {
            return Err(CompilerError::new(
                ErrorCode::E1001,
                position,
                "Expected an expression but the block ended.",
            ));
        };

        let kind = match token.kind {
            TokenKind::Integer(value) => {
                self.stream.advance();
                ExprKind::IntegerLiteral(value)
            }
            TokenKind::Double(value) => {
                self.stream.advance();
                ExprKind::DoubleLiteral(value)
            }
            TokenKind::String(value) => {
                self.stream.advance();
                ExprKind::StringLiteral(value)
            }
            TokenKind::Symbol(value) => {
                self.stream.advance();
                ExprKind::SymbolLiteral(value)
            }
            TokenKind::Variable(name) => {
                self.stream.advance();
                ExprKind::GetVariable { name }
            }
            TokenKind::Identifier(glyph) => {
                self.stream.advance();
                self.parse_identifier_expression(glyph, position)?
            }
            TokenKind::DocComment(_) => {
                return Err(CompilerError::new(
                    ErrorCode::E1001,
                    position,
                    format!(
                        "Expected an expression but found {} instead.",
                        describe_token(&token)
                    ),
                ));
            }
        };
        Ok(self.ast.alloc_expr(kind, position))
    }

    fn parse_identifier_expression(
        &mut self,
        glyph: Glyph,
        position: SourcePosition,
    ) -> Result<ExprKind, CompilerError> {
        if glyph == glyphs::TRUE {
            Ok(ExprKind::BooleanLiteral(true))
        } else if glyph == glyphs::FALSE {
            Ok(ExprKind::BooleanLiteral(false))
        } else if glyph == glyphs::NO_VALUE {
            Ok(ExprKind::NothingnessLiteral)
        } else if glyph == glyphs::LIST {
            let elements = self.parse_series()?;
            Ok(ExprKind::ListLiteral(elements))
        } else if glyph == glyphs::DICTIONARY {
            let mut pairs = Vec::new();
            while self.stream.peek_is_everything_but(glyphs::SERIES_END) {
                let key = self.parse_expression()?;
                let value = self.parse_expression()?;
                pairs.push((key, value));
            }
            self.stream
                .consume_identifier(glyphs::SERIES_END)
                .map_err(token_error)?;
            Ok(ExprKind::DictionaryLiteral(pairs))
        } else if glyph == glyphs::CONCATENATE {
            let parts = self.parse_series()?;
            Ok(ExprKind::Concatenate(parts))
        } else if glyph == glyphs::THIS {
            Ok(ExprKind::This)
        } else if glyph == glyphs::SUPER {
            let name = self.consume_method_name()?;
            let args = self.parse_arguments()?;
            Ok(ExprKind::SuperMethodCall { name, args })
        } else if glyph == glyphs::TYPE_METHOD {
            let name = self.consume_method_name()?;
            let callee = self.parse_type_expr_dynamic()?;
            let args = self.parse_arguments()?;
            Ok(ExprKind::TypeMethodCall { name, callee, args })
        } else if glyph == glyphs::INITIALIZATION {
            let type_expr = self.parse_type_expr_dynamic()?;
            let name = self.consume_method_name()?;
            let args = self.parse_arguments()?;
            Ok(ExprKind::Initialization {
                type_expr,
                name,
                args,
            })
        } else if glyph == glyphs::CALLABLE_CALL {
            let callee = self.parse_primary()?;
            let args = self.parse_arguments()?;
            Ok(ExprKind::CallableCall { callee, args })
        } else if glyph == glyphs::CAPTURE_METHOD {
            let name = self.consume_method_name()?;
            let receiver = self.parse_primary()?;
            Ok(ExprKind::CaptureMethod { name, receiver })
        } else if glyph == glyphs::CAST {
            let value = self.parse_primary()?;
            let target = self.parse_type_expr_dynamic()?;
            Ok(ExprKind::Cast { value, target })
        } else if glyph == glyphs::IS_ERROR {
            let value = self.parse_primary()?;
            Ok(ExprKind::IsError { value })
        } else if glyph == glyphs::UNWRAP {
            let value = self.parse_primary()?;
            Ok(ExprKind::Unwrap { value })
        } else if glyph == glyphs::META_TYPE {
            let type_expr = self.parse_type_expr_dynamic()?;
            Ok(ExprKind::MetaTypeInstantiation { type_expr })
        } else if glyph == glyphs::TYPE_VALUE {
            let type_expr = self.parse_type_expr_dynamic()?;
            Ok(ExprKind::TypeAsValue { type_expr })
        } else if glyph == glyphs::SIZE_OF {
            let type_expr = self.parse_type_expr_dynamic()?;
            Ok(ExprKind::SizeOf { type_expr })
        } else if glyph == glyphs::GRAPES
            || glyph == glyphs::WATERMELON
            || glyph == glyphs::SERIES_END
            || glyph == glyphs::END_ARGUMENTS
        {
            Err(CompilerError::new(
                ErrorCode::E1001,
                position,
                format!("Unexpected {glyph}."),
            ))
        } else {
            // Any other glyph heads a method call:
            // `glyph receiver [🐚 Type… 🍆] arg… ❗`
            let receiver = self.parse_primary()?;
            let generic_args =
                crate::parse_generic_argument_list(&mut self.stream, &mut self.ast)?;
            let args = self.parse_arguments()?;
            Ok(ExprKind::MethodCall {
                name: glyph,
                receiver,
                generic_args,
                args,
            })
        }
    }

    /// Expressions up to a 🍆.
    fn parse_series(&mut self) -> Result<Vec<ExprId>, CompilerError> {
        let mut elements = Vec::new();
        while self.stream.peek_is_everything_but(glyphs::SERIES_END) {
            elements.push(self.parse_expression()?);
        }
        self.stream
            .consume_identifier(glyphs::SERIES_END)
            .map_err(token_error)?;
        Ok(elements)
    }

    /// Argument expressions up to the ❗ terminator.
    fn parse_arguments(&mut self) -> Result<Vec<ExprId>, CompilerError> {
        let mut args = Vec::new();
        while self.stream.peek_is_everything_but(glyphs::END_ARGUMENTS) {
            args.push(self.parse_expression()?);
        }
        self.stream
            .consume_identifier(glyphs::END_ARGUMENTS)
            .map_err(token_error)?;
        Ok(args)
    }

    fn consume_variable(&mut self) -> Result<moji_ir::Name, CompilerError> {
        let token = self
            .stream
            .consume(TokenClass::Variable)
            .map_err(token_error)?;
        let TokenKind::Variable(name) = token.kind else {
            unreachable!("consume checked the class");
        };
        Ok(name)
    }

    fn consume_method_name(&mut self) -> Result<Glyph, CompilerError> {
        let token = self
            .stream
            .consume(TokenClass::Identifier)
            .map_err(token_error)?;
        token.glyph().ok_or_else(|| {
            CompilerError::new(ErrorCode::E1001, token.position, "Expected a method name.")
        })
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use moji_ir::Name;
    use pretty_assertions::assert_eq;

    fn ident(glyph: Glyph) -> Token {
        Token::new(TokenKind::Identifier(glyph), SourcePosition::generated())
    }

    fn var(index: u32) -> Token {
        Token::new(TokenKind::Variable(Name(index)), SourcePosition::generated())
    }

    fn int(value: i64) -> Token {
        Token::new(TokenKind::Integer(value), SourcePosition::generated())
    }

    #[test]
    fn test_assignment() {
        // 🍮 x 5
        let ast = parse_function_body(TokenStream::new(vec![
            ident(glyphs::ASSIGN),
            var(0),
            int(5),
        ]))
        .unwrap();
        let root = ast.root.unwrap();
        let stmts = &ast.block(root).stmts;
        assert_eq!(stmts.len(), 1);
        assert!(matches!(
            ast.stmt(stmts[0]).kind,
            StmtKind::VariableAssignment { name: Name(0), .. }
        ));
    }

    #[test]
    fn test_operator_assignment_desugars() {
        // 🍮 ➕ x 1  ==>  🍮 x (➕ x 1)
        let ast = parse_function_body(TokenStream::new(vec![
            ident(glyphs::ASSIGN),
            ident(glyphs::ADD),
            var(0),
            int(1),
        ]))
        .unwrap();
        let root = ast.root.unwrap();
        let StmtKind::VariableAssignment { value, .. } = ast.stmt(ast.block(root).stmts[0]).kind
        else {
            panic!("expected assignment");
        };
        assert!(matches!(
            ast.expr(value).kind,
            ExprKind::BinaryOperator { operator, .. } if operator == glyphs::ADD
        ));
    }

    #[test]
    fn test_precedence() {
        // 🍎 1 ➕ 2 ✖ 3  parses as 1 ➕ (2 ✖ 3)
        let ast = parse_function_body(TokenStream::new(vec![
            ident(glyphs::RETURN),
            int(1),
            ident(glyphs::ADD),
            int(2),
            ident(glyphs::MULTIPLY),
            int(3),
        ]))
        .unwrap();
        let root = ast.root.unwrap();
        let StmtKind::Return(value) = ast.stmt(ast.block(root).stmts[0]).kind else {
            panic!("expected return");
        };
        let ExprKind::BinaryOperator {
            operator, right, ..
        } = ast.expr(value).kind
        else {
            panic!("expected binary operator");
        };
        assert_eq!(operator, glyphs::ADD);
        assert!(matches!(
            ast.expr(right).kind,
            ExprKind::BinaryOperator { operator, .. } if operator == glyphs::MULTIPLY
        ));
    }

    #[test]
    fn test_method_call_with_terminator() {
        // 📤 x 1 2 ❗  — method 📤 on receiver x with two arguments.
        let ast = parse_function_body(TokenStream::new(vec![
            ident(Glyph('📤')),
            var(0),
            int(1),
            int(2),
            ident(glyphs::END_ARGUMENTS),
        ]))
        .unwrap();
        let root = ast.root.unwrap();
        let StmtKind::Expression(expr) = ast.stmt(ast.block(root).stmts[0]).kind else {
            panic!("expected expression statement");
        };
        let ExprKind::MethodCall { name, ref args, .. } = ast.expr(expr).kind else {
            panic!("expected method call");
        };
        assert_eq!(name, Glyph('📤'));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_conditional_assignment_only_in_conditions() {
        // 🍊 x ➡ y 🍇 🍉
        let ast = parse_function_body(TokenStream::new(vec![
            ident(glyphs::IF),
            var(0),
            ident(glyphs::CONDITIONAL_ASSIGNMENT),
            var(1),
            ident(glyphs::GRAPES),
            ident(glyphs::WATERMELON),
        ]))
        .unwrap();
        let root = ast.root.unwrap();
        let StmtKind::If { ref branches, .. } = ast.stmt(ast.block(root).stmts[0]).kind else {
            panic!("expected if");
        };
        assert!(matches!(
            ast.expr(branches[0].condition).kind,
            ExprKind::ConditionalAssignment { name: Name(1), .. }
        ));
    }
}

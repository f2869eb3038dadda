//! Expression analysis and the `expect` conversion ladder.

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{BoxKind, ExprId, ExprKind, SourcePosition};
use moji_types::{CommonTypeFinder, FunctionKind, Type, TypeKind};

use crate::{analysis::ResolvedVariableUse, FunctionAnalyser, ThunkRequest, TypeExpectation};

impl FunctionAnalyser<'_> {
    /// Analyse an expression against an expectation.
    ///
    /// Returns the final type and the (possibly rewrapped) node id: when
    /// an implicit conversion applies, a wrapper node is inserted and
    /// its id replaces the original in the parent.
    pub(crate) fn expect(
        &mut self,
        expectation: TypeExpectation,
        expr: ExprId,
    ) -> Result<(Type, ExprId), CompilerError> {
        let position = self.ast.expr(expr).position;
        let produced = self.analyse_expr(expr, &expectation)?;
        self.record_type(expr, produced.clone());

        let Some(expected) = expectation.ty else {
            return Ok((produced, expr));
        };

        if produced.compatible_to(&expected, self.registry) {
            // Compatible, but the representation may still differ; a
            // box node reconciles the calling conventions.
            return Ok(self.insert_representation_box(expr, produced, expected));
        }

        // Unwrapping is never implicit.
        if produced.optional() && !expected.optional() && !matches!(expected.kind(), TypeKind::Something)
        {
            return Err(CompilerError::new(
                ErrorCode::E3001,
                position,
                format!(
                    "{} is not compatible to {}; unwrap the 🍬 value with 🍺 first.",
                    self.describe(&produced),
                    self.describe(&expected)
                ),
            ));
        }

        Err(CompilerError::new(
            ErrorCode::E3001,
            position,
            format!(
                "{} is not compatible to {}.",
                self.describe(&produced),
                self.describe(&expected)
            ),
        ))
    }

    /// Insert a box/thunk wrapper when the value's representation does
    /// not match the expected one.
    fn insert_representation_box(
        &mut self,
        expr: ExprId,
        produced: Type,
        expected: Type,
    ) -> (Type, ExprId) {
        let kind = match (produced.kind(), expected.kind()) {
            (TypeKind::Something, TypeKind::Something) => None,
            (_, TypeKind::Something) => Some(BoxKind::ToSomething),
            (TypeKind::Protocol(_) | TypeKind::MultiProtocol(_), TypeKind::Protocol(_))
            | (TypeKind::MultiProtocol(_), TypeKind::MultiProtocol(_)) => None,
            (_, TypeKind::Protocol(_) | TypeKind::MultiProtocol(_)) => Some(BoxKind::ToProtocol),
            (TypeKind::Someobject, TypeKind::Someobject) => None,
            (TypeKind::Class(_), TypeKind::Someobject) => Some(BoxKind::ToSomeobject),
            (TypeKind::Callable, TypeKind::Callable) if produced != expected => {
                self.analysis.pending_thunks.push(ThunkRequest {
                    expr,
                    from: produced.clone(),
                    to: expected.clone(),
                });
                Some(BoxKind::CallableThunk)
            }
            _ => None,
        };
        match kind {
            Some(kind) => {
                let position = self.ast.expr(expr).position;
                let wrapped = self
                    .ast
                    .alloc_expr(ExprKind::Box { kind, value: expr }, position);
                self.record_type(wrapped, expected.clone());
                (expected, wrapped)
            }
            None => (produced, expr),
        }
    }

    pub(crate) fn describe(&self, ty: &Type) -> String {
        ty.to_string(self.registry, self.pool, true)
    }

    /// The depth-first walk: analyse one expression node, writing back
    /// any rewrapped children, and return the produced type.
    pub(crate) fn analyse_expr(
        &mut self,
        expr: ExprId,
        expectation: &TypeExpectation,
    ) -> Result<Type, CompilerError> {
        let position = self.ast.expr(expr).position;
        let kind = self.ast.expr(expr).kind.clone();
        match kind {
            ExprKind::IntegerLiteral(_) => {
                // An integer literal in a 💯 context is a double literal.
                if matches!(
                    expectation.ty.as_ref().map(Type::kind),
                    Some(TypeKind::Double)
                ) {
                    return Ok(Type::double());
                }
                Ok(Type::integer())
            }
            ExprKind::DoubleLiteral(_) => Ok(Type::double()),
            ExprKind::BooleanLiteral(_) => Ok(Type::boolean()),
            ExprKind::SymbolLiteral(_) => Ok(Type::symbol()),
            ExprKind::NothingnessLiteral => Ok(Type::nothingness()),
            ExprKind::StringLiteral(_) => Ok(self.string_type()),
            ExprKind::ListLiteral(elements) => self.analyse_list_literal(expr, elements, expectation, position),
            ExprKind::DictionaryLiteral(pairs) => {
                self.analyse_dictionary_literal(expr, pairs, expectation, position)
            }
            ExprKind::Concatenate(parts) => {
                let string = self.string_type();
                let mut new_parts = Vec::with_capacity(parts.len());
                for part in parts {
                    let (_, part) = self.expect(TypeExpectation::of(&string), part)?;
                    new_parts.push(part);
                }
                self.write_expr(expr, ExprKind::Concatenate(new_parts));
                Ok(string)
            }
            ExprKind::This => match self.function_kind {
                FunctionKind::ClassMethod => Ok(self.owner.as_meta()),
                _ => Ok(self.owner.clone()),
            },
            ExprKind::GetVariable { name } => {
                let resolved = self.scoper.get_variable(name, position, self.pool)?;
                if !resolved.initialized {
                    return Err(CompilerError::new(
                        ErrorCode::E4006,
                        position,
                        format!(
                            "Variable {} used before initialization.",
                            self.pool.get(name)
                        ),
                    ));
                }
                self.analysis.variable_uses.insert(
                    expr,
                    ResolvedVariableUse {
                        id: resolved.id,
                        from_instance: resolved.from_instance,
                    },
                );
                Ok(resolved.ty)
            }
            ExprKind::MethodCall {
                name,
                receiver,
                generic_args,
                args,
            } => self.analyse_method_call(expr, name, receiver, generic_args, args),
            ExprKind::SuperMethodCall { name, args } => {
                self.analyse_super_call(expr, name, args, position)
            }
            ExprKind::TypeMethodCall { name, callee, args } => {
                self.analyse_type_method_call(expr, name, callee, args, position)
            }
            ExprKind::Initialization {
                type_expr,
                name,
                args,
            } => self.analyse_initialization(expr, type_expr, name, args, position),
            ExprKind::CallableCall { callee, args } => {
                let (callee_ty, callee) = self.expect(TypeExpectation::none(), callee)?;
                if !callee_ty.is_callable() {
                    return Err(CompilerError::new(
                        ErrorCode::E3005,
                        position,
                        format!("⁉ requires a callable, got {}.", self.describe(&callee_ty)),
                    ));
                }
                let parameters: Vec<Type> = callee_ty.callable_parameters().to_vec();
                if args.len() != parameters.len() {
                    return Err(CompilerError::new(
                        ErrorCode::E3011,
                        position,
                        format!(
                            "The callable takes {} argument(s), but {} were supplied.",
                            parameters.len(),
                            args.len()
                        ),
                    ));
                }
                let mut new_args = Vec::with_capacity(args.len());
                for (arg, parameter) in args.into_iter().zip(&parameters) {
                    let (_, arg) = self.expect(TypeExpectation::of(parameter), arg)?;
                    new_args.push(arg);
                }
                self.write_expr(
                    expr,
                    ExprKind::CallableCall {
                        callee,
                        args: new_args,
                    },
                );
                Ok(callee_ty.callable_return().clone())
            }
            ExprKind::CaptureMethod { name, receiver } => {
                self.analyse_capture_method(expr, name, receiver, position)
            }
            ExprKind::BinaryOperator {
                operator,
                left,
                right,
            } => self.analyse_binary_operator(expr, operator, left, right, position),
            ExprKind::Cast { value, target } => {
                let (_, value) = self.expect(TypeExpectation::none(), value)?;
                let target_ty = self.resolve_type(target)?;
                self.write_expr(expr, ExprKind::Cast { value, target });
                // A cast can fail at runtime, so the result is 🍬.
                Ok(target_ty.optionalized())
            }
            ExprKind::IsError { value } => {
                let (value_ty, value) = self.expect(TypeExpectation::none(), value)?;
                if !value_ty.is_error() {
                    return Err(CompilerError::new(
                        ErrorCode::E3006,
                        position,
                        "🚥 can only be used with 🚨.",
                    ));
                }
                self.write_expr(expr, ExprKind::IsError { value });
                Ok(Type::boolean())
            }
            ExprKind::Unwrap { value } => {
                let (value_ty, value) = self.expect(TypeExpectation::none(), value)?;
                self.write_expr(expr, ExprKind::Unwrap { value });
                if value_ty.optional() {
                    return Ok(value_ty.non_optional());
                }
                if value_ty.is_error() {
                    return Ok(value_ty.error_value().clone());
                }
                Err(CompilerError::new(
                    ErrorCode::E3007,
                    position,
                    "🍺 can only be used with optionals or 🚨.",
                ))
            }
            ExprKind::MetaTypeInstantiation { type_expr } | ExprKind::TypeAsValue { type_expr } => {
                let ty = self.resolve_type(type_expr)?;
                Ok(ty.as_meta())
            }
            ExprKind::SizeOf { type_expr } => {
                self.resolve_type(type_expr)?;
                Ok(Type::integer())
            }
            ExprKind::ConditionalAssignment { .. } => Err(CompilerError::new(
                ErrorCode::E1001,
                position,
                "➡ may only appear in an 🍊, 🍋 or 🔁 condition.",
            )),
            ExprKind::Box { kind, value } => {
                // Re-analysis of an already-annotated tree: a box node
                // reproduces the expected type, so no second wrapper is
                // ever inserted.
                let (inner, _) = self.expect(TypeExpectation::none(), value)?;
                Ok(match kind {
                    BoxKind::ToSomething => Type::something(),
                    BoxKind::ToSomeobject => Type::someobject(),
                    BoxKind::ToProtocol | BoxKind::CallableThunk => match &expectation.ty {
                        Some(expected) => expected.clone(),
                        None => {
                            let recorded = self.analysis.expr_type(expr);
                            if recorded.is_nothingness() {
                                inner
                            } else {
                                recorded
                            }
                        }
                    },
                })
            }
        }
    }

    fn string_type(&self) -> Type {
        Type::class(self.registry.builtins().string_class, Vec::new())
    }

    fn analyse_list_literal(
        &mut self,
        expr: ExprId,
        elements: Vec<ExprId>,
        expectation: &TypeExpectation,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let builtins = self.registry.builtins();
        let expected_element = expectation
            .ty
            .as_ref()
            .filter(|ty| ty.class_id() == Some(builtins.list_class))
            .and_then(|ty| ty.generic_args().first().cloned());

        let mut finder = CommonTypeFinder::new();
        let mut new_elements = Vec::with_capacity(elements.len());
        for element in elements {
            let expectation = match &expected_element {
                Some(ty) => TypeExpectation::of(ty),
                None => TypeExpectation::none(),
            };
            let (ty, element) = self.expect(expectation, element)?;
            finder.add_type(&ty, self.registry);
            new_elements.push(element);
        }
        self.write_expr(expr, ExprKind::ListLiteral(new_elements));

        let element = match expected_element {
            Some(ty) => ty,
            None => finder.common_type(position, self.diagnostics),
        };
        Ok(Type::class(builtins.list_class, vec![element]))
    }

    fn analyse_dictionary_literal(
        &mut self,
        expr: ExprId,
        pairs: Vec<(ExprId, ExprId)>,
        expectation: &TypeExpectation,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let builtins = self.registry.builtins();
        let string = self.string_type();
        let expected_value = expectation
            .ty
            .as_ref()
            .filter(|ty| ty.class_id() == Some(builtins.dictionary_class))
            .and_then(|ty| ty.generic_args().first().cloned());

        let mut finder = CommonTypeFinder::new();
        let mut new_pairs = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let (_, key) = self.expect(TypeExpectation::of(&string), key)?;
            let value_expectation = match &expected_value {
                Some(ty) => TypeExpectation::of(ty),
                None => TypeExpectation::none(),
            };
            let (value_ty, value) = self.expect(value_expectation, value)?;
            finder.add_type(&value_ty, self.registry);
            new_pairs.push((key, value));
        }
        self.write_expr(expr, ExprKind::DictionaryLiteral(new_pairs));

        let value = match expected_value {
            Some(ty) => ty,
            None => finder.common_type(position, self.diagnostics),
        };
        Ok(Type::class(builtins.dictionary_class, vec![value]))
    }
}

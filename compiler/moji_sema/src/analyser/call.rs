//! Method resolution and call analysis.
//!
//! Dispatch selection walks the class hierarchy from the most-derived
//! class upward, or consults the protocol / value-type method tables.
//! Generic call arguments are matched against declared constraints;
//! unspecified ones are inferred from argument types by unification,
//! left-to-right, first-wins.

use smallvec::SmallVec;

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{ExprId, ExprKind, Glyph, SourcePosition, TypeExprId};
use moji_types::{
    AccessLevel, FunctionDef, FunctionId, FunctionKind, FunctionModifiers, MethodTable, Type,
    TypeKind,
};

use crate::{CallTarget, DispatchKind, FunctionAnalyser, TypeExpectation};

/// One resolved call site.
pub(crate) struct ResolvedCall {
    pub function: FunctionId,
    /// Receiver type resolved at the defining type, for signature
    /// resolution.
    pub context: Type,
    pub dispatch: DispatchKind,
}

impl FunctionAnalyser<'_> {
    /// Resolve a method on a receiver type.
    pub(crate) fn resolve_method(
        &self,
        receiver: &Type,
        name: Glyph,
        position: SourcePosition,
    ) -> Result<ResolvedCall, CompilerError> {
        if receiver.optional() {
            return Err(CompilerError::new(
                ErrorCode::E3003,
                position,
                format!(
                    "Cannot call {name} on an 🍬 value; unwrap it with 🍺 first."
                ),
            ));
        }
        match receiver.kind() {
            TypeKind::Class(id) => {
                let Some((defining, function)) =
                    self.registry.class_member(*id, name, MethodTable::Methods)
                else {
                    return Err(self.method_not_found(receiver, name, position));
                };
                self.check_access(function, position)?;
                let context = self
                    .registry
                    .context_for_ancestor(receiver, defining)
                    .unwrap_or_else(|| receiver.clone());
                let dispatch = if self
                    .registry
                    .function(function)
                    .modifiers
                    .contains(FunctionModifiers::FINAL)
                {
                    DispatchKind::Direct
                } else {
                    DispatchKind::VirtualTable
                };
                Ok(ResolvedCall {
                    function,
                    context,
                    dispatch,
                })
            }
            TypeKind::Protocol(id) => {
                let Some(function) = self.registry.protocol_method(*id, name) else {
                    return Err(self.method_not_found(receiver, name, position));
                };
                Ok(ResolvedCall {
                    function,
                    context: receiver.clone(),
                    dispatch: DispatchKind::ProtocolTable,
                })
            }
            TypeKind::MultiProtocol(protocols) => {
                for protocol in protocols {
                    if let Ok(resolved) = self.resolve_method(protocol, name, position) {
                        return Ok(resolved);
                    }
                }
                Err(self.method_not_found(receiver, name, position))
            }
            _ => {
                let Some(value_type) = self.registry.primitive_value_type(receiver.kind()) else {
                    return Err(self.method_not_found(receiver, name, position));
                };
                let Some(function) = self.registry.value_type_method(value_type, name) else {
                    return Err(self.method_not_found(receiver, name, position));
                };
                Ok(ResolvedCall {
                    function,
                    context: receiver.clone(),
                    dispatch: DispatchKind::Direct,
                })
            }
        }
    }

    fn method_not_found(
        &self,
        receiver: &Type,
        name: Glyph,
        position: SourcePosition,
    ) -> CompilerError {
        CompilerError::new(
            ErrorCode::E3005,
            position,
            format!("{} has no method {name}.", self.describe(receiver)),
        )
    }

    /// Enforce 🔒 and 🔐 on a resolved function.
    fn check_access(&self, function: FunctionId, position: SourcePosition) -> Result<(), CompilerError> {
        let def = self.registry.function(function);
        match def.access {
            AccessLevel::Public => Ok(()),
            AccessLevel::Private => {
                if self.owner.kind() == def.owner.kind() {
                    Ok(())
                } else {
                    Err(CompilerError::new(
                        ErrorCode::E4001,
                        position,
                        format!("{} is 🔒.", def.name),
                    ))
                }
            }
            AccessLevel::Protected => {
                let accessible = match def.owner.class_id() {
                    Some(defining) => self
                        .registry
                        .context_for_ancestor(&self.owner, defining)
                        .is_some(),
                    None => false,
                };
                if accessible {
                    Ok(())
                } else {
                    Err(CompilerError::new(
                        ErrorCode::E4001,
                        position,
                        format!("{} is 🔐.", def.name),
                    ))
                }
            }
        }
    }

    fn warn_if_deprecated(&mut self, function: FunctionId, position: SourcePosition) {
        let def = self.registry.function(function);
        if def.is_deprecated() {
            let name = def.name;
            self.diagnostics
                .warn(position, format!("{name} is deprecated."));
        }
    }

    // Call forms.

    pub(crate) fn analyse_method_call(
        &mut self,
        expr: ExprId,
        name: Glyph,
        receiver: ExprId,
        generic_args: Vec<TypeExprId>,
        args: Vec<ExprId>,
    ) -> Result<Type, CompilerError> {
        let position = self.ast.expr(expr).position;
        let (receiver_ty, receiver) = self.expect(TypeExpectation::none(), receiver)?;
        let resolved = self.resolve_method(&receiver_ty, name, position)?;
        self.warn_if_deprecated(resolved.function, position);

        let (new_args, return_type) =
            self.analyse_call_arguments(&resolved, &generic_args, args, position)?;
        let return_type = if self
            .registry
            .function(resolved.function)
            .modifiers
            .contains(FunctionModifiers::RETURNS_SELF)
        {
            receiver_ty.clone()
        } else {
            return_type
        };

        self.analysis.call_targets.insert(
            expr,
            CallTarget {
                function: resolved.function,
                dispatch: resolved.dispatch,
            },
        );
        self.write_expr(
            expr,
            ExprKind::MethodCall {
                name,
                receiver,
                generic_args,
                args: new_args,
            },
        );
        Ok(return_type)
    }

    pub(crate) fn analyse_super_call(
        &mut self,
        expr: ExprId,
        name: Glyph,
        args: Vec<ExprId>,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        if !matches!(
            self.function_kind,
            FunctionKind::Method | FunctionKind::Initializer
        ) {
            return Err(CompilerError::new(
                ErrorCode::E4012,
                position,
                "🐿 may only be used inside methods and initializers.",
            ));
        }
        let superclass = self
            .owner
            .class_id()
            .and_then(|id| self.registry.class(id).superclass);
        let Some(superclass) = superclass else {
            return Err(CompilerError::new(
                ErrorCode::E4012,
                position,
                "🐿 may only be used in classes with a superclass.",
            ));
        };
        let super_type = self
            .registry
            .context_for_ancestor(&self.owner, superclass)
            .unwrap_or_else(|| Type::class(superclass, Vec::new()));
        let resolved = self.resolve_method(&super_type, name, position)?;
        self.warn_if_deprecated(resolved.function, position);

        let (new_args, return_type) = self.analyse_call_arguments(&resolved, &[], args, position)?;
        self.analysis.call_targets.insert(
            expr,
            CallTarget {
                function: resolved.function,
                dispatch: DispatchKind::Direct,
            },
        );
        self.write_expr(expr, ExprKind::SuperMethodCall { name, args: new_args });
        Ok(return_type)
    }

    pub(crate) fn analyse_type_method_call(
        &mut self,
        expr: ExprId,
        name: Glyph,
        callee: TypeExprId,
        args: Vec<ExprId>,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let callee_ty = self.resolve_type(callee)?;
        let TypeKind::Class(class) = callee_ty.kind() else {
            return Err(CompilerError::new(
                ErrorCode::E3005,
                position,
                format!(
                    "🍩 requires a class type, got {}.",
                    self.describe(&callee_ty)
                ),
            ));
        };
        let Some((defining, function)) =
            self.registry
                .class_member(*class, name, MethodTable::ClassMethods)
        else {
            return Err(self.method_not_found(&callee_ty, name, position));
        };
        self.check_access(function, position)?;
        self.warn_if_deprecated(function, position);

        let resolved = ResolvedCall {
            function,
            context: self
                .registry
                .context_for_ancestor(&callee_ty, defining)
                .unwrap_or_else(|| callee_ty.clone()),
            dispatch: DispatchKind::Direct,
        };
        let (new_args, return_type) = self.analyse_call_arguments(&resolved, &[], args, position)?;
        self.analysis.call_targets.insert(
            expr,
            CallTarget {
                function,
                dispatch: DispatchKind::Direct,
            },
        );
        self.write_expr(
            expr,
            ExprKind::TypeMethodCall {
                name,
                callee,
                args: new_args,
            },
        );
        Ok(return_type)
    }

    pub(crate) fn analyse_initialization(
        &mut self,
        expr: ExprId,
        type_expr: TypeExprId,
        name: Glyph,
        args: Vec<ExprId>,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let target = self.resolve_type(type_expr)?;
        match target.kind() {
            TypeKind::Enum(id) => {
                let Some(ordinal) = self.registry.enumeration(*id).value_of(name) else {
                    return Err(CompilerError::new(
                        ErrorCode::E3005,
                        position,
                        format!("{name} is not a value of 🦃 {}.", self.describe(&target)),
                    ));
                };
                if !args.is_empty() {
                    return Err(CompilerError::new(
                        ErrorCode::E3011,
                        position,
                        "Enum values take no arguments.",
                    ));
                }
                self.analysis.enum_values.insert(expr, ordinal);
                Ok(target)
            }
            TypeKind::Class(id) => {
                // Initializers are not inherited: only this class's
                // table is searched.
                let function = self
                    .registry
                    .class(*id)
                    .initializers
                    .iter()
                    .copied()
                    .find(|f| self.registry.function(*f).name == name);
                let Some(function) = function else {
                    return Err(CompilerError::new(
                        ErrorCode::E3005,
                        position,
                        format!("{} has no initializer {name}.", self.describe(&target)),
                    ));
                };
                self.check_access(function, position)?;
                self.warn_if_deprecated(function, position);

                let resolved = ResolvedCall {
                    function,
                    context: target.clone(),
                    dispatch: DispatchKind::Direct,
                };
                let (new_args, _) = self.analyse_call_arguments(&resolved, &[], args, position)?;
                self.analysis.call_targets.insert(
                    expr,
                    CallTarget {
                        function,
                        dispatch: DispatchKind::Direct,
                    },
                );
                self.write_expr(
                    expr,
                    ExprKind::Initialization {
                        type_expr,
                        name,
                        args: new_args,
                    },
                );
                let can_fail = self
                    .registry
                    .function(function)
                    .modifiers
                    .contains(FunctionModifiers::CAN_RETURN_NOTHINGNESS);
                Ok(if can_fail { target.optionalized() } else { target })
            }
            _ => Err(CompilerError::new(
                ErrorCode::E3005,
                position,
                format!("🔷 cannot instantiate {}.", self.describe(&target)),
            )),
        }
    }

    pub(crate) fn analyse_capture_method(
        &mut self,
        expr: ExprId,
        name: Glyph,
        receiver: ExprId,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let (receiver_ty, receiver) = self.expect(TypeExpectation::none(), receiver)?;
        let resolved = self.resolve_method(&receiver_ty, name, position)?;
        self.warn_if_deprecated(resolved.function, position);

        let def = self.registry.function(resolved.function);
        let parameters: Vec<Type> = def
            .parameters
            .iter()
            .map(|parameter| parameter.ty.resolve_on(&resolved.context))
            .collect();
        let return_type = def.return_type.resolve_on(&resolved.context);

        self.analysis.call_targets.insert(
            expr,
            CallTarget {
                function: resolved.function,
                dispatch: resolved.dispatch,
            },
        );
        self.write_expr(expr, ExprKind::CaptureMethod { name, receiver });
        Ok(Type::callable(return_type, parameters))
    }

    pub(crate) fn analyse_binary_operator(
        &mut self,
        expr: ExprId,
        operator: Glyph,
        left: ExprId,
        right: ExprId,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let (left_ty, left) = self.expect(TypeExpectation::none(), left)?;
        let resolved = self.resolve_method(&left_ty, operator, position)?;

        let (new_args, return_type) =
            self.analyse_call_arguments(&resolved, &[], vec![right], position)?;
        let right = new_args.first().copied().unwrap_or(right);

        self.analysis.call_targets.insert(
            expr,
            CallTarget {
                function: resolved.function,
                dispatch: resolved.dispatch,
            },
        );
        self.write_expr(
            expr,
            ExprKind::BinaryOperator {
                operator,
                left,
                right,
            },
        );
        Ok(return_type)
    }

    // Argument analysis with generic validation and inference.

    fn analyse_call_arguments(
        &mut self,
        resolved: &ResolvedCall,
        generic_args: &[TypeExprId],
        args: Vec<ExprId>,
        position: SourcePosition,
    ) -> Result<(Vec<ExprId>, Type), CompilerError> {
        let def: FunctionDef = self.registry.function(resolved.function).clone();
        let arity = def.generic_parameters.len();

        let mut substitutions: Vec<Option<Type>> = vec![None; arity];
        if !generic_args.is_empty() {
            if generic_args.len() != arity {
                return Err(CompilerError::new(
                    ErrorCode::E3002,
                    position,
                    format!(
                        "{} takes {arity} generic argument(s), but {} were supplied.",
                        def.name,
                        generic_args.len()
                    ),
                ));
            }
            for (slot, generic_arg) in substitutions.iter_mut().zip(generic_args) {
                *slot = Some(self.resolve_type(*generic_arg)?);
            }
        }

        if args.len() != def.parameters.len() {
            return Err(CompilerError::new(
                ErrorCode::E3011,
                position,
                format!(
                    "{} expects {} argument(s), but {} were supplied.",
                    def.name,
                    def.parameters.len(),
                    args.len()
                ),
            ));
        }

        let mut new_args = Vec::with_capacity(args.len());
        for (arg, parameter) in args.into_iter().zip(&def.parameters) {
            let declared = parameter.ty.resolve_on(&resolved.context);
            let declared = apply_substitutions(&declared, &substitutions, &def);
            if declared.has_local_variables() {
                // Infer from the argument's type, first-wins.
                let (produced, arg) = self.expect(TypeExpectation::none(), arg)?;
                unify(&declared, &produced, &mut substitutions);
                let filled = apply_substitutions(&declared, &substitutions, &def);
                if !filled.has_local_variables()
                    && !produced.compatible_to(&filled, self.registry)
                {
                    return Err(CompilerError::new(
                        ErrorCode::E3001,
                        self.ast.expr(arg).position,
                        format!(
                            "{} is not compatible to {}.",
                            self.describe(&produced),
                            self.describe(&filled)
                        ),
                    ));
                }
                new_args.push(arg);
            } else {
                let (_, arg) = self.expect(TypeExpectation::of(&declared), arg)?;
                new_args.push(arg);
            }
        }

        // Every generic parameter must be bound by now.
        let mut bound: SmallVec<[Type; 4]> = SmallVec::new();
        for (index, slot) in substitutions.iter().enumerate() {
            match slot {
                Some(ty) => {
                    let constraint = def.generic_parameters[index]
                        .constraint
                        .resolve_on(&resolved.context);
                    if !ty.has_free_variables() && !ty.compatible_to(&constraint, self.registry) {
                        return Err(CompilerError::new(
                            ErrorCode::E3008,
                            position,
                            format!(
                                "Generic argument {} does not satisfy the constraint {}.",
                                self.describe(ty),
                                self.describe(&constraint)
                            ),
                        ));
                    }
                    bound.push(ty.clone());
                }
                None => {
                    return Err(CompilerError::new(
                        ErrorCode::E3009,
                        position,
                        format!(
                            "Generic argument {} could not be inferred.",
                            self.pool.get(def.generic_parameters[index].name)
                        ),
                    ));
                }
            }
        }

        let return_type = def
            .return_type
            .resolve_on(&resolved.context)
            .substitute_locals(&bound);
        Ok((new_args, return_type))
    }
}

/// Substitute the already-bound local variables, leaving unbound ones in
/// place.
fn apply_substitutions(ty: &Type, substitutions: &[Option<Type>], def: &FunctionDef) -> Type {
    if substitutions.is_empty() {
        return ty.clone();
    }
    let filled: Vec<Type> = substitutions
        .iter()
        .enumerate()
        .map(|(index, slot)| match slot {
            Some(ty) => ty.clone(),
            None => Type::generic_variable(
                index as u16,
                true,
                def.generic_parameters[index].name,
            ),
        })
        .collect();
    ty.substitute_locals(&filled)
}

/// Structural unification of a declared parameter type against an
/// argument type; first binding wins.
fn unify(declared: &Type, actual: &Type, substitutions: &mut Vec<Option<Type>>) {
    if let TypeKind::GenericVariable { index, local: true, .. } = declared.kind() {
        let index = *index as usize;
        if index < substitutions.len() && substitutions[index].is_none() {
            let bound = if declared.optional() {
                actual.non_optional()
            } else {
                actual.clone()
            };
            substitutions[index] = Some(bound);
        }
        return;
    }
    if declared.generic_args().len() == actual.generic_args().len() {
        for (declared_arg, actual_arg) in declared.generic_args().iter().zip(actual.generic_args())
        {
            unify(declared_arg, actual_arg, substitutions);
        }
    }
}

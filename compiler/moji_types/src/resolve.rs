//! Resolution of parsed type syntax against the registry.
//!
//! The declaration parser produces unresolved [`TypeExpr`] nodes; once a
//! package's names are all registered, the resolver turns them into
//! [`Type`] values, enforcing dynamism, generic arity and constraints.

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{glyphs, Ast, SourcePosition, StringPool, TypeExpr, TypeExprId, TypeExprKind};

use crate::{
    GenericParameter, PackageId, Type, TypeDynamism, TypeKind, TypeRegistry,
};

/// Generic parameters in scope at a resolution site.
#[derive(Copy, Clone, Default)]
pub struct ResolutionContext<'a> {
    /// The owning type's generic parameters.
    pub type_parameters: &'a [GenericParameter],
    /// The function's own generic parameters.
    pub function_parameters: &'a [GenericParameter],
}

/// Resolves type expressions for one package.
pub struct TypeResolver<'a> {
    pub registry: &'a TypeRegistry,
    pub package: PackageId,
    pub pool: &'a StringPool,
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a TypeRegistry, package: PackageId, pool: &'a StringPool) -> Self {
        TypeResolver {
            registry,
            package,
            pool,
        }
    }

    /// Resolve one type expression.
    pub fn resolve(
        &self,
        ast: &Ast,
        id: TypeExprId,
        context: ResolutionContext<'_>,
        dynamism: TypeDynamism,
    ) -> Result<Type, CompilerError> {
        let type_expr = ast.type_expr(id);
        let resolved = self.resolve_kind(ast, type_expr, context, dynamism)?;
        Ok(resolved.with_optional(type_expr.optional || resolved.optional()))
    }

    fn resolve_kind(
        &self,
        ast: &Ast,
        type_expr: &TypeExpr,
        context: ResolutionContext<'_>,
        dynamism: TypeDynamism,
    ) -> Result<Type, CompilerError> {
        let position = type_expr.position;
        match &type_expr.kind {
            TypeExprKind::Named {
                namespace,
                name,
                generic_args,
            } => self.resolve_named(
                ast,
                namespace.unwrap_or(glyphs::GLOBAL_NAMESPACE),
                *name,
                generic_args,
                context,
                dynamism,
                position,
            ),
            TypeExprKind::ThisType => {
                if !dynamism.contains(TypeDynamism::DYNAMIC_CLASS) {
                    return Err(CompilerError::new(
                        ErrorCode::E3004,
                        position,
                        "🐕 is not allowed in this position.",
                    ));
                }
                Ok(Type::self_type())
            }
            TypeExprKind::GenericVariable { name } => {
                if !dynamism.contains(TypeDynamism::GENERIC_VARS) {
                    return Err(CompilerError::new(
                        ErrorCode::E3004,
                        position,
                        "Generic type variables are not allowed in this position.",
                    ));
                }
                if let Some(index) = context
                    .function_parameters
                    .iter()
                    .position(|p| p.name == *name)
                {
                    return Ok(Type::generic_variable(index as u16, true, *name));
                }
                if let Some(index) = context
                    .type_parameters
                    .iter()
                    .position(|p| p.name == *name)
                {
                    return Ok(Type::generic_variable(index as u16, false, *name));
                }
                Err(CompilerError::new(
                    ErrorCode::E2001,
                    position,
                    format!(
                        "Could not find generic type variable {}.",
                        self.pool.get(*name)
                    ),
                ))
            }
            TypeExprKind::Callable {
                parameters,
                return_type,
            } => {
                let params = parameters
                    .iter()
                    .map(|p| self.resolve(ast, *p, context, dynamism))
                    .collect::<Result<Vec<_>, _>>()?;
                let ret = match return_type {
                    Some(ret) => self.resolve(ast, *ret, context, dynamism)?,
                    None => Type::nothingness(),
                };
                Ok(Type::callable(ret, params))
            }
            TypeExprKind::Error { enumeration, value } => {
                let enumeration = self.resolve(ast, *enumeration, context, dynamism)?;
                if !matches!(enumeration.kind(), TypeKind::Enum(_)) {
                    return Err(CompilerError::new(
                        ErrorCode::E3010,
                        position,
                        "The error tag type must be a 🦃.",
                    ));
                }
                let value = self.resolve(ast, *value, context, dynamism)?;
                Ok(Type::error(enumeration, value))
            }
            TypeExprKind::MultiProtocol { protocols } => {
                let mut resolved = Vec::with_capacity(protocols.len());
                for protocol in protocols {
                    let ty = self.resolve(ast, *protocol, context, dynamism)?;
                    if !matches!(ty.kind(), TypeKind::Protocol(_)) {
                        return Err(CompilerError::new(
                            ErrorCode::E3010,
                            position,
                            "🍱 may only contain protocols.",
                        ));
                    }
                    resolved.push(ty);
                }
                Ok(Type::multi_protocol(resolved))
            }
            // Only the function analyser can type the inner expression;
            // in signature positions the form is rejected outright.
            TypeExprKind::TypeFromValue { .. } => Err(CompilerError::new(
                ErrorCode::E3004,
                position,
                "⬜ is not allowed in this position.",
            )),
            TypeExprKind::Infer => Err(CompilerError::new(
                ErrorCode::E3009,
                position,
                "⚫ is not allowed in this position.",
            )),
        }
    }

    #[expect(clippy::too_many_arguments, reason = "Internal helper mirroring the variant payload")]
    fn resolve_named(
        &self,
        ast: &Ast,
        namespace: moji_ir::Glyph,
        name: moji_ir::Glyph,
        generic_args: &[TypeExprId],
        context: ResolutionContext<'_>,
        dynamism: TypeDynamism,
        position: SourcePosition,
    ) -> Result<Type, CompilerError> {
        let Some(raw) = self
            .registry
            .fetch_raw_type(self.package, namespace, name, false)
        else {
            return Err(CompilerError::new(
                ErrorCode::E2001,
                position,
                format!("Could not find type {name} in namespace {namespace}."),
            ));
        };
        let arity = self.declared_arity(&raw);
        if generic_args.len() != arity {
            return Err(CompilerError::new(
                ErrorCode::E3002,
                position,
                format!(
                    "Type {name} requires {arity} generic argument(s), but {} were supplied.",
                    generic_args.len()
                ),
            ));
        }
        if arity == 0 {
            return Ok(raw);
        }
        let args = generic_args
            .iter()
            .map(|arg| self.resolve(ast, *arg, context, dynamism))
            .collect::<Result<Vec<_>, _>>()?;
        self.check_constraints(&raw, &args, position)?;
        let applied = match raw.kind() {
            TypeKind::Class(id) => Type::class(*id, args),
            TypeKind::Protocol(id) => Type::protocol(*id, args),
            TypeKind::ValueType(id) => Type::value_type(*id, args),
            _ => raw.clone(),
        };
        Ok(applied.with_optional(raw.optional()))
    }

    fn declared_arity(&self, raw: &Type) -> usize {
        match raw.kind() {
            TypeKind::Class(id) => self.registry.class(*id).generic_parameters.len(),
            TypeKind::Protocol(id) => self.registry.protocol(*id).generic_parameters.len(),
            _ => 0,
        }
    }

    /// Check each generic argument against its declared constraint.
    fn check_constraints(
        &self,
        raw: &Type,
        args: &[Type],
        position: SourcePosition,
    ) -> Result<(), CompilerError> {
        let parameters: &[GenericParameter] = match raw.kind() {
            TypeKind::Class(id) => &self.registry.class(*id).generic_parameters,
            TypeKind::Protocol(id) => &self.registry.protocol(*id).generic_parameters,
            _ => return Ok(()),
        };
        for (arg, parameter) in args.iter().zip(parameters) {
            // Free variables are checked at their own declaration site.
            if arg.has_free_variables() {
                continue;
            }
            if !arg.compatible_to(&parameter.constraint, self.registry) {
                return Err(CompilerError::new(
                    ErrorCode::E3008,
                    position,
                    format!(
                        "Generic argument {} does not satisfy the constraint {}.",
                        arg.to_string(self.registry, self.pool, true),
                        parameter.constraint.to_string(self.registry, self.pool, true)
                    ),
                ));
            }
        }
        Ok(())
    }
}

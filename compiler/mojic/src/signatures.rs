//! Phase 2: signature resolution.
//!
//! Runs after every declaration in the package is registered. Resolves
//! generic constraints, superclasses, conformances, instance-variable
//! types and function signatures, then validates the structural
//! invariants: no inheritance cycles, 🏁 returns 🚂, and every required
//! initializer of a superclass is implemented by its subclasses.

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{glyphs, Ast};
use moji_types::{
    ClassId, CompilerSession, FunctionId, FunctionKind, FunctionModifiers, PackageId, ProtocolId,
    ResolutionContext, Type, TypeDynamism, TypeKind, TypeResolver,
};

/// Resolve every signature of a package. Errors are recorded and the
/// resolver continues with the next sibling declaration.
pub fn resolve_package_signatures(
    session: &mut CompilerSession,
    package: PackageId,
    decl_ast: &Ast,
) {
    let classes = session.registry.package(package).classes.clone();
    for class in classes.iter().copied() {
        if let Err(error) = resolve_class(session, package, decl_ast, class) {
            session.diagnostics.error(error);
        }
    }

    let protocols = session.registry.package(package).protocols.clone();
    for protocol in protocols {
        resolve_protocol(session, package, decl_ast, protocol);
    }

    for class in classes.iter().copied() {
        let functions = class_functions(session, class);
        for function in functions {
            if let Err(error) = resolve_function(session, package, decl_ast, function) {
                session.diagnostics.error(error);
            }
        }
    }

    for class in classes.iter().copied() {
        if let Err(error) = check_required_initializers(session, class) {
            session.diagnostics.error(error);
        }
    }

    if let Err(error) = check_starting_flag(session) {
        session.diagnostics.error(error);
    }
}

fn class_functions(session: &CompilerSession, class: ClassId) -> Vec<FunctionId> {
    let def = session.registry.class(class);
    def.methods
        .iter()
        .chain(&def.class_methods)
        .chain(&def.initializers)
        .copied()
        .collect()
}

fn resolve_class(
    session: &mut CompilerSession,
    package: PackageId,
    decl_ast: &Ast,
    class: ClassId,
) -> Result<(), CompilerError> {
    resolve_generic_constraints(session, package, decl_ast, class)?;

    // Superclass.
    let parsed_superclass = session.registry.class(class).parsed_superclass;
    if let Some(parsed) = parsed_superclass {
        let type_parameters = session.registry.class(class).generic_parameters.clone();
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext {
                    type_parameters: &type_parameters,
                    function_parameters: &[],
                },
                TypeDynamism::GENERIC_VARS,
            )?
        };
        let position = session.registry.class(class).position;
        if resolved.optional() {
            return Err(CompilerError::new(
                ErrorCode::E1007,
                position,
                "You cannot inherit from an 🍬.",
            ));
        }
        let TypeKind::Class(superclass) = resolved.kind() else {
            return Err(CompilerError::new(
                ErrorCode::E3010,
                position,
                "The superclass must be a class.",
            ));
        };
        {
            let def = session.registry.class_mut(class);
            def.superclass = Some(*superclass);
            def.super_generic_args = resolved.generic_args().to_vec();
            def.parsed_superclass = None;
        }
        if session.registry.has_inheritance_cycle(class) {
            let def = session.registry.class_mut(class);
            def.superclass = None;
            def.super_generic_args = Vec::new();
            return Err(CompilerError::new(
                ErrorCode::E4010,
                position,
                "Inheritance cycles are forbidden.",
            ));
        }
    }

    // Conformances.
    let parsed_protocols = std::mem::take(&mut session.registry.class_mut(class).parsed_protocols);
    let type_parameters = session.registry.class(class).generic_parameters.clone();
    for parsed in parsed_protocols {
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext {
                    type_parameters: &type_parameters,
                    function_parameters: &[],
                },
                TypeDynamism::GENERIC_VARS,
            )?
        };
        let position = decl_ast.type_expr(parsed).position;
        if resolved.optional() {
            return Err(CompilerError::new(
                ErrorCode::E4009,
                position,
                "A class cannot conform to an 🍬 protocol.",
            ));
        }
        if !matches!(resolved.kind(), TypeKind::Protocol(_)) {
            return Err(CompilerError::new(
                ErrorCode::E3010,
                position,
                "The given type is not a protocol.",
            ));
        }
        session.registry.class_mut(class).protocols.push(resolved);
    }

    // Instance variables.
    let count = session.registry.class(class).instance_variables.len();
    for index in 0..count {
        let parsed = session.registry.class(class).instance_variables[index].parsed;
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext {
                    type_parameters: &type_parameters,
                    function_parameters: &[],
                },
                TypeDynamism::GENERIC_VARS,
            )?
        };
        session.registry.class_mut(class).instance_variables[index].ty = Some(resolved);
    }
    Ok(())
}

fn resolve_generic_constraints(
    session: &mut CompilerSession,
    package: PackageId,
    decl_ast: &Ast,
    class: ClassId,
) -> Result<(), CompilerError> {
    let count = session.registry.class(class).generic_parameters.len();
    for index in 0..count {
        let Some(parsed) = session.registry.class(class).generic_parameters[index].parsed_constraint
        else {
            continue;
        };
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext::default(),
                TypeDynamism::empty(),
            )?
        };
        let parameter = &mut session.registry.class_mut(class).generic_parameters[index];
        parameter.constraint = resolved;
        parameter.parsed_constraint = None;
    }
    Ok(())
}

fn resolve_protocol(
    session: &mut CompilerSession,
    package: PackageId,
    decl_ast: &Ast,
    protocol: ProtocolId,
) {
    let methods = session.registry.protocol(protocol).methods.clone();
    let mut uses_self = false;
    for method in methods {
        match resolve_function(session, package, decl_ast, method) {
            Ok(()) => {
                let def = session.registry.function(method);
                uses_self |= def.return_type.mentions_self()
                    || def.parameters.iter().any(|p| p.ty.mentions_self());
            }
            Err(error) => session.diagnostics.error(error),
        }
    }
    session.registry.protocol_mut(protocol).uses_self = uses_self;
}

fn resolve_function(
    session: &mut CompilerSession,
    package: PackageId,
    decl_ast: &Ast,
    function: FunctionId,
) -> Result<(), CompilerError> {
    let owner = session.registry.function(function).owner.clone();
    let type_parameters = match owner.kind() {
        TypeKind::Class(id) => session.registry.class(*id).generic_parameters.clone(),
        TypeKind::Protocol(id) => session.registry.protocol(*id).generic_parameters.clone(),
        _ => Vec::new(),
    };
    let kind = session.registry.function(function).kind;
    let dynamism = match kind {
        FunctionKind::ClassMethod => TypeDynamism::GENERIC_VARS,
        _ => TypeDynamism::GENERIC_VARS | TypeDynamism::DYNAMIC_CLASS,
    };

    // Function-level generic constraints.
    let count = session.registry.function(function).generic_parameters.len();
    for index in 0..count {
        let Some(parsed) =
            session.registry.function(function).generic_parameters[index].parsed_constraint
        else {
            continue;
        };
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext {
                    type_parameters: &type_parameters,
                    function_parameters: &[],
                },
                TypeDynamism::GENERIC_VARS,
            )?
        };
        let parameter =
            &mut session.registry.function_mut(function).generic_parameters[index];
        parameter.constraint = resolved;
        parameter.parsed_constraint = None;
    }
    let function_parameters = session
        .registry
        .function(function)
        .generic_parameters
        .clone();

    // Parameters.
    let parameter_count = session.registry.function(function).parameters.len();
    for index in 0..parameter_count {
        let Some(parsed) = session.registry.function(function).parameters[index].parsed else {
            continue;
        };
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext {
                    type_parameters: &type_parameters,
                    function_parameters: &function_parameters,
                },
                dynamism,
            )?
        };
        session.registry.function_mut(function).parameters[index].ty = resolved;
    }

    // Return type.
    if kind == FunctionKind::Initializer {
        let can_fail = session
            .registry
            .function(function)
            .modifiers
            .contains(FunctionModifiers::CAN_RETURN_NOTHINGNESS);
        let return_type = if can_fail { owner.optionalized() } else { owner };
        session.registry.function_mut(function).return_type = return_type;
    } else if let Some(parsed) = session.registry.function(function).parsed_return {
        let resolved = {
            let resolver = TypeResolver::new(&session.registry, package, &session.pool);
            resolver.resolve(
                decl_ast,
                parsed,
                ResolutionContext {
                    type_parameters: &type_parameters,
                    function_parameters: &function_parameters,
                },
                dynamism,
            )?
        };
        session.registry.function_mut(function).return_type = resolved;
    }
    Ok(())
}

/// Every 🔑 initializer of the superclass chain must be implemented by
/// a subclass.
fn check_required_initializers(
    session: &CompilerSession,
    class: ClassId,
) -> Result<(), CompilerError> {
    let def = session.registry.class(class);
    let Some(superclass) = def.superclass else {
        return Ok(());
    };
    let required = session
        .registry
        .class(superclass)
        .required_initializer_names(&session.registry);
    for name in required {
        let implemented = def
            .initializers
            .iter()
            .any(|f| session.registry.function(*f).name == name);
        if !implemented {
            return Err(CompilerError::new(
                ErrorCode::E4003,
                def.position,
                format!("Required initializer {name} was not implemented."),
            ));
        }
    }
    Ok(())
}

fn check_starting_flag(session: &CompilerSession) -> Result<(), CompilerError> {
    let Some(flag) = session.registry.starting_flag else {
        return Ok(());
    };
    let def = session.registry.function(flag.function);
    if !def
        .return_type
        .compatible_to(&Type::integer(), &session.registry)
    {
        return Err(CompilerError::new(
            ErrorCode::E4005,
            def.position,
            format!("{} method must return {}.", glyphs::STARTING_FLAG, glyphs::INTEGER),
        ));
    }
    Ok(())
}

//! Boxing-layer synthesis.
//!
//! For every (protocol method, implementing function) pair whose boxed
//! ABI differs from the native ABI, a boxing layer is synthesised: a
//! function with the protocol's boxed convention whose body converts
//! each argument, calls the native function, and converts the result.
//! Callable thunks do the same for callables, applying the executor
//! instruction to the `this` context instead of a direct call. Both
//! variants are registered as ordinary functions and emitted uniformly.

use rustc_hash::FxHashSet;
use tracing::debug;

use moji_diagnostic::{CompilerError, Diagnostics, ErrorCode};
use moji_ir::{glyphs, SourcePosition};
use moji_types::{
    AccessLevel, BoxingInfo, ClassId, FunctionDef, FunctionId, FunctionKind, FunctionModifiers,
    MethodTable, Parameter, Type, TypeKind, TypeRegistry,
};

use crate::ThunkRequest;

/// Outcome of the synthesis pass.
#[derive(Default, Debug)]
pub struct SynthesisReport {
    /// Every synthesised function, in creation order.
    pub layers: Vec<FunctionId>,
}

/// Validate protocol conformances and synthesise every required boxing
/// layer and callable thunk.
pub fn synthesise_boxing_layers(
    registry: &mut TypeRegistry,
    diagnostics: &mut Diagnostics,
    thunks: &[ThunkRequest],
) -> SynthesisReport {
    let mut report = SynthesisReport::default();

    for class_index in 0..registry.class_count() as u32 {
        let class = ClassId(class_index);
        let conformances = registry.class(class).protocols.clone();
        for conformance in conformances {
            if let Err(error) = synthesise_for_conformance(registry, class, &conformance, &mut report)
            {
                diagnostics.error(error);
            }
        }
    }

    let mut seen: FxHashSet<(Type, Type)> = FxHashSet::default();
    for thunk in thunks {
        if !seen.insert((thunk.from.clone(), thunk.to.clone())) {
            continue;
        }
        report.layers.push(synthesise_callable_thunk(registry, thunk));
    }

    debug!(layers = report.layers.len(), "boxing-layer synthesis done");
    report
}

/// Check one class/protocol pair and synthesise layers for each method
/// whose ABI diverges.
fn synthesise_for_conformance(
    registry: &mut TypeRegistry,
    class: ClassId,
    conformance: &Type,
    report: &mut SynthesisReport,
) -> Result<(), CompilerError> {
    let TypeKind::Protocol(protocol) = conformance.kind() else {
        return Ok(());
    };
    let class_position = registry.class(class).position;
    let owner = class_self_type(registry, class);
    let protocol_context = conformance.resolve_on(&owner);
    let methods = registry.protocol(*protocol).methods.clone();

    for protocol_method in methods {
        let requirement = registry.function(protocol_method).clone();
        let Some((_, implementation)) =
            registry.class_member(class, requirement.name, MethodTable::Methods)
        else {
            return Err(CompilerError::new(
                ErrorCode::E4008,
                class_position,
                format!(
                    "Class {} does not implement {} required by the protocol.",
                    registry.class(class).name,
                    requirement.name
                ),
            ));
        };
        let implementation_def = registry.function(implementation).clone();

        check_signatures(registry, &requirement, &implementation_def, &protocol_context, &owner)?;

        let native_parameters: Vec<Type> = implementation_def
            .parameters
            .iter()
            .map(|parameter| parameter.ty.resolve_on(&owner))
            .collect();
        let native_return = implementation_def.return_type.resolve_on(&owner);
        let boxed_parameters: Vec<Type> =
            native_parameters.iter().map(Type::boxed_form).collect();
        let boxed_return = native_return.boxed_form();

        if boxed_parameters == native_parameters && boxed_return == native_return {
            continue;
        }

        let layer = registry.add_function(FunctionDef {
            name: implementation_def.name,
            kind: FunctionKind::BoxingLayer,
            owner: owner.clone(),
            package: implementation_def.package,
            position: SourcePosition::generated(),
            documentation: None,
            access: AccessLevel::Private,
            modifiers: FunctionModifiers::FINAL,
            generic_parameters: Vec::new(),
            parameters: implementation_def
                .parameters
                .iter()
                .zip(&boxed_parameters)
                .map(|(parameter, boxed)| Parameter {
                    name: parameter.name,
                    parsed: None,
                    ty: boxed.clone(),
                    escaping: parameter.escaping,
                    position: SourcePosition::generated(),
                })
                .collect(),
            parsed_return: None,
            return_type: boxed_return,
            body: None,
            variable_ceiling: 0,
            boxing: Some(BoxingInfo {
                destination: Some(implementation),
                destination_parameters: native_parameters,
                destination_return: native_return,
            }),
        });
        registry.class_mut(class).boxing_layers.push(layer);
        report.layers.push(layer);
    }
    Ok(())
}

/// Contravariant parameters, covariant return.
fn check_signatures(
    registry: &TypeRegistry,
    requirement: &FunctionDef,
    implementation: &FunctionDef,
    protocol_context: &Type,
    owner: &Type,
) -> Result<(), CompilerError> {
    if requirement.parameters.len() != implementation.parameters.len() {
        return Err(signature_mismatch(requirement, implementation));
    }
    for (required, provided) in requirement.parameters.iter().zip(&implementation.parameters) {
        let required = required.ty.resolve_on(protocol_context).resolve_on(owner);
        let provided = provided.ty.resolve_on(owner);
        if !required.compatible_to(&provided, registry) {
            return Err(signature_mismatch(requirement, implementation));
        }
    }
    let required_return = requirement
        .return_type
        .resolve_on(protocol_context)
        .resolve_on(owner);
    let provided_return = implementation.return_type.resolve_on(owner);
    if !provided_return.compatible_to(&required_return, registry) {
        return Err(signature_mismatch(requirement, implementation));
    }
    Ok(())
}

fn signature_mismatch(requirement: &FunctionDef, implementation: &FunctionDef) -> CompilerError {
    CompilerError::new(
        ErrorCode::E4008,
        implementation.position,
        format!(
            "The signature of {} does not match the protocol's declaration.",
            requirement.name
        ),
    )
}

/// A thunk that adapts a callable of type `from` to the ABI of `to` by
/// applying the executor instruction to its `this` context.
fn synthesise_callable_thunk(registry: &mut TypeRegistry, thunk: &ThunkRequest) -> FunctionId {
    let parameters: Vec<Parameter> = thunk
        .to
        .callable_parameters()
        .iter()
        .map(|ty| Parameter {
            name: moji_ir::Name(0),
            parsed: None,
            ty: ty.clone(),
            escaping: false,
            position: SourcePosition::generated(),
        })
        .collect();
    registry.add_function(FunctionDef {
        name: glyphs::CALLABLE_CALL,
        kind: FunctionKind::BoxingLayer,
        owner: thunk.from.clone(),
        package: moji_types::PackageId(0),
        position: SourcePosition::generated(),
        documentation: None,
        access: AccessLevel::Private,
        modifiers: FunctionModifiers::FINAL,
        generic_parameters: Vec::new(),
        parameters,
        parsed_return: None,
        return_type: thunk.to.callable_return().clone(),
        body: None,
        variable_ceiling: 0,
        boxing: Some(BoxingInfo {
            destination: None,
            destination_parameters: thunk.from.callable_parameters().to_vec(),
            destination_return: thunk.from.callable_return().clone(),
        }),
    })
}

/// The class applied with its own generic variables.
fn class_self_type(registry: &TypeRegistry, class: ClassId) -> Type {
    let args = registry
        .class(class)
        .generic_parameters
        .iter()
        .enumerate()
        .map(|(index, parameter)| Type::generic_variable(index as u16, false, parameter.name))
        .collect();
    Type::class(class, args)
}

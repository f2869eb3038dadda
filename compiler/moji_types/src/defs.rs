//! Registry-owned definitions and their index handles.
//!
//! Every named declaration lives in a registry arena; the rest of the
//! compiler refers to it through the `…Id` handles defined here.

use bitflags::bitflags;
use moji_ir::{Glyph, Name, SourcePosition, TokenRange, TypeExprId};

use crate::{Type, TypeRegistry};

/// Index of a class definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ClassId(pub u32);

/// Index of a protocol definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ProtocolId(pub u32);

/// Index of an enum definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EnumId(pub u32);

/// Index of a value-type definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ValueTypeId(pub u32);

/// Index of a function definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionId(pub u32);

/// Index of a package.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PackageId(pub u32);

/// Access level of a function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum AccessLevel {
    #[default]
    Public,
    /// 🔐 — the owning type and its subclasses.
    Protected,
    /// 🔒 — the owning type only.
    Private,
}

bitflags! {
    /// Function modifiers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FunctionModifiers: u8 {
        const FINAL = 1 << 0;
        const OVERRIDE = 1 << 1;
        const DEPRECATED = 1 << 2;
        const REQUIRED = 1 << 3;
        const CAN_RETURN_NOTHINGNESS = 1 << 4;
        const RETURNS_SELF = 1 << 5;
    }
}

/// What kind of procedure a [`FunctionDef`] is.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FunctionKind {
    Method,
    ClassMethod,
    Initializer,
    /// Declared inside a protocol; has no body.
    ProtocolMethod,
    /// Belongs to a value type's method table (built-in operators).
    ValueTypeMethod,
    /// Synthesised adapter between calling conventions.
    BoxingLayer,
}

/// One generic parameter with its constraint.
#[derive(Clone, PartialEq, Debug)]
pub struct GenericParameter {
    pub name: Name,
    /// Unresolved constraint syntax; `None` once resolution replaced it.
    pub parsed_constraint: Option<TypeExprId>,
    /// Resolved constraint; ⚪ until resolution ran.
    pub constraint: Type,
}

/// One function parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Parameter {
    pub name: Name,
    pub parsed: Option<TypeExprId>,
    /// Resolved type; ⚡ until resolution ran.
    pub ty: Type,
    /// The callee stores the argument beyond the call. Arguments passed
    /// here must be treated as escaping by the memory-flow analyser.
    pub escaping: bool,
    pub position: SourcePosition,
}

/// An instance variable of a class.
#[derive(Clone, PartialEq, Debug)]
pub struct InstanceVariable {
    pub name: Name,
    pub parsed: TypeExprId,
    pub ty: Option<Type>,
    pub position: SourcePosition,
}

/// Destination information of a synthesised boxing layer.
#[derive(Clone, PartialEq, Debug)]
pub struct BoxingInfo {
    /// The native function the layer forwards to; `None` for a callable
    /// thunk, which applies the executor instruction to its context.
    pub destination: Option<FunctionId>,
    pub destination_parameters: Vec<Type>,
    pub destination_return: Type,
}

/// A method, class method, initializer, protocol requirement or boxing
/// layer.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionDef {
    pub name: Glyph,
    pub kind: FunctionKind,
    /// The owning type; a structural callable type for callable thunks.
    pub owner: Type,
    pub package: PackageId,
    pub position: SourcePosition,
    pub documentation: Option<Name>,
    pub access: AccessLevel,
    pub modifiers: FunctionModifiers,
    pub generic_parameters: Vec<GenericParameter>,
    pub parameters: Vec<Parameter>,
    pub parsed_return: Option<TypeExprId>,
    /// Resolved return type; ⚡ when the function returns nothing.
    pub return_type: Type,
    /// Token range of the 🍇…🍉 body; `None` for protocol requirements
    /// and synthesised functions.
    pub body: Option<TokenRange>,
    /// Highest local-variable id reached during analysis; sizes the
    /// code generator's frame.
    pub variable_ceiling: u16,
    pub boxing: Option<BoxingInfo>,
}

impl FunctionDef {
    pub fn is_deprecated(&self) -> bool {
        self.modifiers.contains(FunctionModifiers::DEPRECATED)
    }

    pub fn is_required(&self) -> bool {
        self.modifiers.contains(FunctionModifiers::REQUIRED)
    }

    /// The callable type capturing this function produces.
    pub fn callable_type(&self) -> Type {
        Type::callable(
            self.return_type.clone(),
            self.parameters.iter().map(|p| p.ty.clone()).collect(),
        )
    }
}

/// Which member table of a class to search.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MethodTable {
    Methods,
    ClassMethods,
    Initializers,
}

/// A class.
#[derive(Clone, PartialEq, Debug)]
pub struct ClassDef {
    pub name: Glyph,
    pub namespace: Glyph,
    pub package: PackageId,
    pub position: SourcePosition,
    pub documentation: Option<Name>,
    pub exported: bool,
    pub generic_parameters: Vec<GenericParameter>,
    pub superclass: Option<ClassId>,
    /// Arguments the superclass was applied with, in terms of this
    /// class's generic variables.
    pub super_generic_args: Vec<Type>,
    /// Unresolved superclass syntax, consumed by resolution.
    pub parsed_superclass: Option<TypeExprId>,
    pub instance_variables: Vec<InstanceVariable>,
    /// Resolved conformances.
    pub protocols: Vec<Type>,
    pub parsed_protocols: Vec<TypeExprId>,
    pub methods: Vec<FunctionId>,
    pub class_methods: Vec<FunctionId>,
    pub initializers: Vec<FunctionId>,
    /// Synthesised adapters, filled by the boxing-layer pass.
    pub boxing_layers: Vec<FunctionId>,
}

impl ClassDef {
    /// Names of this class's 🔑 initializers.
    pub fn required_initializer_names(&self, registry: &TypeRegistry) -> Vec<Glyph> {
        self.initializers
            .iter()
            .filter(|id| registry.function(**id).is_required())
            .map(|id| registry.function(*id).name)
            .collect()
    }
}

/// A protocol.
#[derive(Clone, PartialEq, Debug)]
pub struct ProtocolDef {
    pub name: Glyph,
    pub namespace: Glyph,
    pub package: PackageId,
    pub position: SourcePosition,
    pub documentation: Option<Name>,
    pub exported: bool,
    pub generic_parameters: Vec<GenericParameter>,
    pub methods: Vec<FunctionId>,
    /// The protocol mentions 🐕 in a signature, so conformers cannot be
    /// boxed covariantly.
    pub uses_self: bool,
}

/// An enum.
#[derive(Clone, PartialEq, Debug)]
pub struct EnumDef {
    pub name: Glyph,
    pub namespace: Glyph,
    pub package: PackageId,
    pub position: SourcePosition,
    pub documentation: Option<Name>,
    pub exported: bool,
    /// Values in declaration order with their ordinals.
    pub values: Vec<(Glyph, i64)>,
}

impl EnumDef {
    pub fn value_of(&self, glyph: Glyph) -> Option<i64> {
        self.values
            .iter()
            .find(|(value, _)| *value == glyph)
            .map(|(_, ordinal)| *ordinal)
    }
}

/// A value type. The core registers these for the primitives so that
/// binary operators resolve as ordinary value-type methods.
#[derive(Clone, PartialEq, Debug)]
pub struct ValueTypeDef {
    pub name: Glyph,
    pub namespace: Glyph,
    pub package: PackageId,
    pub methods: Vec<FunctionId>,
}

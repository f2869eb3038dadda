//! The type representation.

use moji_ir::{glyphs, Name, StringPool};

use crate::{
    ClassId, EnumId, ProtocolId, TypeRegistry, ValueTypeId,
};

/// Variant of a [`Type`].
///
/// Named variants carry registry handles, never owned definitions;
/// structural variants (callable, error, multi-protocol) carry their
/// constituents in the type's generic-argument list or inline.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    /// Instance of a class.
    Class(ClassId),
    /// Instance of a value type.
    ValueType(ValueTypeId),
    /// A value seen through a protocol.
    Protocol(ProtocolId),
    /// A value seen through several protocols at once.
    MultiProtocol(Vec<Type>),
    /// An enum value.
    Enum(EnumId),
    /// A callable; generic argument 0 is the return type, the rest are
    /// the parameter types.
    Callable,
    /// A generic variable, resolved against a context type (or, when
    /// `local`, against call-site substitutions).
    GenericVariable {
        index: u16,
        /// Declared on a function rather than on a type.
        local: bool,
        /// Declared name, carried for rendering only.
        name: Name,
    },
    /// 🐕 in a signature: the fully applied receiver type.
    SelfType,
    // Primitives
    Integer,
    Double,
    Boolean,
    Symbol,
    Byte,
    /// The type of ⚡.
    Nothingness,
    /// ⚪ — top of the lattice; holds any boxed value.
    Something,
    /// 🔵 — top of the class-instance sub-lattice.
    Someobject,
    /// An error; generic argument 0 is the tag enum, 1 the success type.
    Error,
}

/// A Moji type: a variant plus the `optional`/`meta` modifiers and the
/// generic arguments.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Type {
    kind: TypeKind,
    optional: bool,
    meta: bool,
    generic_args: Vec<Type>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind,
            optional: false,
            meta: false,
            generic_args: Vec::new(),
        }
    }

    pub fn with_args(kind: TypeKind, generic_args: Vec<Type>) -> Self {
        Type {
            kind,
            optional: false,
            meta: false,
            generic_args,
        }
    }

    // Primitive constructors.

    pub fn integer() -> Self {
        Type::new(TypeKind::Integer)
    }

    pub fn double() -> Self {
        Type::new(TypeKind::Double)
    }

    pub fn boolean() -> Self {
        Type::new(TypeKind::Boolean)
    }

    pub fn symbol() -> Self {
        Type::new(TypeKind::Symbol)
    }

    pub fn byte() -> Self {
        Type::new(TypeKind::Byte)
    }

    pub fn nothingness() -> Self {
        Type::new(TypeKind::Nothingness)
    }

    pub fn something() -> Self {
        Type::new(TypeKind::Something)
    }

    pub fn someobject() -> Self {
        Type::new(TypeKind::Someobject)
    }

    pub fn self_type() -> Self {
        Type::new(TypeKind::SelfType)
    }

    pub fn class(id: ClassId, generic_args: Vec<Type>) -> Self {
        Type::with_args(TypeKind::Class(id), generic_args)
    }

    pub fn value_type(id: ValueTypeId, generic_args: Vec<Type>) -> Self {
        Type::with_args(TypeKind::ValueType(id), generic_args)
    }

    pub fn protocol(id: ProtocolId, generic_args: Vec<Type>) -> Self {
        Type::with_args(TypeKind::Protocol(id), generic_args)
    }

    pub fn multi_protocol(protocols: Vec<Type>) -> Self {
        Type::new(TypeKind::MultiProtocol(protocols))
    }

    pub fn enumeration(id: EnumId) -> Self {
        Type::new(TypeKind::Enum(id))
    }

    /// A callable `(parameters…) ➡ return_type`.
    pub fn callable(return_type: Type, parameters: Vec<Type>) -> Self {
        let mut args = Vec::with_capacity(parameters.len() + 1);
        args.push(return_type);
        args.extend(parameters);
        Type::with_args(TypeKind::Callable, args)
    }

    /// An `🚨 enumeration value` error type.
    pub fn error(enumeration: Type, value: Type) -> Self {
        Type::with_args(TypeKind::Error, vec![enumeration, value])
    }

    pub fn generic_variable(index: u16, local: bool, name: Name) -> Self {
        Type::new(TypeKind::GenericVariable { index, local, name })
    }

    // Accessors.

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn optional(&self) -> bool {
        self.optional
    }

    #[inline]
    pub fn meta(&self) -> bool {
        self.meta
    }

    #[inline]
    pub fn generic_args(&self) -> &[Type] {
        &self.generic_args
    }

    /// This type with the optional modifier set.
    #[must_use]
    pub fn optionalized(&self) -> Type {
        let mut ty = self.clone();
        ty.optional = true;
        ty
    }

    /// This type with the optional modifier cleared.
    #[must_use]
    pub fn non_optional(&self) -> Type {
        let mut ty = self.clone();
        ty.optional = false;
        ty
    }

    #[must_use]
    pub fn with_optional(&self, optional: bool) -> Type {
        let mut ty = self.clone();
        ty.optional = optional;
        ty
    }

    /// This type as a value (the meta type).
    #[must_use]
    pub fn as_meta(&self) -> Type {
        let mut ty = self.clone();
        ty.meta = true;
        ty
    }

    #[must_use]
    pub fn without_meta(&self) -> Type {
        let mut ty = self.clone();
        ty.meta = false;
        ty
    }

    pub fn class_id(&self) -> Option<ClassId> {
        match self.kind {
            TypeKind::Class(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_class_instance(&self) -> bool {
        matches!(self.kind, TypeKind::Class(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, TypeKind::Callable)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }

    pub fn is_nothingness(&self) -> bool {
        matches!(self.kind, TypeKind::Nothingness)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Integer
                | TypeKind::Double
                | TypeKind::Boolean
                | TypeKind::Symbol
                | TypeKind::Byte
        )
    }

    /// Return type of a callable (generic argument 0).
    pub fn callable_return(&self) -> &Type {
        debug_assert!(self.is_callable());
        &self.generic_args[0]
    }

    /// Parameter types of a callable (generic arguments 1…).
    pub fn callable_parameters(&self) -> &[Type] {
        debug_assert!(self.is_callable());
        &self.generic_args[1..]
    }

    /// Tag enum of an error type.
    pub fn error_enum(&self) -> &Type {
        debug_assert!(self.is_error());
        &self.generic_args[0]
    }

    /// Success type of an error type.
    pub fn error_value(&self) -> &Type {
        debug_assert!(self.is_error());
        &self.generic_args[1]
    }

    /// Whether values of this type are already reference-shaped, i.e.
    /// passed through a uniform pointer without boxing.
    pub fn is_reference_shaped(&self) -> bool {
        !self.optional
            && matches!(
                self.kind,
                TypeKind::Class(_) | TypeKind::Someobject | TypeKind::Something
            )
    }

    /// The boxed form of this type: reference-shaped types keep their
    /// shape, everything else travels as ⚪.
    ///
    /// Boxing layers are synthesised exactly where the boxed form of a
    /// signature differs from its native form.
    #[must_use]
    pub fn boxed_form(&self) -> Type {
        if self.is_reference_shaped() {
            self.clone()
        } else {
            Type::something()
        }
    }

    /// Whether this type contains an unresolved function-local generic
    /// variable; the analyser infers those from argument types.
    pub fn has_local_variables(&self) -> bool {
        match &self.kind {
            TypeKind::GenericVariable { local, .. } => *local,
            TypeKind::MultiProtocol(protocols) => {
                protocols.iter().any(Type::has_local_variables)
                    || self.generic_args.iter().any(Type::has_local_variables)
            }
            _ => self.generic_args.iter().any(Type::has_local_variables),
        }
    }

    /// Whether this type mentions 🐕 anywhere.
    pub fn mentions_self(&self) -> bool {
        match &self.kind {
            TypeKind::SelfType => true,
            TypeKind::MultiProtocol(protocols) => {
                protocols.iter().any(Type::mentions_self)
                    || self.generic_args.iter().any(Type::mentions_self)
            }
            _ => self.generic_args.iter().any(Type::mentions_self),
        }
    }

    /// Whether this type contains a free generic variable or 🐕.
    pub fn has_free_variables(&self) -> bool {
        match &self.kind {
            TypeKind::GenericVariable { .. } | TypeKind::SelfType => true,
            TypeKind::MultiProtocol(protocols) => {
                protocols.iter().any(Type::has_free_variables)
                    || self.generic_args.iter().any(Type::has_free_variables)
            }
            _ => self.generic_args.iter().any(Type::has_free_variables),
        }
    }

    /// Resolve this type on a context type: 🐕 becomes the context
    /// itself, and every non-local generic variable is replaced with its
    /// binding from the context's generic arguments.
    ///
    /// Idempotent on types without free variables.
    #[must_use]
    pub fn resolve_on(&self, context: &Type) -> Type {
        match &self.kind {
            TypeKind::SelfType => {
                let mut resolved = context.clone();
                resolved.optional |= self.optional;
                resolved.meta |= self.meta;
                resolved
            }
            TypeKind::GenericVariable { index, local, .. } if !*local => {
                match context.generic_args.get(*index as usize) {
                    Some(binding) => {
                        let mut resolved = binding.clone();
                        resolved.optional |= self.optional;
                        resolved.meta |= self.meta;
                        resolved
                    }
                    None => self.clone(),
                }
            }
            TypeKind::MultiProtocol(protocols) => {
                let mut resolved = self.clone();
                resolved.kind = TypeKind::MultiProtocol(
                    protocols.iter().map(|p| p.resolve_on(context)).collect(),
                );
                resolved
            }
            _ => {
                let mut resolved = self.clone();
                resolved.generic_args = self
                    .generic_args
                    .iter()
                    .map(|arg| arg.resolve_on(context))
                    .collect();
                resolved
            }
        }
    }

    /// Replace local (function-declared) generic variables with the
    /// given call-site substitutions.
    #[must_use]
    pub fn substitute_locals(&self, substitutions: &[Type]) -> Type {
        match &self.kind {
            TypeKind::GenericVariable { index, local, .. } if *local => {
                match substitutions.get(*index as usize) {
                    Some(binding) => {
                        let mut resolved = binding.clone();
                        resolved.optional |= self.optional;
                        resolved.meta |= self.meta;
                        resolved
                    }
                    None => self.clone(),
                }
            }
            TypeKind::MultiProtocol(protocols) => {
                let mut resolved = self.clone();
                resolved.kind = TypeKind::MultiProtocol(
                    protocols
                        .iter()
                        .map(|p| p.substitute_locals(substitutions))
                        .collect(),
                );
                resolved
            }
            _ => {
                let mut resolved = self.clone();
                resolved.generic_args = self
                    .generic_args
                    .iter()
                    .map(|arg| arg.substitute_locals(substitutions))
                    .collect();
                resolved
            }
        }
    }

    /// Human-readable rendering, used in diagnostics.
    ///
    /// With `qualified`, named types carry their namespace glyph.
    pub fn to_string(&self, registry: &TypeRegistry, pool: &StringPool, qualified: bool) -> String {
        let mut out = String::new();
        if self.optional {
            out.push(glyphs::OPTIONAL.0);
        }
        if self.meta {
            out.push(glyphs::TYPE_VALUE.0);
        }
        match &self.kind {
            TypeKind::Class(id) => {
                let def = registry.class(*id);
                if qualified {
                    out.push(def.namespace.0);
                }
                out.push(def.name.0);
                self.append_generic_args(&mut out, registry, pool, qualified);
            }
            TypeKind::ValueType(id) => {
                let def = registry.value_type(*id);
                if qualified {
                    out.push(def.namespace.0);
                }
                out.push(def.name.0);
                self.append_generic_args(&mut out, registry, pool, qualified);
            }
            TypeKind::Protocol(id) => {
                let def = registry.protocol(*id);
                if qualified {
                    out.push(def.namespace.0);
                }
                out.push(def.name.0);
                self.append_generic_args(&mut out, registry, pool, qualified);
            }
            TypeKind::MultiProtocol(protocols) => {
                out.push(glyphs::MULTI_PROTOCOL.0);
                for protocol in protocols {
                    out.push_str(&protocol.to_string(registry, pool, qualified));
                }
                out.push(glyphs::SERIES_END.0);
            }
            TypeKind::Enum(id) => {
                let def = registry.enumeration(*id);
                if qualified {
                    out.push(def.namespace.0);
                }
                out.push(def.name.0);
            }
            TypeKind::Callable => {
                out.push(glyphs::GRAPES.0);
                for parameter in self.callable_parameters() {
                    out.push_str(&parameter.to_string(registry, pool, qualified));
                }
                out.push(glyphs::RETURN_TYPE.0);
                out.push_str(&self.callable_return().to_string(registry, pool, qualified));
                out.push(glyphs::WATERMELON.0);
            }
            TypeKind::GenericVariable { name, .. } => {
                out.push_str(&pool.get(*name));
            }
            TypeKind::SelfType => out.push(glyphs::THIS_TYPE.0),
            TypeKind::Integer => out.push(glyphs::INTEGER.0),
            TypeKind::Double => out.push(glyphs::DOUBLE.0),
            TypeKind::Boolean => out.push(glyphs::BOOLEAN.0),
            TypeKind::Symbol => out.push(glyphs::SYMBOL.0),
            TypeKind::Byte => out.push(glyphs::BYTE.0),
            TypeKind::Nothingness => out.push(glyphs::NOTHINGNESS.0),
            TypeKind::Something => out.push(glyphs::SOMETHING.0),
            TypeKind::Someobject => out.push(glyphs::SOMEOBJECT.0),
            TypeKind::Error => {
                out.push(glyphs::ERROR_TYPE.0);
                out.push_str(&self.error_enum().to_string(registry, pool, qualified));
                out.push_str(&self.error_value().to_string(registry, pool, qualified));
            }
        }
        out
    }

    fn append_generic_args(
        &self,
        out: &mut String,
        registry: &TypeRegistry,
        pool: &StringPool,
        qualified: bool,
    ) {
        if self.generic_args.is_empty() {
            return;
        }
        out.push(glyphs::GENERICS.0);
        for arg in &self.generic_args {
            out.push_str(&arg.to_string(registry, pool, qualified));
        }
        out.push(glyphs::SERIES_END.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moji_ir::Name;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_optional_modifier() {
        let ty = Type::integer().optionalized();
        assert!(ty.optional());
        assert_eq!(ty.non_optional(), Type::integer());
    }

    #[test]
    fn test_callable_layout() {
        let callable = Type::callable(Type::boolean(), vec![Type::integer(), Type::double()]);
        assert_eq!(callable.callable_return(), &Type::boolean());
        assert_eq!(
            callable.callable_parameters(),
            &[Type::integer(), Type::double()]
        );
    }

    #[test]
    fn test_resolution_substitutes_context_bindings() {
        let var = Type::generic_variable(0, false, Name(0));
        let context = Type::class(ClassId(0), vec![Type::integer()]);
        assert_eq!(var.resolve_on(&context), Type::integer());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let var = Type::generic_variable(0, false, Name(0)).optionalized();
        let context = Type::class(ClassId(0), vec![Type::double()]);
        let once = var.resolve_on(&context);
        let twice = once.resolve_on(&context);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_self_resolves_to_context() {
        let context = Type::class(ClassId(3), vec![Type::symbol()]);
        assert_eq!(Type::self_type().resolve_on(&context), context);
    }

    #[test]
    fn test_boxed_form() {
        assert_eq!(Type::integer().boxed_form(), Type::something());
        let class = Type::class(ClassId(0), Vec::new());
        assert_eq!(class.boxed_form(), class);
        assert_eq!(class.optionalized().boxed_form(), Type::something());
    }
}

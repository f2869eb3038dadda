//! The compatibility relation.
//!
//! `A <: B` decides whether a value of type `A` may be used where `B` is
//! expected, before any implicit boxing. The semantic analyser calls
//! this first and only reaches for conversions when it fails.

use crate::{ClassId, ProtocolId, Type, TypeKind, TypeRegistry};

impl Type {
    /// Whether `self` is compatible to `to`.
    ///
    /// Generic variables must be resolved before the check; a free
    /// variable is only compatible to an identical variable.
    pub fn compatible_to(&self, to: &Type, registry: &TypeRegistry) -> bool {
        if self.meta() != to.meta() {
            return false;
        }
        // ⚪ is the top of the lattice: everything boxes into it,
        // optionals included.
        if matches!(to.kind(), TypeKind::Something) {
            return true;
        }
        if self.optional() && !to.optional() {
            return false;
        }
        // ⚡ inhabits every optional.
        if matches!(self.kind(), TypeKind::Nothingness) {
            return to.optional() || matches!(to.kind(), TypeKind::Nothingness);
        }
        match to.kind() {
            TypeKind::Someobject => {
                matches!(self.kind(), TypeKind::Class(_) | TypeKind::Someobject)
            }
            TypeKind::Class(target) => self.class_compatible(*target, to.generic_args(), registry),
            TypeKind::Protocol(target) => {
                self.conforms_to(*target, to.generic_args(), registry)
            }
            TypeKind::MultiProtocol(protocols) => protocols
                .iter()
                .all(|protocol| self.compatible_to(protocol, registry)),
            TypeKind::ValueType(target) => match self.kind() {
                TypeKind::ValueType(id) => id == target && self.generic_args() == to.generic_args(),
                _ => false,
            },
            TypeKind::Enum(target) => matches!(self.kind(), TypeKind::Enum(id) if id == target),
            TypeKind::Callable => self.callable_compatible(to, registry),
            TypeKind::Error => self.error_compatible(to, registry),
            TypeKind::GenericVariable { index, local, .. } => matches!(
                self.kind(),
                TypeKind::GenericVariable { index: i, local: l, .. } if i == index && l == local
            ),
            TypeKind::SelfType => matches!(self.kind(), TypeKind::SelfType),
            TypeKind::Integer
            | TypeKind::Double
            | TypeKind::Boolean
            | TypeKind::Symbol
            | TypeKind::Byte
            | TypeKind::Nothingness => {
                std::mem::discriminant(self.kind()) == std::mem::discriminant(to.kind())
            }
            // Handled above.
            TypeKind::Something => true,
        }
    }

    /// Classes are compatible up the inheritance chain. Generic
    /// positions are invariant, so at the matching ancestor the
    /// arguments must be equal.
    fn class_compatible(&self, target: ClassId, target_args: &[Type], registry: &TypeRegistry) -> bool {
        let TypeKind::Class(id) = self.kind() else {
            return false;
        };
        let mut current = Type::class(*id, self.generic_args().to_vec());
        loop {
            let Some(current_id) = current.class_id() else {
                return false;
            };
            if current_id == target {
                return current.generic_args() == target_args;
            }
            let def = registry.class(current_id);
            let Some(superclass) = def.superclass else {
                return false;
            };
            let args = def
                .super_generic_args
                .iter()
                .map(|arg| arg.resolve_on(&current))
                .collect();
            current = Type::class(superclass, args);
        }
    }

    /// Whether this type (or one of its supertypes) conforms to the
    /// protocol, with equal generic arguments.
    fn conforms_to(
        &self,
        target: ProtocolId,
        target_args: &[Type],
        registry: &TypeRegistry,
    ) -> bool {
        match self.kind() {
            TypeKind::Protocol(id) => *id == target && self.generic_args() == target_args,
            TypeKind::MultiProtocol(protocols) => protocols
                .iter()
                .any(|protocol| protocol.conforms_to(target, target_args, registry)),
            TypeKind::Class(id) => {
                let mut current = Type::class(*id, self.generic_args().to_vec());
                loop {
                    let Some(current_id) = current.class_id() else {
                        return false;
                    };
                    let def = registry.class(current_id);
                    let conforms = def.protocols.iter().any(|conformance| {
                        let resolved = conformance.resolve_on(&current);
                        matches!(resolved.kind(), TypeKind::Protocol(p) if *p == target)
                            && resolved.generic_args() == target_args
                    });
                    if conforms {
                        return true;
                    }
                    let Some(superclass) = def.superclass else {
                        return false;
                    };
                    let args = def
                        .super_generic_args
                        .iter()
                        .map(|arg| arg.resolve_on(&current))
                        .collect();
                    current = Type::class(superclass, args);
                }
            }
            _ => false,
        }
    }

    /// Callables compare contravariant in parameters and covariant in
    /// return.
    fn callable_compatible(&self, to: &Type, registry: &TypeRegistry) -> bool {
        if !self.is_callable() {
            return false;
        }
        let from_params = self.callable_parameters();
        let to_params = to.callable_parameters();
        if from_params.len() != to_params.len() {
            return false;
        }
        let params_ok = from_params
            .iter()
            .zip(to_params)
            .all(|(from, to)| to.compatible_to(from, registry));
        params_ok && self.callable_return().compatible_to(to.callable_return(), registry)
    }

    /// Errors require matching tag enums; the success type is covariant.
    fn error_compatible(&self, to: &Type, registry: &TypeRegistry) -> bool {
        if !self.is_error() {
            return false;
        }
        self.error_enum() == to.error_enum()
            && self.error_value().compatible_to(to.error_value(), registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassDef, EnumDef};
    use moji_ir::{glyphs, Glyph, SourcePosition, StringPool};

    fn test_class(registry: &mut TypeRegistry, name: char, superclass: Option<ClassId>) -> ClassId {
        let package = registry.load_package(moji_ir::Name(0));
        registry.add_class(ClassDef {
            name: Glyph(name),
            namespace: glyphs::GLOBAL_NAMESPACE,
            package,
            position: SourcePosition::generated(),
            documentation: None,
            exported: false,
            generic_parameters: Vec::new(),
            superclass,
            super_generic_args: Vec::new(),
            parsed_superclass: None,
            instance_variables: Vec::new(),
            protocols: Vec::new(),
            parsed_protocols: Vec::new(),
            methods: Vec::new(),
            class_methods: Vec::new(),
            initializers: Vec::new(),
            boxing_layers: Vec::new(),
        })
    }

    #[test]
    fn test_reflexivity() {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        for ty in [
            Type::integer(),
            Type::double(),
            Type::boolean(),
            Type::something(),
            Type::someobject(),
            Type::nothingness(),
            Type::integer().optionalized(),
            Type::callable(Type::integer(), vec![Type::double()]),
        ] {
            assert!(ty.compatible_to(&ty, &registry), "{ty:?} not reflexive");
        }
    }

    #[test]
    fn test_primitives_only_compatible_to_themselves() {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        assert!(!Type::integer().compatible_to(&Type::double(), &registry));
        assert!(Type::integer().compatible_to(&Type::something(), &registry));
        assert!(!Type::integer().compatible_to(&Type::someobject(), &registry));
    }

    #[test]
    fn test_class_chain_transitivity() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let a = test_class(&mut registry, '🅰', None);
        let b = test_class(&mut registry, '🅱', Some(a));
        let c = test_class(&mut registry, '🆎', Some(b));
        let ta = Type::class(a, Vec::new());
        let tb = Type::class(b, Vec::new());
        let tc = Type::class(c, Vec::new());
        assert!(tc.compatible_to(&tb, &registry));
        assert!(tb.compatible_to(&ta, &registry));
        assert!(tc.compatible_to(&ta, &registry));
        assert!(!ta.compatible_to(&tc, &registry));
    }

    #[test]
    fn test_optional_rules() {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        let opt = Type::integer().optionalized();
        // T <: 🍬T, 🍬T <: 🍬T, 🍬T not <: T
        assert!(Type::integer().compatible_to(&opt, &registry));
        assert!(opt.compatible_to(&opt, &registry));
        assert!(!opt.compatible_to(&Type::integer(), &registry));
        // ⚡ <: 🍬U for all U
        assert!(Type::nothingness().compatible_to(&opt, &registry));
        assert!(!Type::nothingness().compatible_to(&Type::integer(), &registry));
    }

    #[test]
    fn test_callable_variance() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let a = test_class(&mut registry, '🅰', None);
        let b = test_class(&mut registry, '🅱', Some(a));
        let ta = Type::class(a, Vec::new());
        let tb = Type::class(b, Vec::new());
        // (A) ➡ B  <:  (B) ➡ A : contravariant params, covariant return.
        let from = Type::callable(tb.clone(), vec![ta.clone()]);
        let to = Type::callable(ta, vec![tb]);
        assert!(from.compatible_to(&to, &registry));
        assert!(!to.compatible_to(&from, &registry));
    }

    #[test]
    fn test_error_tags_must_match() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let package = registry.load_package(pool.pool("_"));
        let mk_enum = |registry: &mut TypeRegistry, name: char| {
            registry.add_enum(EnumDef {
                name: Glyph(name),
                namespace: glyphs::GLOBAL_NAMESPACE,
                package,
                position: SourcePosition::generated(),
                documentation: None,
                exported: false,
                values: Vec::new(),
            })
        };
        let e1 = Type::enumeration(mk_enum(&mut registry, '🚦'));
        let e2 = Type::enumeration(mk_enum(&mut registry, '🚧'));
        let err1 = Type::error(e1.clone(), Type::integer());
        let err1_again = Type::error(e1, Type::integer());
        let err2 = Type::error(e2, Type::integer());
        assert!(err1.compatible_to(&err1_again, &registry));
        assert!(!err1.compatible_to(&err2, &registry));
    }

    #[test]
    fn test_generic_positions_are_invariant() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let a = test_class(&mut registry, '🅰', None);
        let b = test_class(&mut registry, '🅱', Some(a));
        let holder = test_class(&mut registry, '📥', None);
        let of_a = Type::class(holder, vec![Type::class(a, Vec::new())]);
        let of_b = Type::class(holder, vec![Type::class(b, Vec::new())]);
        assert!(of_a.compatible_to(&of_a, &registry));
        assert!(!of_b.compatible_to(&of_a, &registry));
        assert!(of_b.compatible_to(&of_b, &registry));
    }
}

//! Property tests for the type lattice.

use proptest::prelude::*;

use moji_ir::StringPool;
use moji_types::{Type, TypeRegistry};

/// Arbitrary closed types (no free variables, bounded nesting).
fn arb_type() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        Just(Type::integer()),
        Just(Type::double()),
        Just(Type::boolean()),
        Just(Type::symbol()),
        Just(Type::byte()),
        Just(Type::nothingness()),
        Just(Type::something()),
        Just(Type::someobject()),
    ];
    leaf.prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|ty| ty.optionalized()),
            (inner.clone(), proptest::collection::vec(inner, 0..3))
                .prop_map(|(ret, params)| Type::callable(ret, params)),
        ]
    })
}

proptest! {
    /// Every closed type is compatible to itself.
    #[test]
    fn compatibility_is_reflexive(ty in arb_type()) {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        prop_assert!(ty.compatible_to(&ty, &registry));
    }

    /// Every closed type is compatible to ⚪.
    #[test]
    fn something_is_the_top(ty in arb_type()) {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        prop_assert!(ty.compatible_to(&Type::something(), &registry));
    }

    /// Resolution is idempotent on closed types.
    #[test]
    fn resolution_is_idempotent(ty in arb_type(), context in arb_type()) {
        let once = ty.resolve_on(&context);
        let twice = once.resolve_on(&context);
        prop_assert_eq!(once, twice);
    }

    /// T <: 🍬T for every closed type.
    #[test]
    fn optionals_widen(ty in arb_type()) {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        prop_assert!(ty.compatible_to(&ty.optionalized(), &registry));
    }
}

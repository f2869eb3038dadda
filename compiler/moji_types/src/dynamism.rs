//! Type dynamism.

use bitflags::bitflags;

bitflags! {
    /// Which type-variable forms a type-parse site accepts.
    ///
    /// A class-method signature, for example, may not mention the
    /// dynamic class type, because there is no instance to dispatch on.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeDynamism: u8 {
        /// Generic type variables may appear.
        const GENERIC_VARS = 1 << 0;
        /// 🐕 as the dynamic class type may appear.
        const DYNAMIC_CLASS = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_accepts_nothing() {
        let dynamism = TypeDynamism::empty();
        assert!(!dynamism.contains(TypeDynamism::GENERIC_VARS));
        assert!(!dynamism.contains(TypeDynamism::DYNAMIC_CLASS));
    }
}

//! Common-type inference for collection literals.

use moji_ir::SourcePosition;
use moji_diagnostic::Diagnostics;

use crate::{Type, TypeRegistry};

/// Finds the common type of a collection's elements.
///
/// The common type is the join in the compatibility lattice. When two
/// elements are incomparable the finder falls back to ⚪ and
/// `common_type` emits a warning.
#[derive(Default, Debug)]
pub struct CommonTypeFinder {
    first_found: bool,
    ambiguous: bool,
    common: Option<Type>,
}

impl CommonTypeFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tell the finder about the type of another element.
    pub fn add_type(&mut self, ty: &Type, registry: &TypeRegistry) {
        if !self.first_found {
            self.first_found = true;
            self.common = Some(ty.clone());
            return;
        }
        let Some(common) = &self.common else {
            return;
        };
        if ty.compatible_to(common, registry) {
            return;
        }
        if common.compatible_to(ty, registry) {
            self.common = Some(ty.clone());
            return;
        }
        self.ambiguous = true;
        self.common = None;
    }

    /// The common type; warns at `position` if it was ambiguous.
    pub fn common_type(
        &self,
        position: SourcePosition,
        diagnostics: &mut Diagnostics,
    ) -> Type {
        if self.ambiguous {
            diagnostics.warn(
                position,
                "The common type of the collection's elements is ambiguous; assuming ⚪.",
            );
        }
        self.common.clone().unwrap_or_else(Type::something)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moji_ir::StringPool;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_type_wins() {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        let mut diagnostics = Diagnostics::new();
        let mut finder = CommonTypeFinder::new();
        finder.add_type(&Type::integer(), &registry);
        finder.add_type(&Type::integer(), &registry);
        let common = finder.common_type(SourcePosition::generated(), &mut diagnostics);
        assert_eq!(common, Type::integer());
        assert!(diagnostics.diagnostics().is_empty());
    }

    #[test]
    fn test_incomparable_types_warn_and_yield_something() {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        let mut diagnostics = Diagnostics::new();
        let mut finder = CommonTypeFinder::new();
        finder.add_type(&Type::integer(), &registry);
        finder.add_type(&Type::boolean(), &registry);
        let common = finder.common_type(SourcePosition::generated(), &mut diagnostics);
        assert_eq!(common, Type::something());
        assert_eq!(diagnostics.diagnostics().len(), 1);
    }

    #[test]
    fn test_empty_collection_defaults_to_something() {
        let pool = StringPool::new();
        let _registry = TypeRegistry::bootstrap(&pool);
        let mut diagnostics = Diagnostics::new();
        let finder = CommonTypeFinder::new();
        let common = finder.common_type(SourcePosition::generated(), &mut diagnostics);
        assert_eq!(common, Type::something());
    }
}

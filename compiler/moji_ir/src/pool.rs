//! Deduplicating string pool.
//!
//! Pools strings by value equality and hands out stable [`Name`] indices.
//! The pool is shared between the external lexer (which interns variable
//! names and string literals while tokenizing) and every compiler phase;
//! the code generator addresses string constants by their pool index.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

/// Value-deduplicating string pool with stable indices.
#[derive(Default)]
pub struct StringPool {
    inner: RwLock<PoolInner>,
}

#[derive(Default)]
struct PoolInner {
    strings: Vec<Box<str>>,
    indices: FxHashMap<Box<str>, Name>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool a string, returning its stable index.
    ///
    /// Pooling the same string twice returns the same `Name`.
    pub fn pool(&self, string: &str) -> Name {
        if let Some(&name) = self.inner.read().indices.get(string) {
            return name;
        }
        let mut inner = self.inner.write();
        // Re-check: another caller may have pooled it between the locks.
        if let Some(&name) = inner.indices.get(string) {
            return name;
        }
        let name = Name(u32::try_from(inner.strings.len()).unwrap_or(u32::MAX));
        let boxed: Box<str> = string.into();
        inner.strings.push(boxed.clone());
        inner.indices.insert(boxed, name);
        name
    }

    /// Resolve a `Name` back to its string.
    ///
    /// Returns the empty string for a `Name` that was never handed out by
    /// this pool.
    pub fn get(&self, name: Name) -> String {
        self.inner
            .read()
            .strings
            .get(name.index())
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    /// Number of pooled strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pooling_deduplicates() {
        let pool = StringPool::new();
        let a = pool.pool("savings");
        let b = pool.pool("savings");
        let c = pool.pool("rate");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_round_trip() {
        let pool = StringPool::new();
        let name = pool.pool("balance");
        assert_eq!(pool.get(name), "balance");
    }
}

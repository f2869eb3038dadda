//! Pooled string handle.

use std::fmt;

/// Index of a pooled string.
///
/// Two `Name`s are equal iff the strings they were pooled from are equal;
/// comparison never touches the pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Name(pub u32);

impl Name {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

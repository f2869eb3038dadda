//! Error codes for all compiler diagnostics.
//!
//! Each code is a unique identifier whose first digit names the phase
//! that produced it. Lexing is external and owns no codes here.

use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E1xxx: parse errors
/// - E2xxx: name errors
/// - E3xxx: type errors
/// - E4xxx: semantic errors
/// - E5xxx: memory-flow errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Parse errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Duplicate attribute
    E1002,
    /// Attribute disallowed here
    E1003,
    /// Missing block terminator
    E1004,
    /// Invalid or duplicate package version
    E1005,
    /// Reserved glyph used as a name
    E1006,
    /// Optional type where a new type name is required
    E1007,
    /// Require-binary not allowed in the default package
    E1008,

    // Name errors (E2xxx)
    /// Unknown type
    E2001,
    /// Type already defined
    E2002,
    /// Variable not found
    E2003,
    /// Unknown package
    E2004,
    /// Duplicate variable in the same scope
    E2005,

    // Type errors (E3xxx)
    /// Incompatible types
    E3001,
    /// Generic argument count mismatch
    E3002,
    /// Optional type not allowed here
    E3003,
    /// Generic variable not allowed here
    E3004,
    /// Method not found
    E3005,
    /// 🚥 applied to a non-error value
    E3006,
    /// 🍺 applied to a non-optional, non-error value
    E3007,
    /// Generic argument violates its constraint
    E3008,
    /// Generic argument could not be inferred
    E3009,
    /// Superclass or conformance target has the wrong kind
    E3010,
    /// Argument count mismatch
    E3011,

    // Semantic errors (E4xxx)
    /// Access violation
    E4001,
    /// Duplicate 🏁 method
    E4002,
    /// Required initializer not implemented
    E4003,
    /// 🚨 outside a function returning an error type
    E4004,
    /// 🏁 method must return 🚂
    E4005,
    /// Variable used before initialization
    E4006,
    /// Assignment to a frozen variable
    E4007,
    /// Protocol method not implemented by a conforming type
    E4008,
    /// Class conforms to an optional protocol
    E4009,
    /// Inheritance cycle
    E4010,
    /// 🍎 in an initializer not marked 🍬
    E4011,
    /// 🐿 outside a subclass method
    E4012,

    // Memory-flow errors (E5xxx)
    /// Ownership taken from the same binding twice
    E5001,
    /// Borrowing value used as the sole source of a return
    E5002,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_matches_debug() {
        assert_eq!(ErrorCode::E3001.to_string(), "E3001");
    }
}

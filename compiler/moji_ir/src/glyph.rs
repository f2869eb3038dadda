//! Emoji glyphs.
//!
//! Moji's identifiers are single emoji codepoints. `Glyph` wraps the
//! codepoint; the `glyphs` module names every codepoint the grammar
//! dispatches on.

use std::fmt;

/// A single emoji codepoint used as an identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Glyph(pub char);

impl Glyph {
    /// Check whether this glyph may not be used to name a method.
    ///
    /// Grammar glyphs (statement heads, literal delimiters, operators)
    /// are reserved; declaring a method under one of them would make the
    /// body grammar ambiguous.
    pub fn is_reserved(self) -> bool {
        RESERVED.contains(&self)
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Glyph({})", self.0)
    }
}

/// Named glyph constants for every codepoint the grammar knows.
pub mod glyphs {
    use super::Glyph;

    // Blocks
    pub const GRAPES: Glyph = Glyph('🍇');
    pub const WATERMELON: Glyph = Glyph('🍉');

    // Top-level declarations
    pub const PACKAGE: Glyph = Glyph('📦');
    pub const PROTOCOL: Glyph = Glyph('🐊');
    pub const ENUM: Glyph = Glyph('🦃');
    pub const REQUIRE_BINARY: Glyph = Glyph('📻');
    pub const VERSION: Glyph = Glyph('🔮');
    pub const EXTENSION: Glyph = Glyph('🐋');
    pub const CLASS: Glyph = Glyph('🐇');
    pub const LOAD_FILE: Glyph = Glyph('📜');
    pub const EXPORTED: Glyph = Glyph('🌍');

    // Class members
    pub const INSTANCE_VARIABLE: Glyph = Glyph('🍰');
    pub const METHOD: Glyph = Glyph('🐖');
    pub const INITIALIZER: Glyph = Glyph('🐈');

    // Attributes
    pub const DEPRECATED: Glyph = Glyph('⚠');
    pub const FINAL: Glyph = Glyph('🔏');
    pub const OVERRIDE: Glyph = Glyph('✒');
    pub const REQUIRED: Glyph = Glyph('🔑');
    pub const CAN_RETURN_NOTHINGNESS: Glyph = Glyph('🍬');
    pub const PRIVATE: Glyph = Glyph('🔒');
    pub const PROTECTED: Glyph = Glyph('🔐');
    pub const PUBLIC: Glyph = Glyph('🔓');

    // Types
    pub const OPTIONAL: Glyph = Glyph('🍬');
    pub const GLOBAL_NAMESPACE: Glyph = Glyph('🔴');
    pub const GENERICS: Glyph = Glyph('🐚');
    pub const SERIES_END: Glyph = Glyph('🍆');
    pub const RETURN_TYPE: Glyph = Glyph('➡');
    pub const THIS_TYPE: Glyph = Glyph('🐕');
    pub const ERROR_TYPE: Glyph = Glyph('🚨');
    pub const MULTI_PROTOCOL: Glyph = Glyph('🍱');
    pub const TYPE_FROM_VALUE: Glyph = Glyph('⬜');
    pub const INFER: Glyph = Glyph('⚫');

    // Built-in type names
    pub const INTEGER: Glyph = Glyph('🚂');
    pub const DOUBLE: Glyph = Glyph('💯');
    pub const BOOLEAN: Glyph = Glyph('👌');
    pub const SYMBOL: Glyph = Glyph('🔣');
    pub const BYTE: Glyph = Glyph('💧');
    pub const SOMETHING: Glyph = Glyph('⚪');
    pub const SOMEOBJECT: Glyph = Glyph('🔵');
    pub const NOTHINGNESS: Glyph = Glyph('⚡');

    // Statements
    pub const ASSIGN: Glyph = Glyph('🍮');
    pub const FROZEN: Glyph = Glyph('🍦');
    pub const DECLARE: Glyph = Glyph('🍰');
    pub const RETURN: Glyph = Glyph('🍎');
    pub const RAISE: Glyph = Glyph('🚨');
    pub const REPEAT_WHILE: Glyph = Glyph('🔁');
    pub const FOR_IN: Glyph = Glyph('🔂');
    pub const IF: Glyph = Glyph('🍊');
    pub const ELSE_IF: Glyph = Glyph('🍋');
    pub const ELSE: Glyph = Glyph('🍓');
    pub const UNSAFE: Glyph = Glyph('☣');
    pub const ERROR_HANDLER: Glyph = Glyph('🥑');

    // Expressions
    pub const TRUE: Glyph = Glyph('👍');
    pub const FALSE: Glyph = Glyph('👎');
    pub const NO_VALUE: Glyph = Glyph('⚡');
    pub const LIST: Glyph = Glyph('🍨');
    pub const DICTIONARY: Glyph = Glyph('🍯');
    pub const CONCATENATE: Glyph = Glyph('🍪');
    pub const THIS: Glyph = Glyph('🐕');
    pub const SUPER: Glyph = Glyph('🐿');
    pub const TYPE_METHOD: Glyph = Glyph('🍩');
    pub const INITIALIZATION: Glyph = Glyph('🔷');
    pub const CALLABLE_CALL: Glyph = Glyph('⁉');
    pub const CAPTURE_METHOD: Glyph = Glyph('🌶');
    pub const CAST: Glyph = Glyph('🔲');
    pub const IS_ERROR: Glyph = Glyph('🚥');
    pub const UNWRAP: Glyph = Glyph('🍺');
    pub const META_TYPE: Glyph = Glyph('⬛');
    pub const TYPE_VALUE: Glyph = Glyph('🔳');
    pub const SIZE_OF: Glyph = Glyph('⚖');
    pub const CONDITIONAL_ASSIGNMENT: Glyph = Glyph('➡');
    pub const END_ARGUMENTS: Glyph = Glyph('❗');

    // Operators
    pub const ADD: Glyph = Glyph('➕');
    pub const SUBTRACT: Glyph = Glyph('➖');
    pub const MULTIPLY: Glyph = Glyph('✖');
    pub const DIVIDE: Glyph = Glyph('➗');
    pub const REMAINDER: Glyph = Glyph('🚮');
    pub const LESS: Glyph = Glyph('◀');
    pub const GREATER: Glyph = Glyph('▶');
    pub const EQUAL: Glyph = Glyph('😛');
    pub const AND: Glyph = Glyph('🎊');
    pub const OR: Glyph = Glyph('🎉');

    // Program entry
    pub const STARTING_FLAG: Glyph = Glyph('🏁');
}

/// Glyphs that cannot name a method.
const RESERVED: &[Glyph] = &[
    glyphs::GRAPES,
    glyphs::WATERMELON,
    glyphs::ASSIGN,
    glyphs::FROZEN,
    glyphs::DECLARE,
    glyphs::RETURN,
    glyphs::REPEAT_WHILE,
    glyphs::FOR_IN,
    glyphs::IF,
    glyphs::ELSE_IF,
    glyphs::ELSE,
    glyphs::LIST,
    glyphs::DICTIONARY,
    glyphs::CONCATENATE,
    glyphs::UNWRAP,
    glyphs::GENERICS,
    glyphs::SERIES_END,
    glyphs::THIS,
    glyphs::OPTIONAL,
    glyphs::END_ARGUMENTS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_glyphs() {
        assert!(glyphs::GRAPES.is_reserved());
        assert!(glyphs::RETURN.is_reserved());
        assert!(!Glyph('🐟').is_reserved());
    }

    #[test]
    fn test_display() {
        assert_eq!(glyphs::CLASS.to_string(), "🐇");
    }
}

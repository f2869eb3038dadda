//! Source positions.

use crate::Name;

/// A line/column position inside a source file.
///
/// The external lexer stamps every token with its position; the parser
/// copies positions onto AST nodes and declarations, and diagnostics
/// render them as `<file>:<line>:<col>`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourcePosition {
    /// 1-based line.
    pub line: u32,
    /// 1-based column, counted in codepoints.
    pub column: u32,
    /// Pooled path of the file.
    pub file: Name,
}

impl SourcePosition {
    pub const fn new(line: u32, column: u32, file: Name) -> Self {
        SourcePosition { line, column, file }
    }

    /// Position for synthesised nodes that have no source location.
    pub const fn generated() -> Self {
        SourcePosition {
            line: 0,
            column: 0,
            file: Name(0),
        }
    }
}

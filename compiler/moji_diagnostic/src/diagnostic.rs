//! Diagnostic values.

use std::fmt;

use moji_ir::{SourcePosition, StringPool};

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A compile error carried out-of-band as a value.
///
/// Interrupts the declaration being processed; the driver records it and
/// moves to the next sibling declaration.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompilerError {
    pub code: ErrorCode,
    pub position: SourcePosition,
    pub message: String,
}

impl CompilerError {
    pub fn new(code: ErrorCode, position: SourcePosition, message: impl Into<String>) -> Self {
        CompilerError {
            code,
            position,
            message: message.into(),
        }
    }
}

/// One reported diagnostic.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub position: SourcePosition,
    pub message: String,
}

impl Diagnostic {
    /// Render as `<file>:<line>:<col>: <message>`, with a `warning:`
    /// prefix for warnings.
    pub fn render(&self, pool: &StringPool) -> String {
        let file = pool.get(self.position.file);
        match self.severity {
            Severity::Error => format!(
                "{file}:{}:{}: {}",
                self.position.line, self.position.column, self.message
            ),
            Severity::Warning => format!(
                "{file}:{}:{}: warning: {}",
                self.position.line, self.position.column, self.message
            ),
        }
    }
}

impl From<CompilerError> for Diagnostic {
    fn from(error: CompilerError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: Some(error.code),
            position: error.position,
            message: error.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moji_ir::Name;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_error() {
        let pool = StringPool::new();
        let file = pool.pool("ledger.moji");
        let diag: Diagnostic = CompilerError::new(
            ErrorCode::E3001,
            SourcePosition::new(4, 11, file),
            "🚂 is not compatible to 💯.",
        )
        .into();
        assert_eq!(diag.render(&pool), "ledger.moji:4:11: 🚂 is not compatible to 💯.");
    }

    #[test]
    fn test_render_warning_prefix() {
        let pool = StringPool::new();
        let diag = Diagnostic {
            severity: Severity::Warning,
            code: None,
            position: SourcePosition::new(1, 1, Name(0)),
            message: "shadows previous local variable".into(),
        };
        assert!(diag.render(&pool).contains("warning:"));
    }
}

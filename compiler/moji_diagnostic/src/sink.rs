//! Diagnostic collection.

use moji_ir::{SourcePosition, StringPool};

use crate::{CompilerError, Diagnostic, Severity};

/// Ordered sink for every diagnostic of a compilation.
///
/// Errors interrupt the declaration that raised them but not the run;
/// after all phases, `has_errors` decides whether code is emitted.
#[derive(Default, Debug)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a compile error.
    pub fn error(&mut self, error: CompilerError) {
        self.error_count += 1;
        self.diagnostics.push(error.into());
    }

    /// Record a warning. Warnings never abort anything.
    pub fn warn(&mut self, position: SourcePosition, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: None,
            position,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render every diagnostic, one per line, in emission order.
    pub fn render(&self, pool: &StringPool) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.render(pool));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use moji_ir::Name;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_only_errors() {
        let mut sink = Diagnostics::new();
        sink.warn(SourcePosition::new(1, 1, Name(0)), "recommend 🍦");
        assert!(!sink.has_errors());
        sink.error(CompilerError::new(
            ErrorCode::E2003,
            SourcePosition::new(2, 1, Name(0)),
            "variable not found",
        ));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics().len(), 2);
    }
}

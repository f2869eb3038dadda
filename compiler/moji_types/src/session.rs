//! The compiler session.

use moji_diagnostic::Diagnostics;
use moji_ir::StringPool;

use crate::TypeRegistry;

/// Options for one compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Keep analysing sibling functions after a per-function error so
    /// one run reports every independent failure.
    pub best_effort: bool,
    /// Name of the main package.
    pub main_package: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            best_effort: true,
            main_package: "_".to_string(),
        }
    }
}

/// All mutable state of one compilation.
///
/// Passed explicitly to every phase; the compiler has no process-wide
/// singletons. The registry and pool must not gain new type names after
/// declaration registration completed.
pub struct CompilerSession {
    pub registry: TypeRegistry,
    pub pool: StringPool,
    pub diagnostics: Diagnostics,
    pub options: CompileOptions,
}

impl CompilerSession {
    pub fn new(options: CompileOptions) -> Self {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        CompilerSession {
            registry,
            pool,
            diagnostics: Diagnostics::new(),
            options,
        }
    }
}

impl Default for CompilerSession {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

//! Diagnostics for the Moji compiler.
//!
//! Compile failures are `CompilerError` values, never panics: a failing
//! operation returns `Result<T, CompilerError>` and the driver records
//! the error in the [`Diagnostics`] sink, then continues with the next
//! sibling declaration so one run reports every independent failure.
//! Warnings never abort.

mod diagnostic;
mod error_code;
mod sink;

pub use diagnostic::{CompilerError, Diagnostic, Severity};
pub use error_code::ErrorCode;
pub use sink::Diagnostics;

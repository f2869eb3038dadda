//! The Moji compiler driver.
//!
//! Orchestrates the front-end pipeline for one program. Within one
//! package the phases run strictly in order: (1) type names registered,
//! (2) signatures resolved, (3) bodies parsed, (4) semantic analysis,
//! (5) memory flow, (6) boxing-layer synthesis, (7) code generation.
//! Downstream phases never observe a type whose declaration has not
//! completed phase 2.
//!
//! Lexing, file I/O and the CLI stay outside: the embedding process
//! lexes source text into [`moji_ir::TokenStream`]s (re-entering for 📜
//! directives) and supplies a [`moji_codegen::Builder`] for emission.

mod pipeline;
mod report;
mod signatures;

pub use pipeline::{CompiledFunction, CompiledPackage, Compiler};
pub use report::report_package;

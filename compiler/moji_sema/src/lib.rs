//! Semantic analysis for the Moji compiler.
//!
//! One [`FunctionAnalyser`] instance runs per function and drives a
//! depth-first walk over the body, annotating every expression with its
//! resulting type (with implicit boxing nodes inserted where calling
//! conventions demand them). The [`SemanticScoper`] tracks variable
//! initialization, freezing and shadowing; the memory-flow analyser
//! labels every expression with an escape category; and the boxing-layer
//! synthesiser generates the adapters that reconcile native, protocol
//! and callable calling conventions.

mod analysis;
mod analyser;
mod boxing;
mod expectation;
mod memory_flow;
mod scoper;

pub use analysis::{
    CallTarget, DispatchKind, FunctionAnalysis, MFFlowCategory, ResolvedVariableUse, ThunkRequest,
};
pub use analyser::{analyse_function, FunctionAnalyser};
pub use boxing::{synthesise_boxing_layers, SynthesisReport};
pub use expectation::TypeExpectation;
pub use memory_flow::analyse_memory_flow;
pub use scoper::{ResolvedVariable, Scope, SemanticScopeStats, SemanticScoper, Variable, VariableId};

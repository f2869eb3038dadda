//! Analysis result tables.
//!
//! The AST arenas stay free of type-system dependencies; everything the
//! analyser learns is stored here, keyed by node id, and consumed by the
//! memory-flow pass and the code generator.

use rustc_hash::{FxHashMap, FxHashSet};

use moji_ir::{ExprId, StmtId};
use moji_types::{FunctionId, Type};

use crate::VariableId;

/// How a resolved call is dispatched.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DispatchKind {
    /// Direct call to a known function.
    Direct,
    /// Class virtual-table lookup.
    VirtualTable,
    /// Protocol dispatch-table lookup.
    ProtocolTable,
    /// Callable-executor instruction.
    CallableExecutor,
}

/// Resolution of one call site.
#[derive(Clone, Debug)]
pub struct CallTarget {
    pub function: FunctionId,
    pub dispatch: DispatchKind,
}

/// Resolution of one variable access.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ResolvedVariableUse {
    pub id: VariableId,
    pub from_instance: bool,
}

/// Escape category of an expression's value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MFFlowCategory {
    /// The value is only inspected; the callee keeps no reference.
    Borrowing,
    /// The value is stored beyond the expression.
    Escaping,
    /// The value leaves the function through the return channel.
    Returned,
}

/// A callable adapter the analyser found necessary.
#[derive(Clone, Debug)]
pub struct ThunkRequest {
    pub expr: ExprId,
    pub from: Type,
    pub to: Type,
}

/// Everything the semantic and memory-flow passes learned about one
/// function body.
#[derive(Default, Debug)]
pub struct FunctionAnalysis {
    /// Exact resulting type of every expression.
    pub expr_types: FxHashMap<ExprId, Type>,
    /// Values that live only until the enclosing statement ends; the
    /// code generator releases them.
    pub temporarily_scoped: FxHashSet<ExprId>,
    pub call_targets: FxHashMap<ExprId, CallTarget>,
    pub variable_uses: FxHashMap<ExprId, ResolvedVariableUse>,
    /// Assignment and declaration statements to their frame slots.
    pub assignment_targets: FxHashMap<StmtId, ResolvedVariableUse>,
    /// Conditional-assignment and handler bindings per expression.
    pub binding_targets: FxHashMap<ExprId, ResolvedVariableUse>,
    /// Ordinal of an enum value produced by 🔷.
    pub enum_values: FxHashMap<ExprId, i64>,
    /// Escape category per expression, filled by the memory-flow pass.
    pub flow: FxHashMap<ExprId, MFFlowCategory>,
    /// Callable thunks to synthesise.
    pub pending_thunks: Vec<ThunkRequest>,
    /// Frame size for the code generator.
    pub variable_ceiling: u16,
}

impl FunctionAnalysis {
    /// The recorded type of an expression. Analysis always records a
    /// type before anything queries it.
    pub fn expr_type(&self, id: ExprId) -> Type {
        self.expr_types.get(&id).cloned().unwrap_or_else(Type::nothingness)
    }

    pub fn flow_category(&self, id: ExprId) -> MFFlowCategory {
        self.flow.get(&id).copied().unwrap_or(MFFlowCategory::Borrowing)
    }
}

//! Statement nodes.

use crate::{ast::TypeExprId, BlockId, ExprId, Name, SourcePosition};

/// A statement node.
#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: SourcePosition,
}

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    Expression(ExprId),
    /// A nested 🍇…🍉 block.
    Block(BlockId),
    /// `🍎 expr`
    Return(ExprId),
    /// `🚨 expr`; only valid in functions returning an error type.
    Raise(ExprId),
    /// `🔁 cond 🍇…🍉`
    RepeatWhile {
        condition: ExprId,
        body: BlockId,
    },
    /// `🔂 name iteratee 🍇…🍉`
    ForIn {
        variable: Name,
        iteratee: ExprId,
        body: BlockId,
    },
    /// `🍊 … (🍋 …)* (🍓 …)?`
    If {
        branches: Vec<IfBranch>,
        else_block: Option<BlockId>,
    },
    /// `☣ 🍇…🍉`
    Unsafe(BlockId),
    /// `🥑 name value 🍇…🍉 (🍓 🍇…🍉)?` — binds the success value of an
    /// error-typed expression in the first block.
    ErrorHandler {
        variable: Name,
        value: ExprId,
        body: BlockId,
        else_block: Option<BlockId>,
    },
    /// `🍰 name Type` — declared but uninitialized.
    VariableDeclaration {
        name: Name,
        type_expr: TypeExprId,
    },
    /// `🍮 name expr` — declares a mutable variable on first use.
    VariableAssignment {
        name: Name,
        value: ExprId,
    },
    /// `🍦 name expr`
    ConstantBind {
        name: Name,
        value: ExprId,
    },
}

/// One 🍊/🍋 arm of an if statement.
#[derive(Clone, PartialEq, Debug)]
pub struct IfBranch {
    pub condition: ExprId,
    pub block: BlockId,
}

//! Flat-arena AST.
//!
//! Nodes are stored in contiguous arrays inside [`Ast`] and referenced by
//! index handles. The node set is closed-world: expressions, statements
//! and type-expressions are tagged sums, and later phases walk them with
//! exhaustive matches. Analysis annotations (resulting types, flow
//! categories, resolved variables) live in side tables owned by the
//! semantic crates, keyed by the ids defined here.

mod expr;
mod stmt;
mod ty;

pub use expr::{BoxKind, Expr, ExprKind};
pub use stmt::{IfBranch, Stmt, StmtKind};
pub use ty::{TypeExpr, TypeExprKind};

use crate::SourcePosition;

/// Index of an expression node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExprId(pub u32);

/// Index of a statement node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StmtId(pub u32);

/// Index of a block.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BlockId(pub u32);

/// Index of a type-expression node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeExprId(pub u32);

/// A 🍇…🍉 block.
#[derive(Clone, PartialEq, Debug)]
pub struct Block {
    pub stmts: Vec<StmtId>,
    pub position: SourcePosition,
}

/// Arena holding one tree's nodes.
///
/// Declaration parsing uses one arena per package for signature
/// type-expressions; body parsing allocates one arena per function.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Ast {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    blocks: Vec<Block>,
    type_exprs: Vec<TypeExpr>,
    /// The body block of a function arena; unset for declaration arenas.
    pub root: Option<BlockId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, position: SourcePosition) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, position });
        id
    }

    pub fn alloc_stmt(&mut self, kind: StmtKind, position: SourcePosition) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, position });
        id
    }

    pub fn alloc_block(&mut self, stmts: Vec<StmtId>, position: SourcePosition) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block { stmts, position });
        id
    }

    pub fn alloc_type_expr(&mut self, type_expr: TypeExpr) -> TypeExprId {
        let id = TypeExprId(self.type_exprs.len() as u32);
        self.type_exprs.push(type_expr);
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    #[inline]
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.0 as usize]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.0 as usize]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    #[inline]
    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.type_exprs[id.0 as usize]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_arena_hands_out_sequential_ids() {
        let mut ast = Ast::new();
        let a = ast.alloc_expr(ExprKind::IntegerLiteral(1), SourcePosition::generated());
        let b = ast.alloc_expr(ExprKind::IntegerLiteral(2), SourcePosition::generated());
        assert_eq!(a, ExprId(0));
        assert_eq!(b, ExprId(1));
        assert_eq!(ast.expr(b).kind, ExprKind::IntegerLiteral(2));
    }
}

//! Memory-flow analysis.
//!
//! Runs over an annotated AST and labels every expression with an
//! escape category. The contract with the code generator: an object
//! that flows only into `Borrowing` positions in its creator's scope
//! may be stack-allocated; anything else must live on the heap.

use rustc_hash::FxHashSet;

use moji_diagnostic::{CompilerError, Diagnostics, ErrorCode};
use moji_ir::{Ast, BlockId, BoxKind, ExprId, ExprKind, StmtKind};
use moji_types::TypeRegistry;

use crate::{FunctionAnalysis, MFFlowCategory, VariableId};

/// Label every expression of an analysed function body.
pub fn analyse_memory_flow(
    registry: &TypeRegistry,
    ast: &Ast,
    analysis: &mut FunctionAnalysis,
    diagnostics: &mut Diagnostics,
) {
    let mut analyser = MFFunctionAnalyser {
        registry,
        ast,
        analysis,
        diagnostics,
        taken: FxHashSet::default(),
    };
    if let Some(root) = ast.root {
        analyser.analyse_block(root);
    }
}

struct MFFunctionAnalyser<'a> {
    registry: &'a TypeRegistry,
    ast: &'a Ast,
    analysis: &'a mut FunctionAnalysis,
    diagnostics: &'a mut Diagnostics,
    taken: FxHashSet<VariableId>,
}

impl MFFunctionAnalyser<'_> {
    fn analyse_block(&mut self, block: BlockId) {
        for stmt in self.ast.block(block).stmts.clone() {
            self.analyse_stmt(stmt);
        }
    }

    fn analyse_stmt(&mut self, stmt: moji_ir::StmtId) {
        match &self.ast.stmt(stmt).kind {
            StmtKind::Expression(expr) => self.visit(*expr, MFFlowCategory::Borrowing),
            StmtKind::Return(expr) | StmtKind::Raise(expr) => {
                self.visit(*expr, MFFlowCategory::Returned);
            }
            StmtKind::RepeatWhile { condition, body } => {
                self.visit(*condition, MFFlowCategory::Borrowing);
                self.analyse_block(*body);
            }
            StmtKind::ForIn {
                iteratee, body, ..
            } => {
                self.visit(*iteratee, MFFlowCategory::Borrowing);
                self.analyse_block(*body);
            }
            StmtKind::If {
                branches,
                else_block,
            } => {
                for branch in branches {
                    self.visit(branch.condition, MFFlowCategory::Borrowing);
                    self.analyse_block(branch.block);
                }
                if let Some(else_block) = else_block {
                    self.analyse_block(*else_block);
                }
            }
            StmtKind::Unsafe(block) => self.analyse_block(*block),
            StmtKind::ErrorHandler {
                value,
                body,
                else_block,
                ..
            } => {
                // The success value is moved into the binding.
                self.visit(*value, MFFlowCategory::Escaping);
                self.analyse_block(*body);
                if let Some(else_block) = else_block {
                    self.analyse_block(*else_block);
                }
            }
            StmtKind::VariableDeclaration { .. } => {}
            StmtKind::VariableAssignment { value, .. }
            | StmtKind::ConstantBind { value, .. } => {
                // Stored values outlive the expression.
                self.visit(*value, MFFlowCategory::Escaping);
            }
            StmtKind::Block(block) => self.analyse_block(*block),
        }
    }

    fn visit(&mut self, expr: ExprId, category: MFFlowCategory) {
        self.analysis.flow.insert(expr, category);
        match &self.ast.expr(expr).kind {
            ExprKind::IntegerLiteral(_)
            | ExprKind::DoubleLiteral(_)
            | ExprKind::BooleanLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::SymbolLiteral(_)
            | ExprKind::NothingnessLiteral
            | ExprKind::This => {}
            ExprKind::ListLiteral(elements) | ExprKind::Concatenate(elements) => {
                for element in elements {
                    self.visit(*element, MFFlowCategory::Escaping);
                }
            }
            ExprKind::DictionaryLiteral(pairs) => {
                for (key, value) in pairs {
                    self.visit(*key, MFFlowCategory::Escaping);
                    self.visit(*value, MFFlowCategory::Escaping);
                }
            }
            ExprKind::GetVariable { .. } => {
                if category == MFFlowCategory::Returned {
                    self.take(expr);
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.visit(*receiver, MFFlowCategory::Borrowing);
                self.visit_arguments(expr, args);
            }
            ExprKind::SuperMethodCall { args, .. }
            | ExprKind::TypeMethodCall { args, .. }
            | ExprKind::Initialization { args, .. } => {
                self.visit_arguments(expr, args);
            }
            ExprKind::CallableCall { callee, args } => {
                self.visit(*callee, MFFlowCategory::Borrowing);
                for arg in args {
                    self.visit(*arg, MFFlowCategory::Borrowing);
                }
            }
            ExprKind::CaptureMethod { receiver, .. } => {
                // The callable keeps the receiver alive.
                self.visit(*receiver, MFFlowCategory::Escaping);
            }
            ExprKind::BinaryOperator { left, right, .. } => {
                self.visit(*left, MFFlowCategory::Borrowing);
                self.visit(*right, MFFlowCategory::Borrowing);
            }
            ExprKind::Cast { value, .. } => {
                // The cast result aliases its operand.
                self.visit(*value, category);
            }
            ExprKind::IsError { value } => {
                self.visit(*value, MFFlowCategory::Borrowing);
            }
            ExprKind::Unwrap { value } => {
                // The unwrapped value is handed to the surrounding
                // expression.
                self.take(*value);
                self.visit(*value, MFFlowCategory::Escaping);
            }
            ExprKind::MetaTypeInstantiation { .. }
            | ExprKind::TypeAsValue { .. }
            | ExprKind::SizeOf { .. } => {}
            ExprKind::ConditionalAssignment { value, .. } => {
                self.visit(*value, MFFlowCategory::Escaping);
            }
            ExprKind::Box { kind, value } => {
                // Boxing copies the value into the box, which may
                // outlive the creator's scope.
                let inner = match kind {
                    BoxKind::ToSomething
                    | BoxKind::ToProtocol
                    | BoxKind::ToSomeobject
                    | BoxKind::CallableThunk => MFFlowCategory::Escaping,
                };
                self.visit(*value, inner);
            }
        }
    }

    /// Call arguments borrow unless the parameter is marked escaping.
    fn visit_arguments(&mut self, call: ExprId, args: &[ExprId]) {
        let parameters = self
            .analysis
            .call_targets
            .get(&call)
            .map(|target| self.registry.function(target.function).parameters.clone())
            .unwrap_or_default();
        for (index, arg) in args.iter().enumerate() {
            let escaping = parameters
                .get(index)
                .is_some_and(|parameter| parameter.escaping);
            let category = if escaping {
                MFFlowCategory::Escaping
            } else {
                MFFlowCategory::Borrowing
            };
            self.visit(*arg, category);
        }
    }

    /// Record a transfer of ownership away from a local variable. A
    /// second take on the same local is a bug.
    fn take(&mut self, expr: ExprId) {
        let Some(use_) = self.analysis.variable_uses.get(&expr) else {
            return;
        };
        if use_.from_instance {
            return;
        }
        let id = use_.id;
        if !self.taken.insert(id) {
            let position = self.ast.expr(expr).position;
            self.diagnostics.error(CompilerError::new(
                ErrorCode::E5001,
                position,
                "Ownership of this variable was already taken.",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moji_ir::SourcePosition;
    use moji_types::Type;
    use pretty_assertions::assert_eq;

    /// 🍎 x — the returned variable is labelled `Returned` and taken.
    #[test]
    fn test_return_labels_returned() {
        let pool = moji_ir::StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        let mut diagnostics = Diagnostics::new();
        let mut ast = Ast::new();
        let position = SourcePosition::generated();
        let name = pool.pool("x");
        let get = ast.alloc_expr(ExprKind::GetVariable { name }, position);
        let ret = ast.alloc_stmt(StmtKind::Return(get), position);
        let root = ast.alloc_block(vec![ret], position);
        ast.root = Some(root);

        let mut analysis = FunctionAnalysis::default();
        analysis.expr_types.insert(get, Type::integer());
        analysis.variable_uses.insert(
            get,
            crate::analysis::ResolvedVariableUse {
                id: VariableId(0),
                from_instance: false,
            },
        );
        analyse_memory_flow(&registry, &ast, &mut analysis, &mut diagnostics);
        assert_eq!(analysis.flow_category(get), MFFlowCategory::Returned);
        assert!(!diagnostics.has_errors());
    }

    /// Unwrapping the same local twice is a double take.
    #[test]
    fn test_double_take_is_reported() {
        let pool = moji_ir::StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        let mut diagnostics = Diagnostics::new();
        let mut ast = Ast::new();
        let position = SourcePosition::generated();
        let name = pool.pool("x");

        let mut stmts = Vec::new();
        let mut gets = Vec::new();
        for _ in 0..2 {
            let get = ast.alloc_expr(ExprKind::GetVariable { name }, position);
            let unwrap = ast.alloc_expr(ExprKind::Unwrap { value: get }, position);
            stmts.push(ast.alloc_stmt(StmtKind::Expression(unwrap), position));
            gets.push(get);
        }
        let root = ast.alloc_block(stmts, position);
        ast.root = Some(root);

        let mut analysis = FunctionAnalysis::default();
        for get in gets {
            analysis.variable_uses.insert(
                get,
                crate::analysis::ResolvedVariableUse {
                    id: VariableId(0),
                    from_instance: false,
                },
            );
        }
        analyse_memory_flow(&registry, &ast, &mut analysis, &mut diagnostics);
        assert!(diagnostics.has_errors());
    }
}

//! Function emission.
//!
//! Walks one analysed AST and drives the external builder. Every
//! statement emits its instructions and then releases the values the
//! analyser flagged temporarily-scoped.

use tracing::trace;

use moji_ir::{Ast, BlockId, BoxKind, ExprId, ExprKind, StmtId, StmtKind};
use moji_sema::{DispatchKind, FunctionAnalysis, ResolvedVariableUse, VariableId};
use moji_types::{FunctionId, Type, TypeRegistry};

use crate::{Builder, Op, TypeHelper, ValueId};

/// Generate one function with a body.
pub fn generate_function(
    registry: &TypeRegistry,
    function: FunctionId,
    ast: &Ast,
    analysis: &FunctionAnalysis,
    helper: &mut TypeHelper,
    builder: &mut dyn Builder,
) {
    let def = registry.function(function);
    trace!(ceiling = analysis.variable_ceiling, "generating function");
    let mut generator = FnCodeGenerator {
        registry,
        ast,
        analysis,
        helper,
        builder,
        return_type: def.return_type.clone(),
        locals: vec![None; analysis.variable_ceiling as usize],
        temporaries: Vec::new(),
    };
    if let Some(root) = ast.root {
        generator.store_parameters(registry.function(function).parameters.len());
        generator.generate_block(root);
    }
    generator.builder.create_ret_void();
}

struct FnCodeGenerator<'a> {
    registry: &'a TypeRegistry,
    ast: &'a Ast,
    analysis: &'a FunctionAnalysis,
    helper: &'a mut TypeHelper,
    builder: &'a mut dyn Builder,
    return_type: Type,
    locals: Vec<Option<ValueId>>,
    temporaries: Vec<ValueId>,
}

impl FnCodeGenerator<'_> {
    /// Spill the parameters into their frame slots.
    fn store_parameters(&mut self, count: usize) {
        for index in 0..count {
            let value = self.builder.parameter(index as u32);
            let ty = Type::something();
            let slot = self.ensure_slot(VariableId(index as u16), &ty);
            self.builder.create_store(slot, value);
        }
    }

    fn generate_block(&mut self, block: BlockId) {
        for stmt in &self.ast.block(block).stmts {
            self.generate_stmt(*stmt);
            self.release_temporary_objects();
        }
    }

    /// Release every value flagged temporarily-scoped in the statement
    /// just emitted.
    fn release_temporary_objects(&mut self) {
        for value in std::mem::take(&mut self.temporaries) {
            self.builder.create_instruction(Op::Release, &[value]);
        }
    }

    fn generate_stmt(&mut self, stmt: StmtId) {
        match &self.ast.stmt(stmt).kind {
            StmtKind::Expression(expr) => {
                self.generate_expr(*expr);
            }
            StmtKind::Return(expr) => {
                let value = self.generate_expr(*expr);
                // A uniform return channel boxes optionals and errors.
                let value = if self.return_type.is_error() {
                    self.builder.create_instruction(Op::ErrorWrap, &[value])
                } else if self.return_type.optional() {
                    self.builder.create_instruction(Op::OptionalWrap, &[value])
                } else {
                    value
                };
                self.builder.create_ret(value);
            }
            StmtKind::Raise(expr) => {
                let tag = self.generate_expr(*expr);
                let boxed = self.builder.create_instruction(Op::ErrorFromEnum, &[tag]);
                self.builder.create_ret(boxed);
            }
            StmtKind::RepeatWhile { condition, body } => {
                let condition_block = self.builder.create_block();
                let body_block = self.builder.create_block();
                let after_block = self.builder.create_block();
                self.builder.create_br(condition_block);
                self.builder.position_at_end(condition_block);
                let value = self.generate_expr(*condition);
                self.builder.create_cond_br(value, body_block, after_block);
                self.builder.position_at_end(body_block);
                self.generate_block(*body);
                self.builder.create_br(condition_block);
                self.builder.position_at_end(after_block);
            }
            StmtKind::ForIn {
                iteratee, body, ..
            } => {
                let iterated = self.generate_expr(*iteratee);
                let iterator = self
                    .builder
                    .create_instruction(Op::IteratorNew, &[iterated]);
                let condition_block = self.builder.create_block();
                let body_block = self.builder.create_block();
                let after_block = self.builder.create_block();
                self.builder.create_br(condition_block);
                self.builder.position_at_end(condition_block);
                let has_next = self
                    .builder
                    .create_instruction(Op::IteratorHasNext, &[iterator]);
                self.builder.create_cond_br(has_next, body_block, after_block);
                self.builder.position_at_end(body_block);
                let element = self
                    .builder
                    .create_instruction(Op::IteratorNext, &[iterator]);
                if let Some(target) = self.analysis.assignment_targets.get(&stmt) {
                    let slot = self.ensure_slot(target.id, &Type::something());
                    self.builder.create_store(slot, element);
                }
                self.generate_block(*body);
                self.builder.create_br(condition_block);
                self.builder.position_at_end(after_block);
            }
            StmtKind::If {
                branches,
                else_block,
            } => {
                let after_block = self.builder.create_block();
                for branch in branches {
                    let then_block = self.builder.create_block();
                    let next_block = self.builder.create_block();
                    let condition = self.generate_expr(branch.condition);
                    self.builder.create_cond_br(condition, then_block, next_block);
                    self.builder.position_at_end(then_block);
                    self.generate_block(branch.block);
                    self.builder.create_br(after_block);
                    self.builder.position_at_end(next_block);
                }
                if let Some(else_block) = else_block {
                    self.generate_block(*else_block);
                }
                self.builder.create_br(after_block);
                self.builder.position_at_end(after_block);
            }
            StmtKind::Unsafe(block) => self.generate_block(*block),
            StmtKind::ErrorHandler {
                value,
                body,
                else_block,
                ..
            } => {
                let boxed = self.generate_expr(*value);
                let is_error = self.builder.create_instruction(Op::IsError, &[boxed]);
                let error_block = self.builder.create_block();
                let success_block = self.builder.create_block();
                let after_block = self.builder.create_block();
                self.builder.create_cond_br(is_error, error_block, success_block);
                self.builder.position_at_end(success_block);
                let unwrapped = self.builder.create_instruction(Op::ErrorValue, &[boxed]);
                if let Some(target) = self.analysis.assignment_targets.get(&stmt) {
                    let slot = self.ensure_slot(target.id, &Type::something());
                    self.builder.create_store(slot, unwrapped);
                }
                self.generate_block(*body);
                self.builder.create_br(after_block);
                self.builder.position_at_end(error_block);
                if let Some(else_block) = else_block {
                    self.generate_block(*else_block);
                }
                self.builder.create_br(after_block);
                self.builder.position_at_end(after_block);
            }
            StmtKind::VariableDeclaration { .. } => {
                // The slot is created lazily on the first store.
            }
            StmtKind::VariableAssignment { value, .. }
            | StmtKind::ConstantBind { value, .. } => {
                let emitted = self.generate_expr(*value);
                let ty = self.analysis.expr_type(*value);
                if let Some(target) = self.analysis.assignment_targets.get(&stmt).copied() {
                    self.store_variable(target, &ty, emitted);
                }
            }
            StmtKind::Block(block) => self.generate_block(*block),
        }
    }

    fn store_variable(&mut self, target: ResolvedVariableUse, ty: &Type, value: ValueId) {
        if target.from_instance {
            let slot = self.builder.const_integer(i64::from(target.id.0));
            self.builder
                .create_instruction(Op::StoreInstanceVariable, &[slot, value]);
        } else {
            let slot = self.ensure_slot(target.id, ty);
            self.builder.create_store(slot, value);
        }
    }

    fn ensure_slot(&mut self, id: VariableId, ty: &Type) -> ValueId {
        let index = id.0 as usize;
        if index >= self.locals.len() {
            self.locals.resize(index + 1, None);
        }
        match self.locals[index] {
            Some(slot) => slot,
            None => {
                let backend = self.helper.backend_type(ty);
                let slot = self.builder.create_alloca(backend);
                self.locals[index] = Some(slot);
                slot
            }
        }
    }

    fn generate_expr(&mut self, expr: ExprId) -> ValueId {
        let value = self.generate_expr_inner(expr);
        if self.analysis.temporarily_scoped.contains(&expr) {
            self.temporaries.push(value);
        }
        value
    }

    fn generate_expr_inner(&mut self, expr: ExprId) -> ValueId {
        match &self.ast.expr(expr).kind {
            ExprKind::IntegerLiteral(value) => {
                // An integer literal analysed in a 💯 context becomes a
                // double constant.
                if matches!(
                    self.analysis.expr_type(expr).kind(),
                    moji_types::TypeKind::Double
                ) {
                    self.builder.const_double(*value as f64)
                } else {
                    self.builder.const_integer(*value)
                }
            }
            ExprKind::DoubleLiteral(value) => self.builder.const_double(*value),
            ExprKind::BooleanLiteral(value) => self.builder.const_boolean(*value),
            ExprKind::StringLiteral(name) => self.builder.const_pooled_string(name.0),
            ExprKind::SymbolLiteral(value) => self.builder.const_symbol(*value),
            ExprKind::NothingnessLiteral => {
                self.builder.create_instruction(Op::MakeNoValue, &[])
            }
            ExprKind::ListLiteral(elements) => {
                let list = self.builder.create_instruction(Op::ListNew, &[]);
                for element in elements {
                    let value = self.generate_expr(*element);
                    self.builder
                        .create_instruction(Op::ListAppend, &[list, value]);
                }
                list
            }
            ExprKind::DictionaryLiteral(pairs) => {
                let dictionary = self.builder.create_instruction(Op::DictionaryNew, &[]);
                for (key, value) in pairs {
                    let key = self.generate_expr(*key);
                    let value = self.generate_expr(*value);
                    self.builder
                        .create_instruction(Op::DictionaryInsert, &[dictionary, key, value]);
                }
                dictionary
            }
            ExprKind::Concatenate(parts) => {
                let mut operands = Vec::with_capacity(parts.len());
                for part in parts {
                    operands.push(self.generate_expr(*part));
                }
                self.builder.create_instruction(Op::Concatenate, &operands)
            }
            ExprKind::This => self.builder.create_instruction(Op::This, &[]),
            ExprKind::GetVariable { .. } => {
                let Some(use_) = self.analysis.variable_uses.get(&expr).copied() else {
                    return self.builder.create_instruction(Op::MakeNoValue, &[]);
                };
                if use_.from_instance {
                    let slot = self.builder.const_integer(i64::from(use_.id.0));
                    self.builder
                        .create_instruction(Op::LoadInstanceVariable, &[slot])
                } else {
                    let ty = self.analysis.expr_type(expr);
                    let slot = self.ensure_slot(use_.id, &ty);
                    self.builder.create_load(slot)
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                let receiver = self.generate_expr(*receiver);
                let mut operands = vec![receiver];
                for arg in args {
                    operands.push(self.generate_expr(*arg));
                }
                self.dispatch(expr, operands)
            }
            ExprKind::SuperMethodCall { args, .. } => {
                let this = self.builder.create_instruction(Op::This, &[]);
                let mut operands = vec![this];
                for arg in args {
                    operands.push(self.generate_expr(*arg));
                }
                self.dispatch(expr, operands)
            }
            ExprKind::TypeMethodCall { args, .. } => {
                let mut operands = Vec::with_capacity(args.len());
                for arg in args {
                    operands.push(self.generate_expr(*arg));
                }
                self.dispatch(expr, operands)
            }
            ExprKind::Initialization { args, .. } => {
                if let Some(ordinal) = self.analysis.enum_values.get(&expr) {
                    return self.builder.const_integer(*ordinal);
                }
                let instance = self.builder.create_instruction(Op::AllocateInstance, &[]);
                let mut operands = vec![instance];
                for arg in args {
                    operands.push(self.generate_expr(*arg));
                }
                self.dispatch(expr, operands);
                instance
            }
            ExprKind::CallableCall { callee, args } => {
                let callee = self.generate_expr(*callee);
                let mut operands = vec![callee];
                for arg in args {
                    operands.push(self.generate_expr(*arg));
                }
                self.builder
                    .create_instruction(Op::ExecuteCallable, &operands)
            }
            ExprKind::CaptureMethod { receiver, .. } => {
                let receiver = self.generate_expr(*receiver);
                let function = self
                    .analysis
                    .call_targets
                    .get(&expr)
                    .map(|target| target.function)
                    .unwrap_or(FunctionId(0));
                let function = self.builder.const_function(function);
                self.builder
                    .create_instruction(Op::CaptureCallable, &[function, receiver])
            }
            ExprKind::BinaryOperator { left, right, .. } => {
                let left = self.generate_expr(*left);
                let right = self.generate_expr(*right);
                self.dispatch(expr, vec![left, right])
            }
            ExprKind::Cast { value, .. } => {
                let value = self.generate_expr(*value);
                self.builder.create_instruction(Op::Cast, &[value])
            }
            ExprKind::IsError { value } => {
                let value = self.generate_expr(*value);
                self.builder.create_instruction(Op::IsError, &[value])
            }
            ExprKind::Unwrap { value } => {
                let ty = self.analysis.expr_type(*value);
                let emitted = self.generate_expr(*value);
                if ty.is_error() {
                    self.builder.create_instruction(Op::ErrorValue, &[emitted])
                } else {
                    self.builder
                        .create_instruction(Op::UnwrapOptional, &[emitted])
                }
            }
            ExprKind::MetaTypeInstantiation { .. } => self
                .builder
                .create_instruction(Op::InstantiateMetaType, &[]),
            ExprKind::TypeAsValue { .. } => {
                self.builder.create_instruction(Op::TypeAsValue, &[])
            }
            ExprKind::SizeOf { .. } => self.builder.create_instruction(Op::SizeOf, &[]),
            ExprKind::ConditionalAssignment { value, .. } => {
                let emitted = self.generate_expr(*value);
                if let Some(target) = self.analysis.binding_targets.get(&expr).copied() {
                    let unwrapped = self
                        .builder
                        .create_instruction(Op::UnwrapOptional, &[emitted]);
                    let ty = self.analysis.expr_type(*value).non_optional();
                    self.store_variable(target, &ty, unwrapped);
                }
                self.builder
                    .create_instruction(Op::OptionalHasValue, &[emitted])
            }
            ExprKind::Box { kind, value } => {
                let inner = self.generate_expr(*value);
                let op = match kind {
                    BoxKind::ToSomething => Op::BoxToSomething,
                    BoxKind::ToProtocol => Op::BoxToProtocol,
                    BoxKind::ToSomeobject => Op::PromoteToSomeobject,
                    BoxKind::CallableThunk => Op::AdaptCallable,
                };
                self.builder.create_instruction(op, &[inner])
            }
        }
    }

    /// Select the dispatch mechanism recorded by the analyser.
    fn dispatch(&mut self, expr: ExprId, operands: Vec<ValueId>) -> ValueId {
        let Some(target) = self.analysis.call_targets.get(&expr) else {
            return self.builder.create_instruction(Op::MakeNoValue, &[]);
        };
        match target.dispatch {
            DispatchKind::Direct => self.builder.create_call(target.function, &operands),
            DispatchKind::VirtualTable => {
                let function = self.builder.const_function(target.function);
                let mut full = vec![function];
                full.extend(operands);
                self.builder.create_instruction(Op::VirtualDispatch, &full)
            }
            DispatchKind::ProtocolTable => {
                let function = self.builder.const_function(target.function);
                let mut full = vec![function];
                full.extend(operands);
                self.builder.create_instruction(Op::ProtocolDispatch, &full)
            }
            DispatchKind::CallableExecutor => self
                .builder
                .create_instruction(Op::ExecuteCallable, &operands),
        }
    }
}

/// Generate the body of a synthesised boxing layer.
///
/// The layer converts each argument to the destination's convention,
/// calls the destination (or applies the executor instruction for a
/// callable thunk), and converts the result back.
pub fn generate_boxing_layer(
    registry: &TypeRegistry,
    function: FunctionId,
    builder: &mut dyn Builder,
) {
    let def = registry.function(function);
    let Some(boxing) = &def.boxing else {
        builder.create_ret_void();
        return;
    };

    let mut converted = Vec::with_capacity(def.parameters.len());
    for (index, (parameter, destination)) in def
        .parameters
        .iter()
        .zip(&boxing.destination_parameters)
        .enumerate()
    {
        let value = builder.parameter(index as u32);
        let value = if parameter.ty == *destination {
            value
        } else {
            builder.create_instruction(Op::UnboxFromSomething, &[value])
        };
        converted.push(value);
    }

    let result = match boxing.destination {
        Some(destination) => builder.create_call(destination, &converted),
        None => {
            // Callable thunk: the executor applies the `this` context.
            let this = builder.create_instruction(Op::This, &[]);
            let mut operands = vec![this];
            operands.extend(converted);
            builder.create_instruction(Op::ExecuteCallable, &operands)
        }
    };

    let result = if boxing.destination_return == def.return_type {
        result
    } else {
        builder.create_instruction(Op::BoxToSomething, &[result])
    };
    builder.create_ret(result);
}

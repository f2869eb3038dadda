//! Per-function semantic analysis.
//!
//! One analyser instance per function. The walk is depth-first; every
//! expression ends up annotated with its exact resulting type, and
//! implicit conversions (boxing, thunking) are inserted as wrapper nodes
//! in the function's AST arena.

mod call;
mod expr;

use tracing::trace;

use moji_diagnostic::{CompilerError, Diagnostics, ErrorCode};
use moji_ir::{
    glyphs, Ast, BlockId, ExprId, ExprKind, IfBranch, Name, SourcePosition, StmtId, StmtKind,
    TypeExprId,
};
use moji_types::{
    FunctionId, FunctionKind, FunctionModifiers, GenericParameter, PackageId, ResolutionContext,
    Type, TypeDynamism, TypeKind, TypeRegistry, TypeResolver,
};
use moji_ir::StringPool;

use crate::{
    analysis::ResolvedVariableUse, FunctionAnalysis, Scope, SemanticScoper, TypeExpectation,
};

/// Analyse one function body.
///
/// On success the returned [`FunctionAnalysis`] carries every
/// annotation; on failure the error describes the first problem in this
/// function, and the driver continues with the next sibling.
pub fn analyse_function(
    registry: &TypeRegistry,
    pool: &StringPool,
    diagnostics: &mut Diagnostics,
    function: FunctionId,
    ast: &mut Ast,
) -> Result<FunctionAnalysis, CompilerError> {
    let mut analyser = FunctionAnalyser::new(registry, pool, diagnostics, function, ast);
    analyser.analyse()?;
    Ok(analyser.into_analysis())
}

/// Walks one function body.
pub struct FunctionAnalyser<'a> {
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) pool: &'a StringPool,
    pub(crate) diagnostics: &'a mut Diagnostics,
    pub(crate) ast: &'a mut Ast,
    pub(crate) scoper: SemanticScoper,
    pub(crate) package: PackageId,
    pub(crate) owner: Type,
    pub(crate) function_kind: FunctionKind,
    pub(crate) modifiers: FunctionModifiers,
    pub(crate) return_type: Type,
    pub(crate) type_parameters: Vec<GenericParameter>,
    pub(crate) function_parameters: Vec<GenericParameter>,
    pub(crate) dynamism: TypeDynamism,
    pub(crate) analysis: FunctionAnalysis,
}

impl<'a> FunctionAnalyser<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        pool: &'a StringPool,
        diagnostics: &'a mut Diagnostics,
        function: FunctionId,
        ast: &'a mut Ast,
    ) -> Self {
        let def = registry.function(function);
        let owner = def.owner.clone();
        let function_kind = def.kind;
        let modifiers = def.modifiers;
        let return_type = def.return_type.clone();
        let function_parameters = def.generic_parameters.clone();
        let arguments: Vec<(Name, Type)> = def
            .parameters
            .iter()
            .map(|parameter| (parameter.name, parameter.ty.clone()))
            .collect();
        let position = def.position;

        let type_parameters = match owner.kind() {
            TypeKind::Class(id) => registry.class(*id).generic_parameters.clone(),
            TypeKind::Protocol(id) => registry.protocol(*id).generic_parameters.clone(),
            _ => Vec::new(),
        };

        let dynamism = match function_kind {
            // A class-method signature has no instance to dispatch on.
            FunctionKind::ClassMethod => TypeDynamism::GENERIC_VARS,
            _ => TypeDynamism::GENERIC_VARS | TypeDynamism::DYNAMIC_CLASS,
        };

        let instance_scope = instance_scope_for(registry, def.kind, &owner);
        let mut scoper = SemanticScoper::new(instance_scope);
        scoper.push_arguments_scope(&arguments, position);

        FunctionAnalyser {
            registry,
            pool,
            diagnostics,
            ast,
            scoper,
            package: def.package,
            owner,
            function_kind,
            modifiers,
            return_type,
            type_parameters,
            function_parameters,
            dynamism,
            analysis: FunctionAnalysis::default(),
        }
    }

    pub fn into_analysis(self) -> FunctionAnalysis {
        self.analysis
    }

    /// Drive the walk over the body.
    pub fn analyse(&mut self) -> Result<(), CompilerError> {
        let Some(root) = self.ast.root else {
            return Ok(());
        };
        trace!(exprs = self.ast.expr_count(), "analysing function body");
        let stmts = self.ast.block(root).stmts.clone();
        for stmt in stmts {
            self.analyse_stmt(stmt)?;
        }
        if self.function_kind == FunctionKind::Initializer {
            self.check_instance_initialization()?;
        }
        self.scoper.pop_scope(self.diagnostics, self.pool);
        self.analysis.variable_ceiling = self.scoper.create_stats().variable_count;
        Ok(())
    }

    fn check_instance_initialization(&mut self) -> Result<(), CompilerError> {
        let uninitialized = self.scoper.uninitialized_instance_variables();
        if let Some(name) = uninitialized.first() {
            let position = self.ast.block(self.ast.root.unwrap_or(BlockId(0))).position;
            return Err(CompilerError::new(
                ErrorCode::E4006,
                position,
                format!(
                    "Instance variable {} was not initialized by this initializer.",
                    self.pool.get(*name)
                ),
            ));
        }
        Ok(())
    }

    // Statements.

    pub(crate) fn analyse_stmt(&mut self, id: StmtId) -> Result<(), CompilerError> {
        let position = self.ast.stmt(id).position;
        let kind = self.ast.stmt(id).kind.clone();
        match kind {
            StmtKind::Expression(expr) => {
                let (ty, expr) = self.expect(TypeExpectation::none(), expr)?;
                if !ty.is_nothingness() {
                    // The discarded value lives until the statement ends.
                    self.analysis.temporarily_scoped.insert(expr);
                }
                self.write_stmt(id, StmtKind::Expression(expr));
            }
            StmtKind::Return(expr) => {
                let expectation = self.return_expectation(position)?;
                let (_, expr) = self.expect(expectation, expr)?;
                self.write_stmt(id, StmtKind::Return(expr));
            }
            StmtKind::Raise(expr) => {
                if !self.return_type.is_error() {
                    return Err(CompilerError::new(
                        ErrorCode::E4004,
                        position,
                        "🚨 may only be used inside a function that declares an 🚨 return type.",
                    ));
                }
                let expectation = TypeExpectation::of(self.return_type.error_enum());
                let (_, expr) = self.expect(expectation, expr)?;
                self.write_stmt(id, StmtKind::Raise(expr));
            }
            StmtKind::RepeatWhile { condition, body } => {
                let (condition, binding) = self.analyse_condition(condition)?;
                self.scoper.push_scope();
                self.declare_condition_binding(condition, binding)?;
                self.analyse_block(body)?;
                self.scoper.pop_scope(self.diagnostics, self.pool);
                self.write_stmt(id, StmtKind::RepeatWhile { condition, body });
            }
            StmtKind::ForIn {
                variable,
                iteratee,
                body,
            } => {
                let (iteratee_ty, iteratee) = self.expect(TypeExpectation::none(), iteratee)?;
                let element = iteratee_ty
                    .generic_args()
                    .first()
                    .cloned()
                    .unwrap_or_else(Type::something);
                self.scoper.push_scope();
                let slot = self.declare_variable(variable, element, true, position)?;
                self.scoper.initialize_variable(variable);
                self.analysis.assignment_targets.insert(
                    id,
                    ResolvedVariableUse {
                        id: slot,
                        from_instance: false,
                    },
                );
                self.analyse_block(body)?;
                self.scoper.pop_scope(self.diagnostics, self.pool);
                self.write_stmt(
                    id,
                    StmtKind::ForIn {
                        variable,
                        iteratee,
                        body,
                    },
                );
            }
            StmtKind::If {
                branches,
                else_block,
            } => {
                self.analyse_if(id, branches, else_block)?;
            }
            StmtKind::Unsafe(block) => {
                self.scoper.push_scope();
                self.analyse_block(block)?;
                self.scoper.pop_scope(self.diagnostics, self.pool);
            }
            StmtKind::ErrorHandler {
                variable,
                value,
                body,
                else_block,
            } => {
                let (value_ty, value) = self.expect(TypeExpectation::none(), value)?;
                if !value_ty.is_error() {
                    return Err(CompilerError::new(
                        ErrorCode::E3006,
                        position,
                        "🥑 can only be used with 🚨.",
                    ));
                }
                self.scoper.push_scope();
                let slot =
                    self.declare_variable(variable, value_ty.error_value().clone(), true, position)?;
                self.scoper.initialize_variable(variable);
                self.analysis.assignment_targets.insert(
                    id,
                    ResolvedVariableUse {
                        id: slot,
                        from_instance: false,
                    },
                );
                self.analyse_block(body)?;
                self.scoper.pop_scope(self.diagnostics, self.pool);
                if let Some(else_block) = else_block {
                    self.scoper.push_scope();
                    self.analyse_block(else_block)?;
                    self.scoper.pop_scope(self.diagnostics, self.pool);
                }
                self.write_stmt(
                    id,
                    StmtKind::ErrorHandler {
                        variable,
                        value,
                        body,
                        else_block,
                    },
                );
            }
            StmtKind::VariableDeclaration { name, type_expr } => {
                let ty = self.resolve_type(type_expr)?;
                let slot = self.declare_variable(name, ty, false, position)?;
                self.analysis.assignment_targets.insert(
                    id,
                    ResolvedVariableUse {
                        id: slot,
                        from_instance: false,
                    },
                );
            }
            StmtKind::VariableAssignment { name, value } => {
                self.analyse_assignment(id, name, value, position)?;
            }
            StmtKind::ConstantBind { name, value } => {
                let (ty, value) = self.expect(TypeExpectation::none(), value)?;
                let slot = self.declare_variable(name, ty, true, position)?;
                self.scoper.initialize_variable(name);
                self.analysis.assignment_targets.insert(
                    id,
                    ResolvedVariableUse {
                        id: slot,
                        from_instance: false,
                    },
                );
                self.write_stmt(id, StmtKind::ConstantBind { name, value });
            }
            StmtKind::Block(block) => {
                self.scoper.push_scope();
                self.analyse_block(block)?;
                self.scoper.pop_scope(self.diagnostics, self.pool);
            }
        }
        Ok(())
    }

    fn analyse_assignment(
        &mut self,
        id: StmtId,
        name: Name,
        value: ExprId,
        position: SourcePosition,
    ) -> Result<(), CompilerError> {
        match self.scoper.get_variable(name, position, self.pool) {
            Ok(variable) => {
                if variable.frozen {
                    return Err(CompilerError::new(
                        ErrorCode::E4007,
                        position,
                        format!("Cannot assign to frozen variable {}.", self.pool.get(name)),
                    ));
                }
                let (_, value) = self.expect(TypeExpectation::of(&variable.ty), value)?;
                self.scoper.set_mutated(name);
                self.scoper.initialize_variable(name);
                self.analysis.assignment_targets.insert(
                    id,
                    ResolvedVariableUse {
                        id: variable.id,
                        from_instance: variable.from_instance,
                    },
                );
                self.write_stmt(id, StmtKind::VariableAssignment { name, value });
            }
            Err(_) => {
                // First use declares a mutable variable.
                let (ty, value) = self.expect(TypeExpectation::none(), value)?;
                let slot = self.declare_variable(name, ty, false, position)?;
                self.scoper.initialize_variable(name);
                self.analysis.assignment_targets.insert(
                    id,
                    ResolvedVariableUse {
                        id: slot,
                        from_instance: false,
                    },
                );
                self.write_stmt(id, StmtKind::VariableAssignment { name, value });
            }
        }
        Ok(())
    }

    fn analyse_if(
        &mut self,
        id: StmtId,
        branches: Vec<IfBranch>,
        else_block: Option<BlockId>,
    ) -> Result<(), CompilerError> {
        let outer_level = self.scoper.current_level();
        let mut new_branches = Vec::with_capacity(branches.len());
        let mut branch_initializations: Vec<Vec<Name>> = Vec::new();

        for branch in branches {
            let (condition, binding) = self.analyse_condition(branch.condition)?;
            self.scoper.push_scope();
            self.declare_condition_binding(condition, binding)?;
            self.analyse_block(branch.block)?;
            branch_initializations.push(self.scoper.conditionally_initialized_above(outer_level));
            self.scoper.pop_scope(self.diagnostics, self.pool);
            new_branches.push(IfBranch {
                condition,
                block: branch.block,
            });
        }

        if let Some(else_block) = else_block {
            self.scoper.push_scope();
            self.analyse_block(else_block)?;
            branch_initializations.push(self.scoper.conditionally_initialized_above(outer_level));
            self.scoper.pop_scope(self.diagnostics, self.pool);

            // A variable assigned in every branch, the 🍓 branch
            // included, is definitely initialized after the statement.
            if let Some(first) = branch_initializations.first().cloned() {
                for name in first {
                    if branch_initializations.iter().all(|set| set.contains(&name)) {
                        self.scoper.initialize_variable_at(name, outer_level);
                    }
                }
            }
        }

        self.write_stmt(
            id,
            StmtKind::If {
                branches: new_branches,
                else_block,
            },
        );
        Ok(())
    }

    /// A condition; `expr ➡ name` produces a binding visible only in
    /// the true branch.
    fn analyse_condition(
        &mut self,
        expr: ExprId,
    ) -> Result<(ExprId, Option<(Name, Type, SourcePosition)>), CompilerError> {
        let position = self.ast.expr(expr).position;
        let kind = self.ast.expr(expr).kind.clone();
        if let ExprKind::ConditionalAssignment { name, value } = kind {
            let (value_ty, value) = self.expect(TypeExpectation::none(), value)?;
            if !value_ty.optional() {
                return Err(CompilerError::new(
                    ErrorCode::E3001,
                    position,
                    "➡ requires an 🍬 value to test.",
                ));
            }
            self.write_expr(expr, ExprKind::ConditionalAssignment { name, value });
            self.record_type(expr, Type::boolean());
            return Ok((expr, Some((name, value_ty.non_optional(), position))));
        }
        let (_, expr) = self.expect(TypeExpectation::of(&Type::boolean()), expr)?;
        Ok((expr, None))
    }

    fn declare_condition_binding(
        &mut self,
        condition: ExprId,
        binding: Option<(Name, Type, SourcePosition)>,
    ) -> Result<(), CompilerError> {
        if let Some((name, ty, position)) = binding {
            let slot = self.declare_variable(name, ty, true, position)?;
            self.scoper.initialize_variable(name);
            self.analysis.binding_targets.insert(
                condition,
                ResolvedVariableUse {
                    id: slot,
                    from_instance: false,
                },
            );
        }
        Ok(())
    }

    pub(crate) fn analyse_block(&mut self, block: BlockId) -> Result<(), CompilerError> {
        let stmts = self.ast.block(block).stmts.clone();
        for stmt in stmts {
            self.analyse_stmt(stmt)?;
        }
        Ok(())
    }

    fn return_expectation(
        &self,
        position: SourcePosition,
    ) -> Result<TypeExpectation, CompilerError> {
        if self.function_kind == FunctionKind::Initializer {
            if !self
                .modifiers
                .contains(FunctionModifiers::CAN_RETURN_NOTHINGNESS)
            {
                return Err(CompilerError::new(
                    ErrorCode::E4011,
                    position,
                    format!(
                        "🍎 may only be used in an initializer marked {}.",
                        glyphs::CAN_RETURN_NOTHINGNESS
                    ),
                ));
            }
            return Ok(TypeExpectation::of(&Type::nothingness()));
        }
        if self.return_type.is_error() {
            return Ok(TypeExpectation::of(self.return_type.error_value()));
        }
        Ok(TypeExpectation::of(&self.return_type))
    }

    // Shared helpers.

    pub(crate) fn declare_variable(
        &mut self,
        name: Name,
        ty: Type,
        frozen: bool,
        position: SourcePosition,
    ) -> Result<crate::VariableId, CompilerError> {
        self.scoper
            .declare_variable(name, ty, frozen, position, self.diagnostics, self.pool)
    }

    pub(crate) fn resolve_type(&mut self, type_expr: TypeExprId) -> Result<Type, CompilerError> {
        // `⬜ expr` takes the type of a value; only the analyser can
        // type the inner expression, so it is handled here rather than
        // in the resolver.
        if let moji_ir::TypeExprKind::TypeFromValue { value } =
            self.ast.type_expr(type_expr).kind.clone()
        {
            let position = self.ast.type_expr(type_expr).position;
            if !self.dynamism.contains(TypeDynamism::DYNAMIC_CLASS) {
                return Err(CompilerError::new(
                    ErrorCode::E3004,
                    position,
                    "⬜ is not allowed in this position.",
                ));
            }
            let (ty, _) = self.expect(TypeExpectation::none(), value)?;
            return Ok(ty);
        }
        let resolver = TypeResolver::new(self.registry, self.package, self.pool);
        resolver.resolve(
            self.ast,
            type_expr,
            ResolutionContext {
                type_parameters: &self.type_parameters,
                function_parameters: &self.function_parameters,
            },
            self.dynamism,
        )
    }

    pub(crate) fn record_type(&mut self, expr: ExprId, ty: Type) {
        self.analysis.expr_types.insert(expr, ty);
    }

    pub(crate) fn write_expr(&mut self, expr: ExprId, kind: ExprKind) {
        self.ast.expr_mut(expr).kind = kind;
    }

    fn write_stmt(&mut self, stmt: StmtId, kind: StmtKind) {
        self.ast.stmt_mut(stmt).kind = kind;
    }
}

/// Build the instance scope for a method or initializer: every instance
/// variable of the owner class and its superclasses.
fn instance_scope_for(registry: &TypeRegistry, kind: FunctionKind, owner: &Type) -> Option<Scope> {
    if !matches!(kind, FunctionKind::Method | FunctionKind::Initializer) {
        return None;
    }
    let TypeKind::Class(class) = owner.kind() else {
        return None;
    };
    let mut scope = Scope::new();
    let initialized = kind == FunctionKind::Method;
    let mut current = Some(*class);
    let mut context = owner.clone();
    while let Some(id) = current {
        let def = registry.class(id);
        for variable in &def.instance_variables {
            let ty = variable
                .ty
                .clone()
                .unwrap_or_else(Type::something)
                .resolve_on(&context);
            scope.declare_instance_variable(variable.name, ty, initialized, variable.position);
        }
        current = def.superclass;
        if let Some(next) = current {
            let args = def
                .super_generic_args
                .iter()
                .map(|arg| arg.resolve_on(&context))
                .collect();
            context = Type::class(next, args);
        }
    }
    Some(scope)
}

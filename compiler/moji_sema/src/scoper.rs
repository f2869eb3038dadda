//! Nested scopes and variable tracking.
//!
//! The scoper models definite initialization with an integer level: the
//! level is bumped on every scope push and popped on close, and a write
//! at a deeper level counts as conditional until the analyser proves all
//! sibling branches agree. One scoper instance serves one function
//! analyser; it is not thread-safe.

use rustc_hash::FxHashMap;

use moji_diagnostic::{CompilerError, Diagnostics, ErrorCode};
use moji_ir::{Name, SourcePosition, StringPool};
use moji_types::Type;

/// Frame-slot id of a local variable.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct VariableId(pub u16);

/// One tracked variable.
#[derive(Clone, Debug)]
pub struct Variable {
    pub ty: Type,
    pub id: VariableId,
    pub position: SourcePosition,
    /// Declared with 🍦; assignment is an error.
    pub frozen: bool,
    /// Reassigned at least once after declaration.
    pub mutated: bool,
    /// Level at which the variable was (conditionally) initialized.
    initialized_at: Option<u32>,
}

impl Variable {
    pub fn is_initialized(&self) -> bool {
        self.initialized_at.is_some()
    }

    /// Record an assignment at the given level.
    pub fn initialize(&mut self, level: u32) {
        match self.initialized_at {
            Some(existing) if existing <= level => {}
            _ => self.initialized_at = Some(level),
        }
    }

    /// Discard initializations that happened at or above a popped level.
    fn pop_initialization_level(&mut self, popped: u32) {
        if matches!(self.initialized_at, Some(level) if level >= popped) {
            self.initialized_at = None;
        }
    }
}

/// One scope: a map from names to variables.
#[derive(Default, Debug)]
pub struct Scope {
    variables: FxHashMap<Name, Variable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_local_variable(&self, name: Name) -> bool {
        self.variables.contains_key(&name)
    }

    pub fn get_local_variable(&self, name: Name) -> Option<&Variable> {
        self.variables.get(&name)
    }

    pub fn get_local_variable_mut(&mut self, name: Name) -> Option<&mut Variable> {
        self.variables.get_mut(&name)
    }

    fn declare(&mut self, name: Name, variable: Variable) {
        self.variables.insert(name, variable);
    }

    /// Declare an instance variable. Instance variables have their own
    /// id numbering (object slots, not frame slots) and start
    /// initialized in methods but not in initializers.
    pub fn declare_instance_variable(
        &mut self,
        name: Name,
        ty: Type,
        initialized: bool,
        position: SourcePosition,
    ) {
        let id = VariableId(self.variables.len() as u16);
        let mut variable = Variable {
            ty,
            id,
            position,
            frozen: false,
            mutated: true,
            initialized_at: None,
        };
        if initialized {
            variable.initialize(1);
        }
        self.declare(name, variable);
    }

    fn pop_initialization_level(&mut self, popped: u32) {
        for variable in self.variables.values_mut() {
            variable.pop_initialization_level(popped);
        }
    }

    /// Warn about variables that were declared mutable but never
    /// reassigned.
    fn recommend_frozen_variables(&self, diagnostics: &mut Diagnostics, pool: &StringPool) {
        for (name, variable) in &self.variables {
            if !variable.frozen && !variable.mutated {
                diagnostics.warn(
                    variable.position,
                    format!(
                        "Variable {} was never mutated; consider declaring it with 🍦.",
                        pool.get(*name)
                    ),
                );
            }
        }
    }

    /// Names of variables that are currently (conditionally) initialized
    /// above the given level.
    fn initialized_above(&self, level: u32, out: &mut Vec<Name>) {
        for (name, variable) in &self.variables {
            if matches!(variable.initialized_at, Some(l) if l > level) {
                out.push(*name);
            }
        }
    }
}

/// A resolved variable lookup.
#[derive(Clone, Debug)]
pub struct ResolvedVariable {
    pub ty: Type,
    pub id: VariableId,
    pub frozen: bool,
    pub initialized: bool,
    /// Found in the enclosing instance scope rather than a local scope.
    pub from_instance: bool,
}

/// Snapshot of the scoper for frame sizing.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SemanticScopeStats {
    /// One past the highest local-variable id handed out.
    pub variable_count: u16,
}

/// Stack of scopes plus the optional instance scope.
#[derive(Debug)]
pub struct SemanticScoper {
    /// Innermost scope last.
    scopes: Vec<Scope>,
    instance_scope: Option<Scope>,
    max_initialization_level: u32,
    next_variable_id: u16,
}

impl SemanticScoper {
    pub fn new(instance_scope: Option<Scope>) -> Self {
        SemanticScoper {
            scopes: Vec::new(),
            instance_scope,
            max_initialization_level: 1,
            next_variable_id: 0,
        }
    }

    pub fn current_level(&self) -> u32 {
        self.max_initialization_level
    }

    /// Open a new scope; the initialization level rises for every
    /// existing scope, the instance scope included.
    pub fn push_scope(&mut self) -> &mut Scope {
        self.max_initialization_level += 1;
        self.scopes.push(Scope::new());
        // Index is valid: we just pushed.
        let index = self.scopes.len() - 1;
        &mut self.scopes[index]
    }

    /// Close the innermost scope, warning about never-mutated variables
    /// and discarding conditional initializations of outer variables.
    pub fn pop_scope(&mut self, diagnostics: &mut Diagnostics, pool: &StringPool) {
        if let Some(scope) = self.scopes.pop() {
            scope.recommend_frozen_variables(diagnostics, pool);
        }
        let popped = self.max_initialization_level;
        self.max_initialization_level -= 1;
        for scope in &mut self.scopes {
            scope.pop_initialization_level(popped);
        }
        if let Some(instance) = &mut self.instance_scope {
            instance.pop_initialization_level(popped);
        }
    }

    /// Open the argument scope and declare every parameter, fully
    /// initialized and frozen.
    pub fn push_arguments_scope(
        &mut self,
        arguments: &[(Name, Type)],
        position: SourcePosition,
    ) {
        self.push_scope();
        let level = self.current_level();
        for (name, ty) in arguments {
            let id = self.take_variable_id();
            let mut variable = Variable {
                ty: ty.clone(),
                id,
                position,
                frozen: true,
                mutated: false,
                initialized_at: None,
            };
            variable.initialize(level);
            if let Some(scope) = self.scopes.last_mut() {
                scope.declare(*name, variable);
            }
        }
    }

    /// Declare a variable in the innermost scope.
    ///
    /// Fails if the scope already has a variable of that name; warns if
    /// the declaration shadows an outer or instance variable.
    pub fn declare_variable(
        &mut self,
        name: Name,
        ty: Type,
        frozen: bool,
        position: SourcePosition,
        diagnostics: &mut Diagnostics,
        pool: &StringPool,
    ) -> Result<VariableId, CompilerError> {
        self.check_for_shadowing(name, position, diagnostics, pool);
        if matches!(self.scopes.last(), Some(scope) if scope.has_local_variable(name)) {
            return Err(CompilerError::new(
                ErrorCode::E2005,
                position,
                format!("A variable named {} already exists in this scope.", pool.get(name)),
            ));
        }
        let id = self.take_variable_id();
        let variable = Variable {
            ty,
            id,
            position,
            frozen,
            mutated: false,
            initialized_at: None,
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.declare(name, variable);
        }
        Ok(id)
    }

    fn check_for_shadowing(
        &self,
        name: Name,
        position: SourcePosition,
        diagnostics: &mut Diagnostics,
        pool: &StringPool,
    ) {
        for scope in &self.scopes {
            if scope.has_local_variable(name) {
                diagnostics.warn(
                    position,
                    format!(
                        "Declaration of {} shadows previous local variable.",
                        pool.get(name)
                    ),
                );
                return;
            }
        }
        if matches!(&self.instance_scope, Some(scope) if scope.has_local_variable(name)) {
            diagnostics.warn(
                position,
                format!("Declaration of {} shadows instance variable.", pool.get(name)),
            );
        }
    }

    /// Search the scopes innermost-to-outermost, then the instance
    /// scope.
    pub fn get_variable(
        &self,
        name: Name,
        position: SourcePosition,
        pool: &StringPool,
    ) -> Result<ResolvedVariable, CompilerError> {
        for scope in self.scopes.iter().rev() {
            if let Some(variable) = scope.get_local_variable(name) {
                return Ok(ResolvedVariable {
                    ty: variable.ty.clone(),
                    id: variable.id,
                    frozen: variable.frozen,
                    initialized: variable.is_initialized(),
                    from_instance: false,
                });
            }
        }
        if let Some(instance) = &self.instance_scope {
            if let Some(variable) = instance.get_local_variable(name) {
                return Ok(ResolvedVariable {
                    ty: variable.ty.clone(),
                    id: variable.id,
                    frozen: variable.frozen,
                    initialized: variable.is_initialized(),
                    from_instance: true,
                });
            }
        }
        Err(CompilerError::new(
            ErrorCode::E2003,
            position,
            format!("Variable {} not found.", pool.get(name)),
        ))
    }

    /// Mark a variable as assigned at the current level.
    pub fn initialize_variable(&mut self, name: Name) {
        let level = self.max_initialization_level;
        self.initialize_variable_at(name, level);
    }

    /// Mark a variable as assigned at a specific level; used when all
    /// branches of an 🍊 statement agree on an assignment.
    pub fn initialize_variable_at(&mut self, name: Name, level: u32) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(variable) = scope.get_local_variable_mut(name) {
                variable.initialize(level);
                return;
            }
        }
        if let Some(instance) = &mut self.instance_scope {
            if let Some(variable) = instance.get_local_variable_mut(name) {
                variable.initialize(level);
            }
        }
    }

    /// Mark a variable as reassigned.
    pub fn set_mutated(&mut self, name: Name) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(variable) = scope.get_local_variable_mut(name) {
                variable.mutated = true;
                return;
            }
        }
        if let Some(instance) = &mut self.instance_scope {
            if let Some(variable) = instance.get_local_variable_mut(name) {
                variable.mutated = true;
            }
        }
    }

    /// Names initialized above the given level, across every scope.
    pub fn conditionally_initialized_above(&self, level: u32) -> Vec<Name> {
        let mut out = Vec::new();
        for scope in &self.scopes {
            scope.initialized_above(level, &mut out);
        }
        if let Some(instance) = &self.instance_scope {
            instance.initialized_above(level, &mut out);
        }
        out
    }

    /// Whether every instance variable is definitely initialized.
    pub fn uninitialized_instance_variables(&self) -> Vec<Name> {
        let Some(instance) = &self.instance_scope else {
            return Vec::new();
        };
        instance
            .variables
            .iter()
            .filter(|(_, variable)| !variable.is_initialized())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Snapshot the frame size for the code generator.
    pub fn create_stats(&self) -> SemanticScopeStats {
        SemanticScopeStats {
            variable_count: self.next_variable_id,
        }
    }

    fn take_variable_id(&mut self) -> VariableId {
        let id = VariableId(self.next_variable_id);
        self.next_variable_id += 1;
        id
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture() -> (SemanticScoper, Diagnostics, StringPool) {
        (
            SemanticScoper::new(None),
            Diagnostics::new(),
            StringPool::new(),
        )
    }

    #[test]
    fn test_innermost_binding_wins_and_pop_restores() {
        let (mut scoper, mut diagnostics, pool) = fixture();
        let name = pool.pool("count");
        let position = SourcePosition::generated();

        scoper.push_scope();
        let outer = scoper
            .declare_variable(name, Type::integer(), false, position, &mut diagnostics, &pool)
            .unwrap();
        scoper.initialize_variable(name);

        scoper.push_scope();
        let inner = scoper
            .declare_variable(name, Type::double(), false, position, &mut diagnostics, &pool)
            .unwrap();
        scoper.initialize_variable(name);

        // The inner declaration shadows: warning, and lookup resolves to it.
        assert_eq!(diagnostics.diagnostics().len(), 1);
        let resolved = scoper.get_variable(name, position, &pool).unwrap();
        assert_eq!(resolved.id, inner);
        assert_eq!(resolved.ty, Type::double());

        scoper.pop_scope(&mut diagnostics, &pool);
        let resolved = scoper.get_variable(name, position, &pool).unwrap();
        assert_eq!(resolved.id, outer);
        assert_eq!(resolved.ty, Type::integer());
    }

    #[test]
    fn test_conditional_initialization_is_discarded_on_pop() {
        let (mut scoper, mut diagnostics, pool) = fixture();
        let name = pool.pool("total");
        let position = SourcePosition::generated();

        scoper.push_scope();
        scoper
            .declare_variable(name, Type::integer(), false, position, &mut diagnostics, &pool)
            .unwrap();

        // A write inside a nested scope is conditional.
        scoper.push_scope();
        scoper.initialize_variable(name);
        assert!(scoper.get_variable(name, position, &pool).unwrap().initialized);
        scoper.pop_scope(&mut diagnostics, &pool);

        assert!(!scoper.get_variable(name, position, &pool).unwrap().initialized);
    }

    #[test]
    fn test_duplicate_declaration_in_same_scope_fails() {
        let (mut scoper, mut diagnostics, pool) = fixture();
        let name = pool.pool("x");
        let position = SourcePosition::generated();
        scoper.push_scope();
        scoper
            .declare_variable(name, Type::integer(), false, position, &mut diagnostics, &pool)
            .unwrap();
        let err = scoper
            .declare_variable(name, Type::integer(), false, position, &mut diagnostics, &pool)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::E2005);
    }

    #[test]
    fn test_variable_not_found() {
        let (scoper, _diagnostics, pool) = fixture();
        let err = scoper
            .get_variable(pool.pool("ghost"), SourcePosition::generated(), &pool)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::E2003);
    }

    #[test]
    fn test_stats_track_variable_ceiling() {
        let (mut scoper, mut diagnostics, pool) = fixture();
        let position = SourcePosition::generated();
        scoper.push_scope();
        for label in ["a", "b", "c"] {
            scoper
                .declare_variable(
                    pool.pool(label),
                    Type::integer(),
                    true,
                    position,
                    &mut diagnostics,
                    &pool,
                )
                .unwrap();
        }
        assert_eq!(scoper.create_stats().variable_count, 3);
    }
}

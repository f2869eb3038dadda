//! Packages and the symbol registry.

use rustc_hash::FxHashMap;

use moji_ir::{glyphs, Glyph, Name, SourcePosition, StringPool};
use moji_diagnostic::{CompilerError, ErrorCode};

use crate::{
    AccessLevel, ClassDef, ClassId, EnumDef, EnumId, FunctionDef, FunctionId, FunctionKind,
    FunctionModifiers, MethodTable, PackageId, Parameter, ProtocolDef, ProtocolId, Type, TypeKind,
    ValueTypeDef, ValueTypeId,
};

/// Semantic version of a package.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PackageVersion {
    pub major: u16,
    pub minor: u16,
}

impl PackageVersion {
    /// A version is valid unless it is 0.0.
    pub fn is_valid(self) -> bool {
        self.major != 0 || self.minor != 0
    }
}

/// A package: a namespace-qualified map of type names plus the
/// declarations it owns.
#[derive(Debug)]
pub struct Package {
    pub name: Name,
    pub version: Option<PackageVersion>,
    pub requires_binary: bool,
    types: FxHashMap<(Glyph, Glyph), Type>,
    exported: Vec<(Glyph, Type)>,
    pub classes: Vec<ClassId>,
    pub protocols: Vec<ProtocolId>,
    pub enums: Vec<EnumId>,
}

impl Package {
    fn new(name: Name) -> Self {
        Package {
            name,
            version: None,
            requires_binary: false,
            types: FxHashMap::default(),
            exported: Vec::new(),
            classes: Vec::new(),
            protocols: Vec::new(),
            enums: Vec::new(),
        }
    }
}

/// The program entry point, recorded once per program.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct StartingFlag {
    pub class: ClassId,
    pub function: FunctionId,
}

/// Value-type handles for the primitives, so method resolution on 🚂 and
/// friends has a table to search, plus the literal classes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Builtins {
    pub integer: ValueTypeId,
    pub double: ValueTypeId,
    pub boolean: ValueTypeId,
    pub symbol: ValueTypeId,
    pub byte: ValueTypeId,
    /// 🔡 — the type of string literals.
    pub string_class: ClassId,
    /// 🍨 — the type of list literals.
    pub list_class: ClassId,
    /// 🍯 — the type of dictionary literals.
    pub dictionary_class: ClassId,
}

/// Owns every definition of a compilation and resolves type names.
///
/// Downstream components hold `…Id` handles and resolve them here; the
/// registry is the only owner, so the object graph is cycle-free.
#[derive(Debug)]
pub struct TypeRegistry {
    packages: Vec<Package>,
    package_ids: FxHashMap<Name, PackageId>,
    classes: Vec<ClassDef>,
    protocols: Vec<ProtocolDef>,
    enums: Vec<EnumDef>,
    value_types: Vec<ValueTypeDef>,
    functions: Vec<FunctionDef>,
    pub starting_flag: Option<StartingFlag>,
    builtins: Builtins,
}

impl TypeRegistry {
    /// Create a registry with the primitive value types bootstrapped
    /// into the default package.
    pub fn bootstrap(pool: &StringPool) -> Self {
        let mut registry = TypeRegistry {
            packages: Vec::new(),
            package_ids: FxHashMap::default(),
            classes: Vec::new(),
            protocols: Vec::new(),
            enums: Vec::new(),
            value_types: Vec::new(),
            functions: Vec::new(),
            starting_flag: None,
            builtins: Builtins {
                integer: ValueTypeId(0),
                double: ValueTypeId(1),
                boolean: ValueTypeId(2),
                symbol: ValueTypeId(3),
                byte: ValueTypeId(4),
                string_class: ClassId(0),
                list_class: ClassId(1),
                dictionary_class: ClassId(2),
            },
        };
        let default = registry.load_package(pool.pool("_"));
        registry.register_primitive_value_types(default, pool);
        registry.register_literal_classes(default, pool);
        registry
    }

    // Packages.

    /// Load a package by name. Loading is idempotent: re-requesting a
    /// loaded package returns the cached instance.
    pub fn load_package(&mut self, name: Name) -> PackageId {
        if let Some(&id) = self.package_ids.get(&name) {
            return id;
        }
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package::new(name));
        self.package_ids.insert(name, id);
        tracing::debug!(package = id.0, "loaded package");
        id
    }

    pub fn package_by_name(&self, name: Name) -> Option<PackageId> {
        self.package_ids.get(&name).copied()
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.0 as usize]
    }

    /// Make `from`'s exported types visible in `into` under `namespace`.
    pub fn import_exports(
        &mut self,
        into: PackageId,
        from: PackageId,
        namespace: Glyph,
        position: SourcePosition,
    ) -> Result<(), CompilerError> {
        let exported: Vec<(Glyph, Type)> = self.package(from).exported.clone();
        for (name, ty) in exported {
            self.insert_type(into, namespace, name, ty, position)?;
        }
        Ok(())
    }

    // Type names.

    /// Register a named type. Registering a duplicate (name, namespace)
    /// is an error.
    pub fn register_type(
        &mut self,
        package: PackageId,
        namespace: Glyph,
        name: Glyph,
        ty: Type,
        exported: bool,
        position: SourcePosition,
    ) -> Result<(), CompilerError> {
        self.insert_type(package, namespace, name, ty.clone(), position)?;
        if exported {
            self.package_mut(package).exported.push((name, ty));
        }
        Ok(())
    }

    fn insert_type(
        &mut self,
        package: PackageId,
        namespace: Glyph,
        name: Glyph,
        ty: Type,
        position: SourcePosition,
    ) -> Result<(), CompilerError> {
        let slot = self.packages[package.0 as usize]
            .types
            .entry((namespace, name));
        match slot {
            std::collections::hash_map::Entry::Occupied(_) => Err(CompilerError::new(
                ErrorCode::E2002,
                position,
                format!("Type {namespace}{name} is already defined."),
            )),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(ty);
                Ok(())
            }
        }
    }

    /// Fetch a type by name and namespace, applying the optional flag.
    ///
    /// Built-in primitive names in the 🔴 namespace resolve before the
    /// package map is consulted.
    pub fn fetch_raw_type(
        &self,
        package: PackageId,
        namespace: Glyph,
        name: Glyph,
        optional: bool,
    ) -> Option<Type> {
        if namespace == glyphs::GLOBAL_NAMESPACE {
            if let Some(primitive) = builtin_type(name) {
                return Some(primitive.with_optional(optional));
            }
        }
        self.package(package)
            .types
            .get(&(namespace, name))
            .map(|ty| ty.with_optional(optional))
    }

    // Definition arenas.

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.packages[def.package.0 as usize].classes.push(id);
        self.classes.push(def);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0 as usize]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn add_protocol(&mut self, def: ProtocolDef) -> ProtocolId {
        let id = ProtocolId(self.protocols.len() as u32);
        self.packages[def.package.0 as usize].protocols.push(id);
        self.protocols.push(def);
        id
    }

    pub fn protocol(&self, id: ProtocolId) -> &ProtocolDef {
        &self.protocols[id.0 as usize]
    }

    pub fn protocol_mut(&mut self, id: ProtocolId) -> &mut ProtocolDef {
        &mut self.protocols[id.0 as usize]
    }

    pub fn add_enum(&mut self, def: EnumDef) -> EnumId {
        let id = EnumId(self.enums.len() as u32);
        self.packages[def.package.0 as usize].enums.push(id);
        self.enums.push(def);
        id
    }

    pub fn enumeration(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0 as usize]
    }

    pub fn enumeration_mut(&mut self, id: EnumId) -> &mut EnumDef {
        &mut self.enums[id.0 as usize]
    }

    pub fn add_value_type(&mut self, def: ValueTypeDef) -> ValueTypeId {
        let id = ValueTypeId(self.value_types.len() as u32);
        self.value_types.push(def);
        id
    }

    pub fn value_type(&self, id: ValueTypeId) -> &ValueTypeDef {
        &self.value_types[id.0 as usize]
    }

    pub fn add_function(&mut self, def: FunctionDef) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(def);
        id
    }

    pub fn function(&self, id: FunctionId) -> &FunctionDef {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionDef {
        &mut self.functions[id.0 as usize]
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> {
        (0..self.functions.len() as u32).map(FunctionId)
    }

    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    // Hierarchy walks.

    /// Find a member in a class's tables, walking the hierarchy from the
    /// most-derived class upward.
    ///
    /// Returns the defining class along with the function, so the caller
    /// can resolve the signature in the right context.
    pub fn class_member(
        &self,
        class: ClassId,
        name: Glyph,
        table: MethodTable,
    ) -> Option<(ClassId, FunctionId)> {
        let mut current = Some(class);
        while let Some(id) = current {
            let def = self.class(id);
            let list = match table {
                MethodTable::Methods => &def.methods,
                MethodTable::ClassMethods => &def.class_methods,
                MethodTable::Initializers => &def.initializers,
            };
            if let Some(&function) = list.iter().find(|f| self.function(**f).name == name) {
                return Some((id, function));
            }
            current = def.superclass;
        }
        None
    }

    pub fn protocol_method(&self, protocol: ProtocolId, name: Glyph) -> Option<FunctionId> {
        self.protocol(protocol)
            .methods
            .iter()
            .copied()
            .find(|f| self.function(*f).name == name)
    }

    pub fn value_type_method(&self, value_type: ValueTypeId, name: Glyph) -> Option<FunctionId> {
        self.value_type(value_type)
            .methods
            .iter()
            .copied()
            .find(|f| self.function(*f).name == name)
    }

    /// The value-type table backing a primitive type, if any.
    pub fn primitive_value_type(&self, kind: &TypeKind) -> Option<ValueTypeId> {
        match kind {
            TypeKind::Integer => Some(self.builtins.integer),
            TypeKind::Double => Some(self.builtins.double),
            TypeKind::Boolean => Some(self.builtins.boolean),
            TypeKind::Symbol => Some(self.builtins.symbol),
            TypeKind::Byte => Some(self.builtins.byte),
            TypeKind::ValueType(id) => Some(*id),
            _ => None,
        }
    }

    /// Resolve the receiver type up the hierarchy to `ancestor`,
    /// substituting generic arguments through each superclass
    /// application.
    ///
    /// Returns `None` if `ancestor` is not in the receiver's lineage.
    pub fn context_for_ancestor(&self, receiver: &Type, ancestor: ClassId) -> Option<Type> {
        let mut current = receiver.clone();
        loop {
            let id = current.class_id()?;
            if id == ancestor {
                return Some(current);
            }
            let def = self.class(id);
            let superclass = def.superclass?;
            let args = def
                .super_generic_args
                .iter()
                .map(|arg| arg.resolve_on(&current))
                .collect();
            current = Type::class(superclass, args);
        }
    }

    /// Whether following superclass links from `class` ever revisits a
    /// class. Cycles are forbidden.
    pub fn has_inheritance_cycle(&self, class: ClassId) -> bool {
        let mut slow = Some(class);
        let mut fast = self.class(class).superclass;
        while let (Some(s), Some(f)) = (slow, fast) {
            if s == f {
                return true;
            }
            slow = self.class(s).superclass;
            fast = self
                .class(f)
                .superclass
                .and_then(|next| self.class(next).superclass);
        }
        false
    }

    // Bootstrap.

    fn register_primitive_value_types(&mut self, package: PackageId, pool: &StringPool) {
        let other = pool.pool("other");
        let integer = self.primitive_table(
            package,
            glyphs::INTEGER,
            other,
            &[
                (glyphs::ADD, Type::integer(), Type::integer()),
                (glyphs::SUBTRACT, Type::integer(), Type::integer()),
                (glyphs::MULTIPLY, Type::integer(), Type::integer()),
                (glyphs::DIVIDE, Type::integer(), Type::integer()),
                (glyphs::REMAINDER, Type::integer(), Type::integer()),
                (glyphs::LESS, Type::integer(), Type::boolean()),
                (glyphs::GREATER, Type::integer(), Type::boolean()),
                (glyphs::EQUAL, Type::integer(), Type::boolean()),
            ],
        );
        let double = self.primitive_table(
            package,
            glyphs::DOUBLE,
            other,
            &[
                (glyphs::ADD, Type::double(), Type::double()),
                (glyphs::SUBTRACT, Type::double(), Type::double()),
                (glyphs::MULTIPLY, Type::double(), Type::double()),
                (glyphs::DIVIDE, Type::double(), Type::double()),
                (glyphs::LESS, Type::double(), Type::boolean()),
                (glyphs::GREATER, Type::double(), Type::boolean()),
                (glyphs::EQUAL, Type::double(), Type::boolean()),
            ],
        );
        let boolean = self.primitive_table(
            package,
            glyphs::BOOLEAN,
            other,
            &[
                (glyphs::AND, Type::boolean(), Type::boolean()),
                (glyphs::OR, Type::boolean(), Type::boolean()),
                (glyphs::EQUAL, Type::boolean(), Type::boolean()),
            ],
        );
        let symbol = self.primitive_table(
            package,
            glyphs::SYMBOL,
            other,
            &[(glyphs::EQUAL, Type::symbol(), Type::boolean())],
        );
        let byte = self.primitive_table(
            package,
            glyphs::BYTE,
            other,
            &[(glyphs::EQUAL, Type::byte(), Type::boolean())],
        );
        self.builtins.integer = integer;
        self.builtins.double = double;
        self.builtins.boolean = boolean;
        self.builtins.symbol = symbol;
        self.builtins.byte = byte;
    }

    /// The classes backing string, list and dictionary literals.
    fn register_literal_classes(&mut self, package: PackageId, pool: &StringPool) {
        let element = pool.pool("Element");
        let string_class = self.literal_class(package, Glyph('🔡'), &[]);
        let list_class = self.literal_class(package, glyphs::LIST, &[element]);
        let dictionary_class = self.literal_class(package, glyphs::DICTIONARY, &[element]);
        self.builtins.string_class = string_class;
        self.builtins.list_class = list_class;
        self.builtins.dictionary_class = dictionary_class;
    }

    fn literal_class(
        &mut self,
        package: PackageId,
        name: Glyph,
        generic_names: &[Name],
    ) -> ClassId {
        let generic_parameters = generic_names
            .iter()
            .map(|name| crate::GenericParameter {
                name: *name,
                parsed_constraint: None,
                constraint: Type::something(),
            })
            .collect::<Vec<_>>();
        let args = generic_parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| Type::generic_variable(index as u16, false, parameter.name))
            .collect::<Vec<_>>();
        let id = self.add_class(ClassDef {
            name,
            namespace: glyphs::GLOBAL_NAMESPACE,
            package,
            position: SourcePosition::generated(),
            documentation: None,
            exported: true,
            generic_parameters,
            superclass: None,
            super_generic_args: Vec::new(),
            parsed_superclass: None,
            instance_variables: Vec::new(),
            protocols: Vec::new(),
            parsed_protocols: Vec::new(),
            methods: Vec::new(),
            class_methods: Vec::new(),
            initializers: Vec::new(),
            boxing_layers: Vec::new(),
        });
        // Shadowing a builtin name is impossible: registration of a
        // duplicate is an error, and these run first.
        let _ = self.register_type(
            package,
            glyphs::GLOBAL_NAMESPACE,
            name,
            Type::class(id, args),
            true,
            SourcePosition::generated(),
        );
        id
    }

    fn primitive_table(
        &mut self,
        package: PackageId,
        name: Glyph,
        parameter_name: Name,
        operators: &[(Glyph, Type, Type)],
    ) -> ValueTypeId {
        let id = self.add_value_type(ValueTypeDef {
            name,
            namespace: glyphs::GLOBAL_NAMESPACE,
            package,
            methods: Vec::new(),
        });
        let owner = Type::value_type(id, Vec::new());
        let mut methods = Vec::with_capacity(operators.len());
        for (operator, operand, result) in operators {
            methods.push(self.add_function(FunctionDef {
                name: *operator,
                kind: FunctionKind::ValueTypeMethod,
                owner: owner.clone(),
                package,
                position: SourcePosition::generated(),
                documentation: None,
                access: AccessLevel::Public,
                modifiers: FunctionModifiers::FINAL,
                generic_parameters: Vec::new(),
                parameters: vec![Parameter {
                    name: parameter_name,
                    parsed: None,
                    ty: operand.clone(),
                    escaping: false,
                    position: SourcePosition::generated(),
                }],
                parsed_return: None,
                return_type: result.clone(),
                body: None,
                variable_ceiling: 0,
                boxing: None,
            }));
        }
        self.value_types[id.0 as usize].methods = methods;
        id
    }
}

/// Built-in type names in the 🔴 namespace.
fn builtin_type(name: Glyph) -> Option<Type> {
    match name {
        _ if name == glyphs::INTEGER => Some(Type::integer()),
        _ if name == glyphs::DOUBLE => Some(Type::double()),
        _ if name == glyphs::BOOLEAN => Some(Type::boolean()),
        _ if name == glyphs::SYMBOL => Some(Type::symbol()),
        _ if name == glyphs::BYTE => Some(Type::byte()),
        _ if name == glyphs::SOMETHING => Some(Type::something()),
        _ if name == glyphs::SOMEOBJECT => Some(Type::someobject()),
        _ if name == glyphs::NOTHINGNESS => Some(Type::nothingness()),
        _ => None,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_package_loading_is_idempotent() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let name = pool.pool("files");
        let first = registry.load_package(name);
        let second = registry.load_package(name);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let package = registry.load_package(pool.pool("files"));
        let position = SourcePosition::generated();
        let name = Glyph('🗂');
        registry
            .register_type(
                package,
                glyphs::GLOBAL_NAMESPACE,
                name,
                Type::something(),
                false,
                position,
            )
            .unwrap();
        let err = registry
            .register_type(
                package,
                glyphs::GLOBAL_NAMESPACE,
                name,
                Type::something(),
                false,
                position,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::E2002);
    }

    #[test]
    fn test_lookup_round_trip() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let package = registry.load_package(pool.pool("files"));
        let name = Glyph('🗂');
        let ty = Type::someobject();
        registry
            .register_type(
                package,
                glyphs::GLOBAL_NAMESPACE,
                name,
                ty.clone(),
                false,
                SourcePosition::generated(),
            )
            .unwrap();
        assert_eq!(
            registry.fetch_raw_type(package, glyphs::GLOBAL_NAMESPACE, name, false),
            Some(ty)
        );
    }

    #[test]
    fn test_builtin_names_resolve() {
        let pool = StringPool::new();
        let mut registry = TypeRegistry::bootstrap(&pool);
        let package = registry.load_package(pool.pool("files"));
        assert_eq!(
            registry.fetch_raw_type(package, glyphs::GLOBAL_NAMESPACE, glyphs::INTEGER, true),
            Some(Type::integer().optionalized())
        );
    }

    #[test]
    fn test_operator_methods_exist_for_integer() {
        let pool = StringPool::new();
        let registry = TypeRegistry::bootstrap(&pool);
        let builtins = registry.builtins();
        let add = registry
            .value_type_method(builtins.integer, glyphs::ADD)
            .unwrap();
        assert_eq!(registry.function(add).return_type, Type::integer());
    }
}

//! Top-level declaration parsing.
//!
//! Reads a package document and registers skeleton declarations in the
//! session registry. Function bodies are skimmed and recorded as token
//! ranges; signature type-expressions go into the package's declaration
//! arena for later resolution. A failed declaration is recorded and the
//! parser recovers at the next top-level declaration.

use tracing::debug;

use moji_diagnostic::{CompilerError, ErrorCode};
use moji_ir::{
    glyphs, Ast, Glyph, Name, SourcePosition, TokenClass, TokenRange, TokenStream, TypeExprId,
};
use moji_types::{
    AccessLevel, ClassDef, ClassId, CompilerSession, EnumDef, FunctionDef, FunctionId,
    FunctionKind, FunctionModifiers, GenericParameter, InstanceVariable, PackageId, Parameter,
    ProtocolDef, ProtocolId, StartingFlag, Type, TypeKind, PackageVersion,
};

use crate::{parse_access_level, parse_type_name, token_error, ty::ParsedTypeName, Attribute};

/// A 📜 directive encountered while parsing.
///
/// The parser cannot lex files itself; the driver lexes the file and
/// re-enters declaration parsing with the same package.
#[derive(Clone, Debug)]
pub struct PendingLoad {
    pub path: Name,
    pub position: SourcePosition,
}

/// Glyphs that may start a top-level declaration; used for recovery.
const TOP_LEVEL: &[Glyph] = &[
    glyphs::PACKAGE,
    glyphs::PROTOCOL,
    glyphs::ENUM,
    glyphs::REQUIRE_BINARY,
    glyphs::VERSION,
    glyphs::EXTENSION,
    glyphs::CLASS,
    glyphs::LOAD_FILE,
    glyphs::EXPORTED,
];

/// Parses one document of a package.
pub struct DocumentParser<'s> {
    session: &'s mut CompilerSession,
    stream: TokenStream,
    package: PackageId,
    /// Declaration arena shared by every signature in the package.
    ast: &'s mut Ast,
    pending_loads: Vec<PendingLoad>,
}

impl<'s> DocumentParser<'s> {
    pub fn new(
        session: &'s mut CompilerSession,
        stream: TokenStream,
        package: PackageId,
        ast: &'s mut Ast,
    ) -> Self {
        DocumentParser {
            session,
            stream,
            package,
            ast,
            pending_loads: Vec::new(),
        }
    }

    /// Parse every top-level declaration.
    ///
    /// Errors are recorded in the session's diagnostics; parsing always
    /// reaches the end of the stream.
    pub fn parse(mut self) -> Vec<PendingLoad> {
        while self.stream.has_more() {
            if let Err(error) = self.parse_top_level_declaration() {
                self.session.diagnostics.error(error);
                self.recover_to_top_level();
            }
        }
        debug!(
            classes = self.session.registry.package(self.package).classes.len(),
            "parsed package document"
        );
        self.pending_loads
    }

    fn parse_top_level_declaration(&mut self) -> Result<(), CompilerError> {
        let documentation = self.parse_documentation()?;
        let exported = Attribute::parse(&mut self.stream, glyphs::EXPORTED)?;
        let token = self
            .stream
            .consume(TokenClass::Identifier)
            .map_err(token_error)?;
        let glyph = token.glyph().unwrap_or(Glyph(' '));

        if glyph == glyphs::PACKAGE {
            exported.disallow()?;
            let name = self.stream.consume(TokenClass::Variable).map_err(token_error)?;
            let namespace = self
                .stream
                .consume(TokenClass::Identifier)
                .map_err(token_error)?;
            let moji_ir::TokenKind::Variable(name) = name.kind else {
                unreachable!("consume checked the class");
            };
            let from = self.session.registry.load_package(name);
            let namespace = namespace.glyph().unwrap_or(glyphs::GLOBAL_NAMESPACE);
            self.session
                .registry
                .import_exports(self.package, from, namespace, token.position)?;
        } else if glyph == glyphs::PROTOCOL {
            self.parse_protocol(documentation, exported.is_set())?;
        } else if glyph == glyphs::ENUM {
            self.parse_enum(documentation, exported.is_set())?;
        } else if glyph == glyphs::REQUIRE_BINARY {
            exported.disallow()?;
            let package = self.session.registry.package(self.package);
            if self.session.pool.get(package.name) == self.session.options.main_package {
                return Err(CompilerError::new(
                    ErrorCode::E1008,
                    token.position,
                    format!(
                        "You may not set 📻 for the {} package.",
                        self.session.options.main_package
                    ),
                ));
            }
            self.session.registry.package_mut(self.package).requires_binary = true;
        } else if glyph == glyphs::VERSION {
            exported.disallow()?;
            self.parse_version(token.position)?;
        } else if glyph == glyphs::EXTENSION {
            exported.disallow()?;
            self.parse_extension()?;
        } else if glyph == glyphs::CLASS {
            self.parse_class(documentation, token.position, exported.is_set())?;
        } else if glyph == glyphs::LOAD_FILE {
            exported.disallow()?;
            let path = self.stream.consume(TokenClass::String).map_err(token_error)?;
            let moji_ir::TokenKind::String(path_name) = path.kind else {
                unreachable!("consume checked the class");
            };
            self.pending_loads.push(PendingLoad {
                path: path_name,
                position: path.position,
            });
        } else {
            return Err(CompilerError::new(
                ErrorCode::E1001,
                token.position,
                format!("Unexpected identifier {glyph}."),
            ));
        }
        Ok(())
    }

    // Utilities.

    fn parse_documentation(&mut self) -> Result<Option<Name>, CompilerError> {
        if matches!(
            self.stream.peek(),
            Some(token) if token.kind.class() == TokenClass::DocComment
        ) {
            let token = self
                .stream
                .consume(TokenClass::DocComment)
                .map_err(token_error)?;
            let moji_ir::TokenKind::DocComment(name) = token.kind else {
                unreachable!("consume checked the class");
            };
            return Ok(Some(name));
        }
        Ok(None)
    }

    /// Read and validate a name for a new type: it must not be optional
    /// and must not collide with an existing type.
    fn validate_new_type_name(&mut self) -> Result<ParsedTypeName, CompilerError> {
        let parsed = parse_type_name(&mut self.stream)?;
        if parsed.optional {
            return Err(CompilerError::new(
                ErrorCode::E1007,
                parsed.position,
                "🍬 cannot be declared as type.",
            ));
        }
        let namespace = parsed.namespace.unwrap_or(glyphs::GLOBAL_NAMESPACE);
        if self
            .session
            .registry
            .fetch_raw_type(self.package, namespace, parsed.name, false)
            .is_some()
        {
            return Err(CompilerError::new(
                ErrorCode::E2002,
                parsed.position,
                format!("Type {namespace}{} is already defined.", parsed.name),
            ));
        }
        Ok(parsed)
    }

    /// Parse `🐚 name Constraint` declarations.
    fn parse_generic_parameters(&mut self) -> Result<Vec<GenericParameter>, CompilerError> {
        let mut parameters = Vec::new();
        while self.stream.peek_is(glyphs::GENERICS) {
            self.stream
                .consume_identifier(glyphs::GENERICS)
                .map_err(token_error)?;
            let variable = self
                .stream
                .consume(TokenClass::Variable)
                .map_err(token_error)?;
            let moji_ir::TokenKind::Variable(name) = variable.kind else {
                unreachable!("consume checked the class");
            };
            let constraint = crate::parse_type_expr(&mut self.stream, self.ast)?;
            parameters.push(GenericParameter {
                name,
                parsed_constraint: Some(constraint),
                constraint: Type::something(),
            });
        }
        Ok(parameters)
    }

    /// Parse `name Type` parameter pairs.
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, CompilerError> {
        let mut parameters = Vec::new();
        while matches!(
            self.stream.peek(),
            Some(token) if token.kind.class() == TokenClass::Variable
        ) {
            let token = self
                .stream
                .consume(TokenClass::Variable)
                .map_err(token_error)?;
            let moji_ir::TokenKind::Variable(name) = token.kind else {
                unreachable!("consume checked the class");
            };
            let parsed = crate::parse_type_expr(&mut self.stream, self.ast)?;
            parameters.push(Parameter {
                name,
                parsed: Some(parsed),
                ty: Type::nothingness(),
                escaping: false,
                position: token.position,
            });
        }
        Ok(parameters)
    }

    fn parse_return_type(&mut self) -> Result<Option<TypeExprId>, CompilerError> {
        if self.stream.peek_is(glyphs::RETURN_TYPE) {
            self.stream
                .consume_identifier(glyphs::RETURN_TYPE)
                .map_err(token_error)?;
            return Ok(Some(crate::parse_type_expr(&mut self.stream, self.ast)?));
        }
        Ok(None)
    }

    /// Skim a 🍇…🍉 body, recording the tokens between the braces.
    fn parse_body_range(&mut self) -> Result<TokenRange, CompilerError> {
        let open = self
            .stream
            .consume_identifier(glyphs::GRAPES)
            .map_err(token_error)?;
        let start = self.stream.position();
        let mut depth = 1_u32;
        loop {
            let Some(token) = self.stream.advance() else {
                return Err(CompilerError::new(
                    ErrorCode::E1004,
                    open.position,
                    "Expected 🍉 but the file ended.",
                ));
            };
            match token.glyph() {
                Some(glyph) if glyph == glyphs::GRAPES => depth += 1,
                Some(glyph) if glyph == glyphs::WATERMELON => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(TokenRange::new(start, self.stream.position() - 1));
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip forward to the next plausible top-level declaration.
    fn recover_to_top_level(&mut self) {
        let mut depth = 0_i32;
        while let Some(token) = self.stream.peek() {
            if depth <= 0 {
                match token.kind {
                    moji_ir::TokenKind::DocComment(_) => return,
                    moji_ir::TokenKind::Identifier(glyph) if TOP_LEVEL.contains(&glyph) => return,
                    _ => {}
                }
            }
            let glyph = token.glyph();
            if glyph == Some(glyphs::GRAPES) {
                depth += 1;
            } else if glyph == Some(glyphs::WATERMELON) {
                depth -= 1;
            }
            self.stream.advance();
        }
    }

    // Declarations.

    fn parse_version(&mut self, position: SourcePosition) -> Result<(), CompilerError> {
        if self.session.registry.package(self.package).version.is_some() {
            return Err(CompilerError::new(
                ErrorCode::E1005,
                position,
                "Package version already declared.",
            ));
        }
        let major = self.stream.consume(TokenClass::Integer).map_err(token_error)?;
        let minor = self.stream.consume(TokenClass::Integer).map_err(token_error)?;
        let (moji_ir::TokenKind::Integer(major), moji_ir::TokenKind::Integer(minor)) =
            (major.kind, minor.kind)
        else {
            unreachable!("consume checked the classes");
        };
        let version = PackageVersion {
            major: u16::try_from(major).unwrap_or(0),
            minor: u16::try_from(minor).unwrap_or(0),
        };
        if !version.is_valid() {
            return Err(CompilerError::new(
                ErrorCode::E1005,
                position,
                "The provided package version is not valid.",
            ));
        }
        self.session.registry.package_mut(self.package).version = Some(version);
        Ok(())
    }

    fn parse_protocol(
        &mut self,
        documentation: Option<Name>,
        exported: bool,
    ) -> Result<(), CompilerError> {
        let name = self.validate_new_type_name()?;
        let generic_parameters = self.parse_generic_parameters()?;
        self.stream
            .consume_identifier(glyphs::GRAPES)
            .map_err(token_error)?;

        let namespace = name.namespace.unwrap_or(glyphs::GLOBAL_NAMESPACE);
        let id = self.session.registry.add_protocol(ProtocolDef {
            name: name.name,
            namespace,
            package: self.package,
            position: name.position,
            documentation,
            exported,
            generic_parameters,
            methods: Vec::new(),
            uses_self: false,
        });
        let raw = Type::protocol(id, self.self_arguments_protocol(id));
        self.session.registry.register_type(
            self.package,
            namespace,
            name.name,
            raw,
            exported,
            name.position,
        )?;

        let mut methods = Vec::new();
        while self.stream.peek_is_everything_but(glyphs::WATERMELON) {
            let documentation = self.parse_documentation()?;
            let deprecated = Attribute::parse(&mut self.stream, glyphs::DEPRECATED)?;
            let token = self
                .stream
                .consume(TokenClass::Identifier)
                .map_err(token_error)?;
            if token.glyph() != Some(glyphs::METHOD) {
                return Err(CompilerError::new(
                    ErrorCode::E1001,
                    token.position,
                    "Only method declarations are allowed inside a protocol.",
                ));
            }
            let method_name = self
                .stream
                .consume(TokenClass::Identifier)
                .map_err(token_error)?;
            let parameters = self.parse_parameters()?;
            let parsed_return = self.parse_return_type()?;
            let mut modifiers = FunctionModifiers::empty();
            if deprecated.is_set() {
                modifiers |= FunctionModifiers::DEPRECATED;
            }
            let owner = Type::protocol(id, self.self_arguments_protocol(id));
            methods.push(self.session.registry.add_function(FunctionDef {
                name: method_name.glyph().unwrap_or(Glyph(' ')),
                kind: FunctionKind::ProtocolMethod,
                owner,
                package: self.package,
                position: method_name.position,
                documentation,
                access: AccessLevel::Public,
                modifiers,
                generic_parameters: Vec::new(),
                parameters,
                parsed_return,
                return_type: Type::nothingness(),
                body: None,
                variable_ceiling: 0,
                boxing: None,
            }));
        }
        self.stream
            .consume_identifier(glyphs::WATERMELON)
            .map_err(token_error)?;
        self.session.registry.protocol_mut(id).methods = methods;
        Ok(())
    }

    fn parse_enum(
        &mut self,
        documentation: Option<Name>,
        exported: bool,
    ) -> Result<(), CompilerError> {
        let name = self.validate_new_type_name()?;
        let namespace = name.namespace.unwrap_or(glyphs::GLOBAL_NAMESPACE);
        let id = self.session.registry.add_enum(EnumDef {
            name: name.name,
            namespace,
            package: self.package,
            position: name.position,
            documentation,
            exported,
            values: Vec::new(),
        });
        self.session.registry.register_type(
            self.package,
            namespace,
            name.name,
            Type::enumeration(id),
            exported,
            name.position,
        )?;

        self.stream
            .consume_identifier(glyphs::GRAPES)
            .map_err(token_error)?;
        let mut values = Vec::new();
        while self.stream.peek_is_everything_but(glyphs::WATERMELON) {
            let token = self
                .stream
                .consume(TokenClass::Identifier)
                .map_err(token_error)?;
            let ordinal = values.len() as i64;
            values.push((token.glyph().unwrap_or(Glyph(' ')), ordinal));
        }
        self.stream
            .consume_identifier(glyphs::WATERMELON)
            .map_err(token_error)?;
        self.session.registry.enumeration_mut(id).values = values;
        Ok(())
    }

    fn parse_extension(&mut self) -> Result<(), CompilerError> {
        let name = parse_type_name(&mut self.stream)?;
        if name.optional {
            return Err(CompilerError::new(
                ErrorCode::E1007,
                name.position,
                "Optional types are not extendable.",
            ));
        }
        let namespace = name.namespace.unwrap_or(glyphs::GLOBAL_NAMESPACE);
        let Some(ty) = self
            .session
            .registry
            .fetch_raw_type(self.package, namespace, name.name, false)
        else {
            return Err(CompilerError::new(
                ErrorCode::E2001,
                name.position,
                "Class does not exist.",
            ));
        };
        let TypeKind::Class(class) = ty.kind() else {
            return Err(CompilerError::new(
                ErrorCode::E3010,
                name.position,
                "Only classes are extendable.",
            ));
        };
        self.parse_class_body(*class)
    }

    fn parse_class(
        &mut self,
        documentation: Option<Name>,
        position: SourcePosition,
        exported: bool,
    ) -> Result<(), CompilerError> {
        let name = self.validate_new_type_name()?;
        let namespace = name.namespace.unwrap_or(glyphs::GLOBAL_NAMESPACE);
        let generic_parameters = self.parse_generic_parameters()?;

        let parsed_superclass = if self.stream.peek_is(glyphs::GRAPES) {
            None
        } else {
            Some(crate::parse_type_expr(&mut self.stream, self.ast)?)
        };

        let id = self.session.registry.add_class(ClassDef {
            name: name.name,
            namespace,
            package: self.package,
            position,
            documentation,
            exported,
            generic_parameters,
            superclass: None,
            super_generic_args: Vec::new(),
            parsed_superclass,
            instance_variables: Vec::new(),
            protocols: Vec::new(),
            parsed_protocols: Vec::new(),
            methods: Vec::new(),
            class_methods: Vec::new(),
            initializers: Vec::new(),
            boxing_layers: Vec::new(),
        });
        let raw = Type::class(id, self.self_arguments_class(id));
        self.session.registry.register_type(
            self.package,
            namespace,
            name.name,
            raw,
            exported,
            name.position,
        )?;

        self.parse_class_body(id)
    }

    /// The raw registered type of a generic class refers to its own
    /// parameters, so use sites substitute their arguments positionally.
    fn self_arguments_class(&self, id: ClassId) -> Vec<Type> {
        self.session
            .registry
            .class(id)
            .generic_parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| Type::generic_variable(index as u16, false, parameter.name))
            .collect()
    }

    fn self_arguments_protocol(&self, id: ProtocolId) -> Vec<Type> {
        self.session
            .registry
            .protocol(id)
            .generic_parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| Type::generic_variable(index as u16, false, parameter.name))
            .collect()
    }

    fn parse_class_body(&mut self, class: ClassId) -> Result<(), CompilerError> {
        self.stream
            .consume_identifier(glyphs::GRAPES)
            .map_err(token_error)?;

        while self.stream.peek_is_everything_but(glyphs::WATERMELON) {
            self.parse_class_member(class)?;
        }
        self.stream
            .consume_identifier(glyphs::WATERMELON)
            .map_err(token_error)?;
        Ok(())
    }

    fn parse_class_member(&mut self, class: ClassId) -> Result<(), CompilerError> {
        let documentation = self.parse_documentation()?;
        let deprecated = Attribute::parse(&mut self.stream, glyphs::DEPRECATED)?;
        let final_ = Attribute::parse(&mut self.stream, glyphs::FINAL)?;
        let access = parse_access_level(&mut self.stream)?;
        let override_ = Attribute::parse(&mut self.stream, glyphs::OVERRIDE)?;
        let static_ = Attribute::parse(&mut self.stream, glyphs::CLASS)?;
        let required = Attribute::parse(&mut self.stream, glyphs::REQUIRED)?;
        let can_return_nothingness =
            Attribute::parse(&mut self.stream, glyphs::CAN_RETURN_NOTHINGNESS)?;

        let token = self
            .stream
            .consume(TokenClass::Identifier)
            .map_err(token_error)?;
        let glyph = token.glyph().unwrap_or(Glyph(' '));

        if glyph == glyphs::INSTANCE_VARIABLE {
            static_.disallow()?;
            override_.disallow()?;
            final_.disallow()?;
            required.disallow()?;
            can_return_nothingness.disallow()?;
            deprecated.disallow()?;

            let variable = self
                .stream
                .consume(TokenClass::Variable)
                .map_err(token_error)?;
            let moji_ir::TokenKind::Variable(name) = variable.kind else {
                unreachable!("consume checked the class");
            };
            let parsed = crate::parse_type_expr(&mut self.stream, self.ast)?;
            self.session
                .registry
                .class_mut(class)
                .instance_variables
                .push(InstanceVariable {
                    name,
                    parsed,
                    ty: None,
                    position: variable.position,
                });
        } else if glyph == glyphs::PROTOCOL {
            static_.disallow()?;
            override_.disallow()?;
            final_.disallow()?;
            required.disallow()?;
            can_return_nothingness.disallow()?;
            deprecated.disallow()?;

            let parsed = crate::parse_type_expr(&mut self.stream, self.ast)?;
            self.session
                .registry
                .class_mut(class)
                .parsed_protocols
                .push(parsed);
        } else if glyph == glyphs::METHOD {
            required.disallow()?;
            can_return_nothingness.disallow()?;
            self.parse_method(
                class,
                documentation,
                access,
                deprecated.is_set(),
                final_.is_set(),
                override_.is_set(),
                static_.is_set(),
            )?;
        } else if glyph == glyphs::INITIALIZER {
            static_.disallow()?;
            self.parse_initializer(
                class,
                documentation,
                access,
                deprecated.is_set(),
                final_.is_set(),
                override_.is_set(),
                required.is_set(),
                can_return_nothingness.is_set(),
            )?;
        } else {
            return Err(CompilerError::new(
                ErrorCode::E1001,
                token.position,
                format!("Unexpected identifier {glyph}."),
            ));
        }
        Ok(())
    }

    #[expect(clippy::too_many_arguments, reason = "One flag per member attribute")]
    fn parse_method(
        &mut self,
        class: ClassId,
        documentation: Option<Name>,
        access: AccessLevel,
        deprecated: bool,
        final_: bool,
        override_: bool,
        static_: bool,
    ) -> Result<(), CompilerError> {
        let method_name = self
            .stream
            .consume(TokenClass::Identifier)
            .map_err(token_error)?;
        let name = method_name.glyph().unwrap_or(Glyph(' '));
        if !static_ && name.is_reserved() {
            return Err(CompilerError::new(
                ErrorCode::E1006,
                method_name.position,
                format!("{name} is reserved and cannot be used as method name."),
            ));
        }

        let generic_parameters = self.parse_generic_parameters()?;
        let parameters = self.parse_parameters()?;
        let parsed_return = self.parse_return_type()?;
        let body = self.parse_body_range()?;

        let mut modifiers = FunctionModifiers::empty();
        if deprecated {
            modifiers |= FunctionModifiers::DEPRECATED;
        }
        if final_ {
            modifiers |= FunctionModifiers::FINAL;
        }
        if override_ {
            modifiers |= FunctionModifiers::OVERRIDE;
        }

        let owner = self.class_self_type(class);
        let function = self.session.registry.add_function(FunctionDef {
            name,
            kind: if static_ {
                FunctionKind::ClassMethod
            } else {
                FunctionKind::Method
            },
            owner,
            package: self.package,
            position: method_name.position,
            documentation,
            access,
            modifiers,
            generic_parameters,
            parameters,
            parsed_return,
            return_type: Type::nothingness(),
            body: Some(body),
            variable_ceiling: 0,
            boxing: None,
        });

        if static_ {
            if name == glyphs::STARTING_FLAG {
                self.record_starting_flag(class, function, method_name.position)?;
            }
            self.session.registry.class_mut(class).class_methods.push(function);
        } else {
            self.session.registry.class_mut(class).methods.push(function);
        }
        Ok(())
    }

    fn record_starting_flag(
        &mut self,
        class: ClassId,
        function: FunctionId,
        position: SourcePosition,
    ) -> Result<(), CompilerError> {
        if let Some(existing) = self.session.registry.starting_flag {
            let previous = self.session.registry.class(existing.class).name;
            return Err(CompilerError::new(
                ErrorCode::E4002,
                position,
                format!(
                    "Duplicate 🏁 method. Previous 🏁 method was defined in class {previous}."
                ),
            ));
        }
        self.session.registry.starting_flag = Some(StartingFlag { class, function });
        Ok(())
    }

    #[expect(clippy::too_many_arguments, reason = "One flag per member attribute")]
    fn parse_initializer(
        &mut self,
        class: ClassId,
        documentation: Option<Name>,
        access: AccessLevel,
        deprecated: bool,
        final_: bool,
        override_: bool,
        required: bool,
        can_return_nothingness: bool,
    ) -> Result<(), CompilerError> {
        let name_token = self
            .stream
            .consume(TokenClass::Identifier)
            .map_err(token_error)?;
        let parameters = self.parse_parameters()?;
        let body = self.parse_body_range()?;

        let mut modifiers = FunctionModifiers::RETURNS_SELF;
        if deprecated {
            modifiers |= FunctionModifiers::DEPRECATED;
        }
        if final_ {
            modifiers |= FunctionModifiers::FINAL;
        }
        if override_ {
            modifiers |= FunctionModifiers::OVERRIDE;
        }
        if required {
            modifiers |= FunctionModifiers::REQUIRED;
        }
        if can_return_nothingness {
            modifiers |= FunctionModifiers::CAN_RETURN_NOTHINGNESS;
        }

        let owner = self.class_self_type(class);
        let function = self.session.registry.add_function(FunctionDef {
            name: name_token.glyph().unwrap_or(Glyph(' ')),
            kind: FunctionKind::Initializer,
            owner,
            package: self.package,
            position: name_token.position,
            documentation,
            access,
            modifiers,
            generic_parameters: Vec::new(),
            parameters,
            parsed_return: None,
            return_type: Type::nothingness(),
            body: Some(body),
            variable_ceiling: 0,
            boxing: None,
        });
        self.session.registry.class_mut(class).initializers.push(function);
        Ok(())
    }

    /// The owner type of a member: the class applied with its own
    /// generic variables.
    fn class_self_type(&self, class: ClassId) -> Type {
        Type::class(class, self.self_arguments_class(class))
    }
}

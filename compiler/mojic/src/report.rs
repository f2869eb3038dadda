//! JSON package reporting.
//!
//! Produces one JSON document per package, describing its classes,
//! enums and protocols with their procedures and documentation.

use serde::Serialize;

use moji_types::{
    CompilerSession, EnumId, FunctionDef, FunctionId, FunctionModifiers, PackageId, ProtocolId,
    Type, TypeKind,
};

#[derive(Serialize)]
struct PackageReport {
    classes: Vec<ClassReport>,
    enums: Vec<EnumReport>,
    protocols: Vec<ProtocolReport>,
}

#[derive(Serialize)]
struct TypeReport {
    package: String,
    name: String,
    optional: bool,
}

#[derive(Serialize)]
struct SuperclassReport {
    package: String,
    name: String,
}

#[derive(Serialize)]
struct ArgumentReport {
    name: String,
    #[serde(rename = "type")]
    ty: TypeReport,
}

#[derive(Serialize)]
struct ProcedureReport {
    name: String,
    #[serde(rename = "returnType", skip_serializing_if = "Option::is_none")]
    return_type: Option<TypeReport>,
    arguments: Vec<ArgumentReport>,
    #[serde(rename = "canReturnNothingness", skip_serializing_if = "Option::is_none")]
    can_return_nothingness: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
}

#[derive(Serialize)]
struct ClassReport {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    superclass: Option<SuperclassReport>,
    methods: Vec<ProcedureReport>,
    initializers: Vec<ProcedureReport>,
    #[serde(rename = "classMethods")]
    class_methods: Vec<ProcedureReport>,
    #[serde(rename = "conformsTo")]
    conforms_to: Vec<TypeReport>,
}

#[derive(Serialize)]
struct EnumReport {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
    values: Vec<String>,
}

#[derive(Serialize)]
struct ProtocolReport {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
    methods: Vec<ProcedureReport>,
}

/// Render the report document for one package.
pub fn report_package(session: &CompilerSession, package: PackageId) -> String {
    let reporter = Reporter { session };
    let report = PackageReport {
        classes: session
            .registry
            .package(package)
            .classes
            .iter()
            .map(|class| reporter.class(*class))
            .collect(),
        enums: session
            .registry
            .package(package)
            .enums
            .iter()
            .map(|id| reporter.enumeration(*id))
            .collect(),
        protocols: session
            .registry
            .package(package)
            .protocols
            .iter()
            .map(|id| reporter.protocol(*id))
            .collect(),
    };
    serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
}

struct Reporter<'a> {
    session: &'a CompilerSession,
}

impl Reporter<'_> {
    fn class(&self, class: moji_types::ClassId) -> ClassReport {
        let registry = &self.session.registry;
        let def = registry.class(class);
        ClassReport {
            name: def.name.to_string(),
            documentation: def.documentation.map(|d| self.session.pool.get(d)),
            superclass: def.superclass.map(|superclass| {
                let superclass = registry.class(superclass);
                SuperclassReport {
                    package: self.session.pool.get(registry.package(superclass.package).name),
                    name: superclass.name.to_string(),
                }
            }),
            methods: self.procedures(&def.methods, false),
            initializers: self.procedures(&def.initializers, true),
            class_methods: self.procedures(&def.class_methods, false),
            conforms_to: def.protocols.iter().map(|ty| self.type_report(ty)).collect(),
        }
    }

    fn enumeration(&self, id: EnumId) -> EnumReport {
        let def = self.session.registry.enumeration(id);
        EnumReport {
            name: def.name.to_string(),
            documentation: def.documentation.map(|d| self.session.pool.get(d)),
            values: def.values.iter().map(|(glyph, _)| glyph.to_string()).collect(),
        }
    }

    fn protocol(&self, id: ProtocolId) -> ProtocolReport {
        let def = self.session.registry.protocol(id);
        ProtocolReport {
            name: def.name.to_string(),
            documentation: def.documentation.map(|d| self.session.pool.get(d)),
            methods: self.procedures(&def.methods, false),
        }
    }

    fn procedures(&self, functions: &[FunctionId], initializers: bool) -> Vec<ProcedureReport> {
        functions
            .iter()
            .map(|function| self.procedure(self.session.registry.function(*function), initializers))
            .collect()
    }

    fn procedure(&self, def: &FunctionDef, initializer: bool) -> ProcedureReport {
        let can_return_nothingness = def
            .modifiers
            .contains(FunctionModifiers::CAN_RETURN_NOTHINGNESS);
        ProcedureReport {
            name: def.name.to_string(),
            return_type: if initializer {
                None
            } else {
                Some(self.type_report(&def.return_type))
            },
            arguments: def
                .parameters
                .iter()
                .map(|parameter| ArgumentReport {
                    name: self.session.pool.get(parameter.name),
                    ty: self.type_report(&parameter.ty),
                })
                .collect(),
            can_return_nothingness: (initializer && can_return_nothingness).then_some(true),
            documentation: def.documentation.map(|d| self.session.pool.get(d)),
        }
    }

    /// Types serialise as `{"package", "name", "optional"}`.
    fn type_report(&self, ty: &Type) -> TypeReport {
        let registry = &self.session.registry;
        let package = match ty.kind() {
            TypeKind::Class(id) => Some(registry.class(*id).package),
            TypeKind::Protocol(id) => Some(registry.protocol(*id).package),
            TypeKind::Enum(id) => Some(registry.enumeration(*id).package),
            TypeKind::ValueType(id) => Some(registry.value_type(*id).package),
            _ => None,
        };
        TypeReport {
            package: package
                .map(|id| self.session.pool.get(registry.package(id).name))
                .unwrap_or_else(|| "_".to_string()),
            name: ty.to_string(registry, &self.session.pool, false),
            optional: ty.optional(),
        }
    }
}

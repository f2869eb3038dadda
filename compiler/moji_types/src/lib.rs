//! Type system and symbol registry for the Moji compiler.
//!
//! The registry owns every named declaration (classes, protocols, enums,
//! value types, functions) in flat arenas; the rest of the compiler holds
//! plain index handles, so cyclic shapes (class ↔ method ↔ owner) never
//! turn into ownership cycles. [`Type`] values are small tagged variants
//! carrying those handles plus the `optional`/`meta` modifiers and the
//! generic-argument list.
//!
//! There are no process-wide singletons: all mutable compilation state
//! lives in a [`CompilerSession`] value that the driver passes to every
//! phase.

mod common_type;
mod compatibility;
mod defs;
mod dynamism;
mod registry;
mod resolve;
mod session;
mod ty;

pub use common_type::CommonTypeFinder;
pub use defs::{
    AccessLevel, BoxingInfo, ClassDef, ClassId, EnumDef, EnumId, FunctionDef, FunctionId,
    FunctionKind, FunctionModifiers, GenericParameter, InstanceVariable, MethodTable, PackageId,
    Parameter, ProtocolDef, ProtocolId, ValueTypeDef, ValueTypeId,
};
pub use dynamism::TypeDynamism;
pub use registry::{Builtins, Package, PackageVersion, StartingFlag, TypeRegistry};
pub use resolve::{ResolutionContext, TypeResolver};
pub use session::{CompileOptions, CompilerSession};
pub use ty::{Type, TypeKind};

//! Type-expression nodes.
//!
//! Type syntax is parsed into these unresolved forms; resolution against
//! the symbol registry happens in a later phase, once every declaration
//! in the package is registered.

use crate::{ast::TypeExprId, ExprId, Glyph, Name, SourcePosition};

/// A parsed, unresolved type.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    /// Set by a 🍬 prefix.
    pub optional: bool,
    pub position: SourcePosition,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TypeExprKind {
    /// `[namespace] name [🐚 Type… 🍆]`
    Named {
        namespace: Option<Glyph>,
        name: Glyph,
        generic_args: Vec<TypeExprId>,
    },
    /// 🐕 in type position.
    ThisType,
    /// A variable token in type position; accepted only where the
    /// dynamism of the parse site allows generic variables.
    GenericVariable { name: Name },
    /// `🍇 Type… [➡ Type] 🍉`
    Callable {
        parameters: Vec<TypeExprId>,
        return_type: Option<TypeExprId>,
    },
    /// `🚨 Enum Type`
    Error {
        enumeration: TypeExprId,
        value: TypeExprId,
    },
    /// `🍱 Protocol… 🍆`
    MultiProtocol { protocols: Vec<TypeExprId> },
    /// `⬜ expr` — the type of a value; only valid in body positions
    /// where the dynamism allows the dynamic class type.
    TypeFromValue { value: ExprId },
    /// ⚫ — take the type from the expectation.
    Infer,
}

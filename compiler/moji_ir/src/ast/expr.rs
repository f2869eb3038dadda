//! Expression nodes.

use crate::{ast::TypeExprId, ExprId, Glyph, Name, SourcePosition};

/// An expression node.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: SourcePosition,
}

/// Every expression form the grammar produces, plus the implicit
/// conversion wrappers the semantic analyser inserts.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    IntegerLiteral(i64),
    DoubleLiteral(f64),
    BooleanLiteral(bool),
    /// 🔤…🔤; the payload is the pooled string.
    StringLiteral(Name),
    SymbolLiteral(char),
    /// ⚡
    NothingnessLiteral,
    /// 🍨 elements 🍆
    ListLiteral(Vec<ExprId>),
    /// 🍯 key value … 🍆
    DictionaryLiteral(Vec<(ExprId, ExprId)>),
    /// 🍪 parts 🍆
    Concatenate(Vec<ExprId>),
    /// 🐕
    This,
    GetVariable {
        name: Name,
    },
    /// `glyph receiver [🐚 Type… 🍆] arg… ❗`
    MethodCall {
        name: Glyph,
        receiver: ExprId,
        generic_args: Vec<TypeExprId>,
        args: Vec<ExprId>,
    },
    /// `🐿 glyph arg… ❗`
    SuperMethodCall {
        name: Glyph,
        args: Vec<ExprId>,
    },
    /// `🍩 glyph Type arg… ❗`
    TypeMethodCall {
        name: Glyph,
        callee: TypeExprId,
        args: Vec<ExprId>,
    },
    /// `🔷 Type glyph arg… ❗`
    Initialization {
        type_expr: TypeExprId,
        name: Glyph,
        args: Vec<ExprId>,
    },
    /// `⁉ callee arg… ❗`
    CallableCall {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    /// `🌶 glyph receiver`
    CaptureMethod {
        name: Glyph,
        receiver: ExprId,
    },
    BinaryOperator {
        operator: Glyph,
        left: ExprId,
        right: ExprId,
    },
    /// `🔲 value Type`
    Cast {
        value: ExprId,
        target: TypeExprId,
    },
    /// `🚥 value`
    IsError {
        value: ExprId,
    },
    /// `🍺 value`
    Unwrap {
        value: ExprId,
    },
    /// `⬛ Type`
    MetaTypeInstantiation {
        type_expr: TypeExprId,
    },
    /// `🔳 Type`
    TypeAsValue {
        type_expr: TypeExprId,
    },
    /// `⚖ Type`
    SizeOf {
        type_expr: TypeExprId,
    },
    /// `expr ➡ name`, valid only inside 🍊/🍋/🔁 conditions.
    ConditionalAssignment {
        name: Name,
        value: ExprId,
    },
    /// Implicit conversion inserted by the analyser; never parsed.
    Box {
        kind: BoxKind,
        value: ExprId,
    },
}

/// What an analyser-inserted [`ExprKind::Box`] node converts to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BoxKind {
    /// Autobox into the ⚪ uniform representation.
    ToSomething,
    /// Box a conforming instance behind a protocol dispatch table.
    ToProtocol,
    /// Widen a class instance to 🔵.
    ToSomeobject,
    /// Adapt a callable to a differently-shaped callable ABI.
    CallableThunk,
}

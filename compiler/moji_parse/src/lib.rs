//! Parsing for the Moji compiler.
//!
//! Two parsers share the glyph grammar:
//!
//! - [`DocumentParser`] reads a package's top-level declarations,
//!   registering skeletons in the session's registry. Function bodies
//!   are not parsed here; they are recorded as token ranges so that
//!   bodies only get parsed once every signature in the package is
//!   resolved (two-pass loading).
//! - [`parse_function_body`] turns one recorded body range into an AST
//!   arena.
//!
//! A parse error interrupts the declaration that raised it; the document
//! parser records the error and recovers at the next top-level
//! declaration, so one source file reports all its independent errors.

mod attributes;
mod body;
mod document;
mod error;
mod ty;

pub use attributes::{parse_access_level, Attribute};
pub use body::parse_function_body;
pub use document::{DocumentParser, PendingLoad};
pub use error::{describe_token, token_error};
pub use ty::{
    parse_generic_argument_list, parse_type_expr, parse_type_name, ParsedTypeName,
    NAMESPACE_PREFIX,
};

//! Code generation for the Moji compiler.
//!
//! The emitter itself is an external collaborator: this crate defines
//! the [`Builder`] interface it must provide and drives it by walking
//! analysed ASTs. Each statement emits zero or more instructions and
//! then releases the values flagged temporarily-scoped; method dispatch
//! selects between direct calls, virtual-table lookups, protocol-table
//! lookups and the callable-executor instruction.

mod builder;
mod function;
mod recording;
mod type_helper;

pub use builder::{BackendTypeId, BlockRef, Builder, Op, ValueId};
pub use function::{generate_boxing_layer, generate_function};
pub use recording::{Recorded, RecordingBuilder};
pub use type_helper::TypeHelper;

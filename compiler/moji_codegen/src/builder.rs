//! The instruction-builder interface.
//!
//! The compiler never emits bytes itself; it drives an opaque builder
//! supplied by the embedding process. Values, blocks and backend types
//! are opaque handles minted by the builder.

use moji_types::FunctionId;

/// Opaque handle to an emitted value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ValueId(pub u32);

/// Opaque handle to a basic block.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BlockRef(pub u32);

/// Opaque handle to a backend type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BackendTypeId(pub u32);

/// Named operations emitted through `create_instruction`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Op {
    /// Produce the ⚡ box.
    MakeNoValue,
    /// Wrap a value into the optional box.
    OptionalWrap,
    /// Whether an optional box holds a value.
    OptionalHasValue,
    /// Unwrap an optional box.
    UnwrapOptional,
    /// Wrap a success value into the error box.
    ErrorWrap,
    /// Build an error box from an enum tag.
    ErrorFromEnum,
    /// Whether an error box holds an error.
    IsError,
    /// Success value of an error box.
    ErrorValue,
    /// Box a value into the ⚪ representation.
    BoxToSomething,
    /// Unbox from the ⚪ representation.
    UnboxFromSomething,
    /// Box an instance behind a protocol dispatch table.
    BoxToProtocol,
    /// Widen a class instance to 🔵.
    PromoteToSomeobject,
    /// Apply a callable to its arguments.
    ExecuteCallable,
    /// Build a callable from a function and a captured receiver.
    CaptureCallable,
    /// Adapt a callable to another callable ABI.
    AdaptCallable,
    /// Virtual-table method dispatch.
    VirtualDispatch,
    /// Protocol-table method dispatch.
    ProtocolDispatch,
    /// Allocate a class instance.
    AllocateInstance,
    /// Runtime-checked cast.
    Cast,
    ListNew,
    ListAppend,
    DictionaryNew,
    DictionaryInsert,
    Concatenate,
    SizeOf,
    InstantiateMetaType,
    TypeAsValue,
    /// Load an instance variable by slot.
    LoadInstanceVariable,
    /// Store an instance variable by slot.
    StoreInstanceVariable,
    /// The current receiver.
    This,
    /// Iterator protocol lowering for 🔂.
    IteratorNew,
    IteratorHasNext,
    IteratorNext,
    /// Release a temporarily-scoped value.
    Release,
}

/// The consumed emitter interface.
///
/// Implementations are free to emit anything (LLVM-style IR, bytecode,
/// a recording for tests); the compiler only guarantees the order of
/// the calls.
pub trait Builder {
    fn create_ret(&mut self, value: ValueId);
    fn create_ret_void(&mut self);
    fn create_load(&mut self, ptr: ValueId) -> ValueId;
    fn create_store(&mut self, ptr: ValueId, value: ValueId);
    fn create_alloca(&mut self, ty: BackendTypeId) -> ValueId;
    fn create_br(&mut self, target: BlockRef);
    fn create_cond_br(&mut self, condition: ValueId, then_block: BlockRef, else_block: BlockRef);
    fn create_call(&mut self, function: FunctionId, args: &[ValueId]) -> ValueId;
    fn create_extract_value(&mut self, aggregate: ValueId, index: u32) -> ValueId;
    fn create_insert_value(&mut self, aggregate: ValueId, value: ValueId, index: u32) -> ValueId;
    fn create_instruction(&mut self, op: Op, operands: &[ValueId]) -> ValueId;

    fn create_block(&mut self) -> BlockRef;
    fn position_at_end(&mut self, block: BlockRef);

    // Typed constants.
    fn const_integer(&mut self, value: i64) -> ValueId;
    fn const_double(&mut self, value: f64) -> ValueId;
    fn const_boolean(&mut self, value: bool) -> ValueId;
    fn const_symbol(&mut self, value: char) -> ValueId;
    /// A string constant by its pool index.
    fn const_pooled_string(&mut self, index: u32) -> ValueId;
    /// A reference to a compiled function.
    fn const_function(&mut self, function: FunctionId) -> ValueId;

    /// The n-th parameter of the function being generated.
    fn parameter(&mut self, index: u32) -> ValueId;
}

//! A recording builder.
//!
//! Records every call it receives; tests assert on the recorded
//! sequence instead of inspecting an opaque backend.

use moji_types::FunctionId;

use crate::{BackendTypeId, BlockRef, Builder, Op, ValueId};

/// One recorded builder call.
#[derive(Clone, PartialEq, Debug)]
pub enum Recorded {
    Ret(ValueId),
    RetVoid,
    Load(ValueId),
    Store { ptr: ValueId, value: ValueId },
    Alloca(BackendTypeId),
    Br(BlockRef),
    CondBr(ValueId, BlockRef, BlockRef),
    Call(FunctionId, Vec<ValueId>),
    ExtractValue(ValueId, u32),
    InsertValue(ValueId, ValueId, u32),
    Instruction(Op, Vec<ValueId>),
    ConstInteger(i64),
    ConstDouble(f64),
    ConstBoolean(bool),
    ConstSymbol(char),
    ConstPooledString(u32),
    ConstFunction(FunctionId),
    Parameter(u32),
}

/// Builder that records instead of emitting.
#[derive(Default, Debug)]
pub struct RecordingBuilder {
    pub recorded: Vec<Recorded>,
    next_value: u32,
    next_block: u32,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// Recorded instructions of the given op.
    pub fn instructions(&self, op: Op) -> Vec<&Recorded> {
        self.recorded
            .iter()
            .filter(|recorded| matches!(recorded, Recorded::Instruction(o, _) if *o == op))
            .collect()
    }

    /// Recorded direct calls.
    pub fn calls(&self) -> Vec<FunctionId> {
        self.recorded
            .iter()
            .filter_map(|recorded| match recorded {
                Recorded::Call(function, _) => Some(*function),
                _ => None,
            })
            .collect()
    }
}

impl Builder for RecordingBuilder {
    fn create_ret(&mut self, value: ValueId) {
        self.recorded.push(Recorded::Ret(value));
    }

    fn create_ret_void(&mut self) {
        self.recorded.push(Recorded::RetVoid);
    }

    fn create_load(&mut self, ptr: ValueId) -> ValueId {
        self.recorded.push(Recorded::Load(ptr));
        self.next()
    }

    fn create_store(&mut self, ptr: ValueId, value: ValueId) {
        self.recorded.push(Recorded::Store { ptr, value });
    }

    fn create_alloca(&mut self, ty: BackendTypeId) -> ValueId {
        self.recorded.push(Recorded::Alloca(ty));
        self.next()
    }

    fn create_br(&mut self, target: BlockRef) {
        self.recorded.push(Recorded::Br(target));
    }

    fn create_cond_br(&mut self, condition: ValueId, then_block: BlockRef, else_block: BlockRef) {
        self.recorded
            .push(Recorded::CondBr(condition, then_block, else_block));
    }

    fn create_call(&mut self, function: FunctionId, args: &[ValueId]) -> ValueId {
        self.recorded.push(Recorded::Call(function, args.to_vec()));
        self.next()
    }

    fn create_extract_value(&mut self, aggregate: ValueId, index: u32) -> ValueId {
        self.recorded.push(Recorded::ExtractValue(aggregate, index));
        self.next()
    }

    fn create_insert_value(&mut self, aggregate: ValueId, value: ValueId, index: u32) -> ValueId {
        self.recorded
            .push(Recorded::InsertValue(aggregate, value, index));
        self.next()
    }

    fn create_instruction(&mut self, op: Op, operands: &[ValueId]) -> ValueId {
        self.recorded
            .push(Recorded::Instruction(op, operands.to_vec()));
        self.next()
    }

    fn create_block(&mut self) -> BlockRef {
        let block = BlockRef(self.next_block);
        self.next_block += 1;
        block
    }

    fn position_at_end(&mut self, _block: BlockRef) {}

    fn const_integer(&mut self, value: i64) -> ValueId {
        self.recorded.push(Recorded::ConstInteger(value));
        self.next()
    }

    fn const_double(&mut self, value: f64) -> ValueId {
        self.recorded.push(Recorded::ConstDouble(value));
        self.next()
    }

    fn const_boolean(&mut self, value: bool) -> ValueId {
        self.recorded.push(Recorded::ConstBoolean(value));
        self.next()
    }

    fn const_symbol(&mut self, value: char) -> ValueId {
        self.recorded.push(Recorded::ConstSymbol(value));
        self.next()
    }

    fn const_pooled_string(&mut self, index: u32) -> ValueId {
        self.recorded.push(Recorded::ConstPooledString(index));
        self.next()
    }

    fn const_function(&mut self, function: FunctionId) -> ValueId {
        self.recorded.push(Recorded::ConstFunction(function));
        self.next()
    }

    fn parameter(&mut self, index: u32) -> ValueId {
        self.recorded.push(Recorded::Parameter(index));
        self.next()
    }
}

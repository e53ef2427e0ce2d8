use crate::opcode::*;
use core::iter::repeat;
use ethereum_types::U256;
use std::ops::{Add, Mul};

/// Builder for raw, pre-conversion EVM bytecode: the byte stream
/// `crate::code::converter` consumes before it lowers base opcodes into
/// `Instruction` words and fuses peephole runs into super-instructions.
/// Only base opcodes (`OpCode::is_base`) have a raw-byte encoding here;
/// auxiliary and fused opcodes only exist after lowering and would panic
/// `opcode()` below if passed in.
///
/// Kept deliberately dumb: it emits exactly the bytes asked for, with no
/// knowledge of PUSH-operand widths beyond `pushv`/`pushb`'s own trimming, so
/// tests can also hand it the malformed/truncated sequences the converter
/// must tolerate (a trailing opcode that wants operand bytes past the end of
/// the buffer, for instance).
#[derive(Clone, Debug, PartialEq)]
pub struct Bytecode {
    raw: Vec<u8>,
}

impl Bytecode {
    pub const fn new() -> Self {
        Self { raw: Vec::new() }
    }

    pub fn append(mut self, bytes: impl IntoIterator<Item = u8>) -> Self {
        self.raw.extend(bytes);
        self
    }

    pub fn append_bc(mut self, other: impl Into<Self>) -> Self {
        self.raw.extend(other.into().build());
        self
    }

    /// Concatenates `n` copies of this sequence, e.g. for building a stream
    /// long enough to push the converter's super-instruction window past a
    /// fusible run without hand-writing every opcode.
    pub fn repeat(mut self, n: usize) -> Self {
        self.raw = repeat(self.raw.into_iter()).take(n).flatten().collect();
        self
    }

    /// Emits the shortest `PUSHn` that encodes `value`, trimming leading
    /// zero bytes the way `solc`-style bytecode does (and the converter's
    /// immediate-packing for fused `PUSH1_*` runs assumes).
    pub fn pushv(self, value: impl Into<U256>) -> Self {
        let value = value.into();
        let trimmed: Vec<u8> = <[u8; 32]>::from(value)
            .into_iter()
            .skip_while(|&v| v == 0)
            .collect();
        self.pushb(trimmed)
    }

    pub fn pushb(mut self, operand: impl IntoIterator<Item = u8>) -> Self {
        let mut operand: Vec<u8> = operand.into_iter().collect();
        if operand.is_empty() {
            operand.push(0);
        }
        self.raw.push((operand.len() + OpCode::PUSH1.to_usize() - 1) as u8);
        self.raw.append(&mut operand);
        self
    }

    /// Appends a base opcode's raw byte. Panics (in debug builds) if handed
    /// an auxiliary or fused opcode, since those never appear in an
    /// unconverted byte stream.
    pub fn opcode(mut self, opcode: OpCode) -> Self {
        debug_assert!(opcode.is_base(), "{opcode:?} has no raw-byte encoding");
        self.raw.push(opcode.to_u16() as u8);
        self
    }

    /// Emits a bare `JUMPDEST`, for marking the landing byte of a `jump`/
    /// `jumpi` target built elsewhere in the same fixture.
    pub fn jumpdest(self) -> Self {
        self.opcode(OpCode::JUMPDEST)
    }

    pub fn ret(self, offset: impl Into<U256>, size: impl Into<U256>) -> Self {
        self.pushv(size).pushv(offset).opcode(OpCode::RETURN)
    }

    pub fn mstore(self, offset: impl Into<U256>) -> Self {
        self.pushv(offset).opcode(OpCode::MSTORE)
    }

    pub fn mstore_value(self, offset: impl Into<U256>, value: impl Into<U256>) -> Self {
        self.pushv(value).pushv(offset).opcode(OpCode::MSTORE)
    }

    pub fn mstore8(self, offset: impl Into<U256>) -> Self {
        self.pushv(offset).opcode(OpCode::MSTORE8)
    }

    pub fn mstore8_value(self, offset: impl Into<U256>, value: impl Into<U256>) -> Self {
        self.pushv(value).pushv(offset).opcode(OpCode::MSTORE8)
    }

    /// Stores the top stack word to memory offset 0 and returns it, the
    /// shortest path from "one value on the stack" to "an observable
    /// output" that most handler tests want.
    pub fn ret_top(self) -> Self {
        self.mstore(0).ret(0, 0x20)
    }

    /// Raw `PUSHn target; JUMP`. The target is a raw byte offset into this
    /// same stream; it must land on a `JUMPDEST` once converted, or
    /// `op_jump` rejects it at run time.
    pub fn jump(self, target: impl Into<U256>) -> Self {
        self.pushv(target).opcode(OpCode::JUMP)
    }

    pub fn jumpi(self, target: impl Into<Bytecode>, condition: impl Into<Bytecode>) -> Self {
        self.append(condition.into().build())
            .append(target.into().build())
            .opcode(OpCode::JUMPI)
    }

    pub fn sstore(self, key: impl Into<U256>, value: impl Into<U256>) -> Self {
        self.pushv(value).pushv(key).opcode(OpCode::SSTORE)
    }

    pub fn sload(self, key: impl Into<U256>) -> Self {
        self.pushv(key).opcode(OpCode::SLOAD)
    }

    pub fn build(self) -> Vec<u8> {
        self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl From<U256> for Bytecode {
    fn from(value: U256) -> Self {
        Self::new().pushv(value)
    }
}

impl From<OpCode> for Bytecode {
    fn from(opcode: OpCode) -> Self {
        Self::new().opcode(opcode)
    }
}

impl<const N: usize> From<[u8; N]> for Bytecode {
    fn from(raw: [u8; N]) -> Self {
        Self { raw: raw.into() }
    }
}

impl From<Vec<u8>> for Bytecode {
    fn from(raw: Vec<u8>) -> Self {
        Self { raw }
    }
}

impl AsRef<[u8]> for Bytecode {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl IntoIterator for Bytecode {
    type Item = u8;
    type IntoIter = <Vec<u8> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.raw.into_iter()
    }
}

impl Mul<Bytecode> for usize {
    type Output = Bytecode;

    fn mul(self, rhs: Bytecode) -> Self::Output {
        repeat(rhs).take(self).fold(Bytecode::new(), Bytecode::append_bc)
    }
}

impl Mul<OpCode> for usize {
    type Output = Bytecode;

    fn mul(self, rhs: OpCode) -> Self::Output {
        self.mul(Bytecode::from(rhs))
    }
}

impl<T: Into<Bytecode>> Add<T> for Bytecode {
    type Output = Bytecode;

    fn add(self, rhs: T) -> Self::Output {
        self.append_bc(rhs)
    }
}

/// Fluent builder for the CALL-family stack layout (`do_call` in
/// `crate::instructions::call` expects its six-or-seven operands in exactly
/// this order, varying by whether `value` is meaningful for `op`).
pub struct CallInstruction {
    op: OpCode,
    address: U256,
    gas: U256,
    value: U256,
    input_offset: U256,
    input_size: U256,
    output_offset: U256,
    output_size: U256,
}

impl CallInstruction {
    fn new(op: OpCode, address: impl Into<U256>) -> Self {
        Self {
            op,
            address: address.into(),
            gas: U256::zero(),
            value: U256::zero(),
            input_offset: U256::zero(),
            input_size: U256::zero(),
            output_offset: U256::zero(),
            output_size: U256::zero(),
        }
    }

    pub fn call(address: impl Into<U256>) -> Self {
        Self::new(OpCode::CALL, address)
    }

    pub fn callcode(address: impl Into<U256>) -> Self {
        Self::new(OpCode::CALLCODE, address)
    }

    pub fn delegatecall(address: impl Into<U256>) -> Self {
        Self::new(OpCode::DELEGATECALL, address)
    }

    pub fn staticcall(address: impl Into<U256>) -> Self {
        Self::new(OpCode::STATICCALL, address)
    }

    pub fn opcode(&self) -> OpCode {
        self.op
    }

    pub fn gas(mut self, gas: impl Into<U256>) -> Self {
        self.gas = gas.into();
        self
    }

    /// No-op for `DELEGATECALL`/`STATICCALL`, which have no value slot on
    /// the stack; `From<CallInstruction>` below only emits it for
    /// `CALL`/`CALLCODE`.
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    pub fn input(mut self, offset: impl Into<U256>, size: impl Into<U256>) -> Self {
        self.input_offset = offset.into();
        self.input_size = size.into();
        self
    }

    pub fn output(mut self, offset: impl Into<U256>, size: impl Into<U256>) -> Self {
        self.output_offset = offset.into();
        self.output_size = size.into();
        self
    }
}

impl From<CallInstruction> for Bytecode {
    fn from(call: CallInstruction) -> Self {
        let has_value_slot = matches!(call.op, OpCode::CALL | OpCode::CALLCODE);
        let mut bc = Bytecode::new()
            .pushv(call.output_size)
            .pushv(call.output_offset)
            .pushv(call.input_size)
            .pushv(call.input_offset);
        if has_value_slot {
            bc = bc.pushv(call.value);
        }
        bc.pushv(call.address).pushv(call.gas).opcode(call.op)
    }
}

use crate::common::{CallParams, Status};
use arrayvec::ArrayVec;
use bytes::Bytes;
use ethereum_types::U256;

pub const STACK_LIMIT: usize = 1024;

/// The 256-bit word stack, 1024 slots deep.
///
/// Bounds are enforced by the interpreter's per-opcode precheck (see
/// [`crate::gas::stack_bounds`]), not by `Stack` itself: every method here
/// assumes the caller already knows the operation is in bounds, matching how
/// the rest of the dispatch loop is structured around a single upfront check.
#[derive(Clone, Debug, Default)]
pub struct Stack(ArrayVec<U256, STACK_LIMIT>);

impl Stack {
    pub const fn limit() -> usize {
        STACK_LIMIT
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn index_from_top(&self, n: usize) -> usize {
        self.0.len() - 1 - n
    }

    /// The `n`-th item from the top, `0` being the top itself.
    pub fn peek(&self, n: usize) -> U256 {
        self.0[self.index_from_top(n)]
    }

    pub fn peek_mut(&mut self, n: usize) -> &mut U256 {
        let i = self.index_from_top(n);
        &mut self.0[i]
    }

    pub fn push(&mut self, v: U256) {
        unsafe { self.0.push_unchecked(v) }
    }

    /// Checked push, for the handful of call sites outside the main
    /// dispatch loop that cannot rely on the upfront bounds precheck.
    pub fn try_push(&mut self, v: U256) -> bool {
        if self.0.len() >= STACK_LIMIT {
            return false;
        }
        self.push(v);
        true
    }

    pub fn pop(&mut self) -> U256 {
        self.0.pop().expect("stack underflow: caller must bounds-check before dispatch")
    }

    /// `DUPn`: duplicate the `n`-th item (1-indexed, as in the opcode name) to the top.
    pub fn dup(&mut self, n: usize) {
        let v = self.peek(n - 1);
        self.push(v);
    }

    /// `SWAPn`: exchange the top with the `n`-th item below it (1-indexed).
    pub fn swap(&mut self, n: usize) {
        let top = self.0.len() - 1;
        let other = self.index_from_top(n);
        self.0.swap(top, other);
    }
}

/// Hard ceiling on memory growth: `(2^32 - 1) * 32`, the largest byte offset
/// a 32-bit word count can address. Expansion requests beyond this are a
/// numeric-overflow failure, never an out-of-gas one, since no gas schedule
/// could ever afford them anyway.
pub const MAX_MEMORY_SIZE: u64 = 0x1FFF_FFFF_E0;

/// Byte-addressable, append-only (never shrinks) memory.
///
/// Growth and its gas accounting are split apart deliberately: `Memory` only
/// knows how to hold bytes, while the cost of growing it is computed by
/// [`crate::gas::memory_expansion_cost`] and charged by the calling
/// instruction, which is also the one tracking how much has been charged so far.
#[derive(Clone, Debug, Default)]
pub struct Memory(Vec<u8>);

impl Memory {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of 32-byte words needed to cover `[offset, offset + size)`, or
    /// `None` if that range overflows `u64` or exceeds [`MAX_MEMORY_SIZE`].
    pub fn words_needed(offset: u64, size: u64) -> Option<u64> {
        if size == 0 {
            return Some(0);
        }
        let end = offset.checked_add(size)?;
        if end > MAX_MEMORY_SIZE {
            return None;
        }
        Some((end + 31) / 32)
    }

    /// Grow to at least `words` words, zero-filling the new tail. A no-op if
    /// already that large or larger (memory never shrinks).
    pub fn resize_to_words(&mut self, words: u64) {
        let new_len = (words as usize) * 32;
        if new_len > self.0.len() {
            self.0.resize(new_len, 0);
        }
    }

    /// Read `size` bytes at `offset`. Caller must have already called
    /// [`Memory::resize_to_words`] to cover the range.
    pub fn get(&self, offset: usize, size: usize) -> &[u8] {
        &self.0[offset..offset + size]
    }

    pub fn get_word(&self, offset: usize) -> U256 {
        U256::from_big_endian(self.get(offset, 32))
    }

    pub fn set(&mut self, offset: usize, data: &[u8]) {
        self.0[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn set_byte(&mut self, offset: usize, b: u8) {
        self.0[offset] = b;
    }
}

/// A single call frame: the mutable state threaded through every opcode
/// handler for the duration of one [`crate::interpreter::run`] call.
#[derive(Debug)]
pub struct Frame {
    pub gas_left: i64,
    pub gas_refund: i64,
    pub stack: Stack,
    pub memory: Memory,
    /// Total gas already charged for the current memory size; instructions
    /// compare against this to charge only the marginal cost of growing it.
    pub memory_cost_charged: u64,
    pub pc: usize,
    pub status: Status,
    /// Output of the most recently completed nested call, readable via
    /// `RETURNDATASIZE`/`RETURNDATACOPY` until the next nested call overwrites it.
    pub return_data: Bytes,
    /// This frame's own output, set by `RETURN`/`REVERT` or a nested create's result.
    pub output_data: Bytes,
    pub params: CallParams,
    /// Lowered-index -> warm/cold bookkeeping lives on the host; this flag
    /// only tracks whether `SELFDESTRUCT` has already fired this frame, since
    /// a second self-destruct in the same frame is a no-op by spec.
    pub selfdestructed: bool,
}

impl Frame {
    pub fn new(params: CallParams) -> Self {
        let gas_left = params.gas;
        Self {
            gas_left,
            gas_refund: 0,
            stack: Stack::default(),
            memory: Memory::default(),
            memory_cost_charged: 0,
            pc: 0,
            status: Status::Running,
            return_data: Bytes::new(),
            output_data: Bytes::new(),
            params,
            selfdestructed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CallKind, Revision};
    use ethereum_types::Address;

    #[test]
    fn stack_push_pop_peek() {
        let mut stack = Stack::default();
        for item in [0xdeu64, 0xad, 0xbe, 0xef] {
            stack.push(item.into());
        }
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.peek(0), 0xef.into());
        assert_eq!(stack.pop(), 0xef.into());
        assert_eq!(stack.peek(0), 0xbe.into());
    }

    #[test]
    fn stack_dup_and_swap() {
        let mut stack = Stack::default();
        stack.push(1.into());
        stack.push(2.into());
        stack.push(3.into());
        stack.dup(3); // duplicate the bottom item
        assert_eq!(stack.peek(0), 1.into());
        stack.swap(1);
        assert_eq!(stack.peek(0), 3.into());
        assert_eq!(stack.peek(1), 1.into());
    }

    #[test]
    fn memory_grows_in_32_byte_words_and_zero_fills() {
        let mut mem = Memory::default();
        let words = Memory::words_needed(5, 10).unwrap();
        assert_eq!(words, 1);
        mem.resize_to_words(words);
        assert_eq!(mem.len(), 32);
        assert_eq!(mem.get(5, 10), &[0u8; 10][..]);
    }

    #[test]
    fn memory_never_shrinks() {
        let mut mem = Memory::default();
        mem.resize_to_words(4);
        assert_eq!(mem.len(), 128);
        mem.resize_to_words(1);
        assert_eq!(mem.len(), 128);
    }

    #[test]
    fn words_needed_rejects_overflowing_ranges() {
        assert!(Memory::words_needed(u64::MAX, 1).is_none());
        assert!(Memory::words_needed(0, MAX_MEMORY_SIZE + 1).is_none());
    }

    fn dummy_params() -> CallParams {
        CallParams {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            code: Bytes::new(),
            code_hash: None,
            input: Bytes::new(),
            gas: 1000,
            recipient: Address::zero(),
            sender: Address::zero(),
            origin: Address::zero(),
            coinbase: Address::zero(),
            value: U256::zero(),
            gas_price: U256::zero(),
            base_fee: U256::zero(),
            blob_base_fee: U256::zero(),
            block_number: 0,
            timestamp: 0,
            gas_limit: 0,
            prev_randao: U256::zero(),
            chain_id: U256::zero(),
            blob_hashes: vec![],
            revision: Revision::Cancun,
        }
    }

    #[test]
    fn frame_starts_with_full_gas_and_running_status() {
        let frame = Frame::new(dummy_params());
        assert_eq!(frame.gas_left, 1000);
        assert_eq!(frame.status, Status::Running);
    }
}

use crate::instruction::{unpack_immediate, Instruction};
use crate::state::Stack;
use ethereum_types::U256;

/// Reconstructs a `PUSHn` immediate from the instruction word plus its
/// trailing `DATA` words, which `code[pc+1..]` holds when `n > 2`.
pub(crate) fn push(stack: &mut Stack, instr: Instruction, data: &[Instruction], n: usize) {
    let words: Vec<u16> = data.iter().map(|d| d.arg()).collect();
    let bytes = unpack_immediate(instr.arg(), &words, n);
    let mut buf = [0u8; 32];
    buf[32 - n..].copy_from_slice(&bytes);
    stack.push(U256::from_big_endian(&buf));
}

pub(crate) fn dup(stack: &mut Stack, height: usize) {
    stack.dup(height);
}

pub(crate) fn swap(stack: &mut Stack, height: usize) {
    stack.swap(height);
}

pub(crate) fn pop(stack: &mut Stack) {
    stack.pop();
}

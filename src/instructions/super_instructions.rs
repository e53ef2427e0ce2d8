//! Handlers for fused multi-opcode peephole patterns (see
//! `crate::code::converter::match_super_instruction`). Each one reproduces
//! the exact stack/memory/control-flow effect of executing its base opcodes
//! in sequence; only the dispatch overhead is removed.

use crate::common::FailureReason;
use crate::instruction::{unpack_immediate, Instruction};
use crate::state::{Frame, Stack};
use ethereum_types::U256;

use super::control::op_jump;

fn push_bytes(instr: Instruction, data: &[Instruction], n: usize) -> U256 {
    let words: Vec<u16> = data.iter().map(|d| d.arg()).collect();
    let bytes = unpack_immediate(instr.arg(), &words, n);
    let mut buf = [0u8; 32];
    buf[32 - n..].copy_from_slice(&bytes);
    U256::from_big_endian(&buf)
}

pub(crate) fn push1_push1(stack: &mut Stack, instr: Instruction) {
    let hi = (instr.arg() >> 8) as u8;
    let lo = instr.arg() as u8;
    stack.push(U256::from(hi));
    stack.push(U256::from(lo));
}

pub(crate) fn swap1_pop(stack: &mut Stack) {
    stack.swap(1);
    stack.pop();
}

pub(crate) fn pop_pop(stack: &mut Stack) {
    stack.pop();
    stack.pop();
}

pub(crate) fn push2_jump(
    instr: Instruction,
    lowered: &[Instruction],
) -> Result<usize, FailureReason> {
    let dst = U256::from(instr.arg());
    op_jump(dst, lowered)
}

pub(crate) fn push2_jumpi(
    stack: &mut Stack,
    instr: Instruction,
    lowered: &[Instruction],
) -> Result<Option<usize>, FailureReason> {
    let cond = stack.pop();
    if cond.is_zero() {
        Ok(None)
    } else {
        Ok(Some(op_jump(U256::from(instr.arg()), lowered)?))
    }
}

pub(crate) fn swap2_swap1_pop_jump(
    stack: &mut Stack,
    lowered: &[Instruction],
) -> Result<usize, FailureReason> {
    stack.swap(2);
    stack.swap(1);
    stack.pop();
    let dst = stack.pop();
    op_jump(dst, lowered)
}

pub(crate) fn iszero_push2_jumpi(
    stack: &mut Stack,
    instr: Instruction,
    lowered: &[Instruction],
) -> Result<Option<usize>, FailureReason> {
    let a = stack.pop();
    if !a.is_zero() {
        Ok(None)
    } else {
        Ok(Some(op_jump(U256::from(instr.arg()), lowered)?))
    }
}

pub(crate) fn swap1_pop_swap2_swap1(stack: &mut Stack) {
    stack.swap(1);
    stack.pop();
    stack.swap(2);
    stack.swap(1);
}

pub(crate) fn pop_swap2_swap1_pop(stack: &mut Stack) {
    stack.pop();
    stack.swap(2);
    stack.swap(1);
    stack.pop();
}

pub(crate) fn and_swap1_pop_swap2_swap1(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.pop();
    stack.push(a & b);
    stack.swap(1);
    stack.pop();
    stack.swap(2);
    stack.swap(1);
}

pub(crate) fn push1_add(stack: &mut Stack, instr: Instruction) {
    let imm = U256::from(instr.arg() as u8);
    let a = stack.pop();
    stack.push(a.overflowing_add(imm).0);
}

pub(crate) fn push1_shl(stack: &mut Stack, instr: Instruction) {
    let shift = instr.arg() as u8;
    let value = stack.pop();
    let ret = if value.is_zero() || shift >= 256 {
        U256::zero()
    } else {
        value << shift as usize
    };
    stack.push(ret);
}

pub(crate) fn push1_dup1(stack: &mut Stack, instr: Instruction) {
    let imm = U256::from(instr.arg() as u8);
    stack.push(imm);
    stack.push(imm);
}

pub(crate) fn dup2_lt(stack: &mut Stack) {
    stack.dup(2);
    let a = stack.pop();
    let b = stack.pop();
    stack.push(if a < b { U256::one() } else { U256::zero() });
}

pub(crate) fn dup2_mstore(frame: &mut Frame) -> Result<(), FailureReason> {
    frame.stack.dup(2);
    let offset = frame.stack.pop();
    let value = frame.stack.pop();
    let region = super::memory::verify_memory_region(frame, offset, 32)?.unwrap();
    let mut b = [0u8; 32];
    value.to_big_endian(&mut b);
    frame.memory.set(region.offset, &b);
    Ok(())
}

pub(crate) fn swap2_swap1(stack: &mut Stack) {
    stack.swap(2);
    stack.swap(1);
}

pub(crate) fn swap2_pop(stack: &mut Stack) {
    stack.swap(2);
    stack.pop();
}

pub(crate) fn pop_jump(stack: &mut Stack, lowered: &[Instruction]) -> Result<usize, FailureReason> {
    stack.pop();
    let dst = stack.pop();
    op_jump(dst, lowered)
}

pub(crate) fn push1_push4_dup3(stack: &mut Stack, instr: Instruction, data: &[Instruction]) {
    let hi = (instr.arg() >> 8) as u8;
    let push4_hi_byte = instr.arg() as u8;
    let tail = unpack_immediate(0, &data.iter().map(|d| d.arg()).collect::<Vec<_>>(), 4);
    let mut push4_bytes = [push4_hi_byte, 0, 0, 0];
    push4_bytes[1..].copy_from_slice(&tail[..3]);

    stack.push(U256::from(hi));
    stack.push(U256::from_big_endian(&push4_bytes));
    stack.dup(3);
}

pub(crate) fn push1_push1_push1_shl_sub(stack: &mut Stack, instr: Instruction, data: &[Instruction]) {
    let imm = push_bytes(instr, data, 3);
    let mut buf = [0u8; 32];
    imm.to_big_endian(&mut buf);
    let a = U256::from(buf[29]);
    let b = U256::from(buf[30]);
    let c = U256::from(buf[31]);

    stack.push(a);
    stack.push(b);
    stack.push(c);

    let shift = stack.pop();
    let value = stack.pop();
    let shl = if value.is_zero() || shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.as_usize()
    };
    stack.push(shl);

    let x = stack.pop();
    let y = stack.pop();
    stack.push(x.overflowing_sub(y).0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpCode;

    #[test]
    fn push1_push1_pushes_both_bytes_in_order() {
        let mut stack = Stack::default();
        let instr = Instruction::new(OpCode::PUSH1_PUSH1, 0x0102);
        push1_push1(&mut stack, instr);
        assert_eq!(stack.pop(), U256::from(0x02));
        assert_eq!(stack.pop(), U256::from(0x01));
    }

    #[test]
    fn push1_add_adds_immediate_to_popped_value() {
        let mut stack = Stack::default();
        stack.push(U256::from(10));
        let instr = Instruction::new(OpCode::PUSH1_ADD, 5);
        push1_add(&mut stack, instr);
        assert_eq!(stack.pop(), U256::from(15));
    }

    #[test]
    fn and_swap1_pop_swap2_swap1_matches_base_sequence() {
        let mut stack = Stack::default();
        stack.push(U256::from(3)); // bottom
        stack.push(U256::from(0xF)); // b
        stack.push(U256::from(0x3)); // a
        and_swap1_pop_swap2_swap1(&mut stack);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn swap2_swap1_pop_jump_matches_base_sequence() {
        // s0,s1,s2,s3 top-to-bottom. SWAP2 -> [s2,s1,s0,s3]; SWAP1 -> [s1,s2,s0,s3];
        // POP removes s1 -> [s2,s0,s3]; JUMP pops s2 as the target -> [s0,s3].
        let lowered = [Instruction::new(OpCode::JUMPDEST, 0), Instruction::new(OpCode::JUMPDEST, 0)];
        let mut stack = Stack::default();
        stack.push(U256::from(3)); // s3, bottom
        stack.push(U256::from(1)); // s2, jump target
        stack.push(U256::from(9)); // s1, discarded by POP
        stack.push(U256::from(7)); // s0, top
        let dst = swap2_swap1_pop_jump(&mut stack, &lowered).unwrap();
        assert_eq!(dst, 1);
        assert_eq!(stack.pop(), U256::from(7)); // s0
        assert_eq!(stack.pop(), U256::from(3)); // s3
        assert!(stack.is_empty());
    }

    #[test]
    fn push1_push1_push1_shl_sub_matches_base_sequence() {
        // PUSH1 a; PUSH1 b; PUSH1 c; SHL; SUB, decomposed by hand: SUB pops
        // top=(b<<c), next=a, and pushes (b<<c) - a.
        let (arg, data) = crate::instruction::pack_immediate(&[5, 3, 2]);
        let instr = Instruction::new(OpCode::PUSH1_PUSH1_PUSH1_SHL_SUB, arg);
        let data: Vec<Instruction> = data.into_iter().map(Instruction::data).collect();
        let mut stack = Stack::default();
        push1_push1_push1_shl_sub(&mut stack, instr, &data);
        assert_eq!(stack.pop(), U256::from((3u64 << 2) - 5));
    }

    #[test]
    fn push1_push4_dup3_reconstructs_immediates() {
        let mut stack = Stack::default();
        stack.push(U256::from(0x77)); // pre-existing item DUP3 will reach past the two new pushes
        let (arg, data) = crate::instruction::pack_immediate(&[0xAA, 0x01, 0x02, 0x03, 0x04]);
        let instr = Instruction::new(OpCode::PUSH1_PUSH4_DUP3, arg);
        let data: Vec<Instruction> = data.into_iter().map(Instruction::data).collect();
        push1_push4_dup3(&mut stack, instr, &data);
        assert_eq!(stack.pop(), U256::from(0x77));
        assert_eq!(stack.pop(), U256::from(0x01020304u32));
        assert_eq!(stack.pop(), U256::from(0xAA));
    }
}

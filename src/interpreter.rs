//! The per-opcode dispatch loop: given a lowered instruction stream and a
//! host, runs it to completion and reports the outcome as a [`CallResult`].
//!
//! Unlike a suspend/resume design built around an async generator, this loop
//! never yields control mid-call: every [`RunContext`] method is a plain
//! synchronous call, so the whole of [`run`] is an ordinary function that
//! returns only once the frame reaches a terminal [`Status`].

use crate::common::{CallKind, CallParams, CallResult, FailureReason, Status};
use crate::gas;
use crate::hash_cache::HashCache;
use crate::host::RunContext;
use crate::instruction::Instruction;
use crate::instructions::{arithmetic, bitwise, boolean, call, control, external, memory, stack_manip, super_instructions};
use crate::opcode::OpCode;
use crate::runner::Runner;
use crate::state::{Frame, Stack};
use bytes::Bytes;
use ethereum_types::U256;

/// How many immediate bytes `op` carries in the lowered stream, i.e. how many
/// bytes were packed by [`crate::instruction::pack_immediate`] at conversion
/// time. Drives how many trailing `DATA` words to skip when advancing `pc`.
fn immediate_byte_len(op: OpCode) -> usize {
    if let Some(n) = op.push_width() {
        return n as usize;
    }
    match op {
        OpCode::PUSH1_PUSH1
        | OpCode::PUSH2_JUMP
        | OpCode::PUSH2_JUMPI
        | OpCode::ISZERO_PUSH2_JUMPI => 2,
        OpCode::PUSH1_ADD | OpCode::PUSH1_SHL | OpCode::PUSH1_DUP1 => 1,
        OpCode::PUSH1_PUSH1_PUSH1_SHL_SUB => 3,
        OpCode::PUSH1_PUSH4_DUP3 => 5,
        _ => 0,
    }
}

/// Inverse of [`crate::instruction::pack_immediate`]'s word count: `0` if the
/// immediate fits entirely in the instruction's own `arg` (`n <= 2`), else the
/// number of trailing `DATA` words needed to hold the rest.
fn data_word_count(immediate_bytes: usize) -> usize {
    if immediate_bytes == 0 {
        0
    } else {
        (immediate_bytes + 1) / 2 - 1
    }
}

enum StepOutcome {
    /// Advance `pc` by this many lowered words (the instruction word itself
    /// plus any `DATA` words it owns).
    Advance(usize),
    /// Set `pc` to this lowered index directly (already validated as a
    /// `JUMPDEST`, or an internal `JUMP_TO` bridge target).
    Jump(usize),
    Stop,
    Return,
    Revert,
    SelfDestruct,
}

/// Runs `lowered` to completion against `host`, starting from `params`.
pub fn run(
    params: CallParams,
    lowered: &[Instruction],
    host: &mut dyn RunContext,
    hash_cache: &HashCache,
    runner: &mut dyn Runner,
) -> CallResult {
    let mut frame = Frame::new(params);
    let mut failure: Option<FailureReason> = None;

    loop {
        if frame.pc >= lowered.len() {
            frame.status = Status::Stopped;
            break;
        }

        let instr = lowered[frame.pc];
        let op = instr.opcode();
        let data_words = data_word_count(immediate_byte_len(op));
        let data_start = frame.pc + 1;
        let data_end = (data_start + data_words).min(lowered.len());
        let data = &lowered[data_start..data_end];

        runner.on_step(&frame, op);

        match step(&mut frame, instr, data, lowered, host, hash_cache) {
            Ok(StepOutcome::Advance(delta)) => frame.pc += delta,
            Ok(StepOutcome::Jump(target)) => frame.pc = target,
            Ok(StepOutcome::Stop) => {
                frame.status = Status::Stopped;
                break;
            }
            Ok(StepOutcome::Return) => {
                frame.status = Status::Returned;
                break;
            }
            Ok(StepOutcome::Revert) => {
                frame.status = Status::Reverted;
                break;
            }
            Ok(StepOutcome::SelfDestruct) => {
                frame.status = Status::SelfDestructed;
                break;
            }
            Err(reason) => {
                failure = Some(reason);
                frame.status = Status::Failed;
                break;
            }
        }
    }

    runner.on_finish(&frame, failure);
    finish(frame)
}

fn finish(frame: Frame) -> CallResult {
    match frame.status {
        Status::Stopped | Status::Returned => CallResult {
            success: true,
            output: frame.output_data,
            gas_left: frame.gas_left,
            gas_refund: frame.gas_refund,
            created_address: None,
        },
        Status::Reverted => CallResult {
            success: false,
            output: frame.output_data,
            gas_left: frame.gas_left,
            gas_refund: 0,
            created_address: None,
        },
        Status::SelfDestructed => CallResult {
            success: true,
            output: Bytes::new(),
            gas_left: frame.gas_left,
            gas_refund: frame.gas_refund,
            created_address: None,
        },
        Status::Failed => CallResult::failed(),
        Status::Running => unreachable!("the dispatch loop only exits on a terminal status"),
    }
}

fn step(
    frame: &mut Frame,
    instr: Instruction,
    data: &[Instruction],
    lowered: &[Instruction],
    host: &mut dyn RunContext,
    hash_cache: &HashCache,
) -> Result<StepOutcome, FailureReason> {
    let op = instr.opcode();

    // Auxiliary bridging opcodes: pure control flow, no gas, never metered.
    match op {
        OpCode::NOOP => return Ok(StepOutcome::Advance(1)),
        OpCode::JUMP_TO => return Ok(StepOutcome::Jump(instr.arg() as usize)),
        _ => {}
    }

    let revision = frame.params.revision;

    if let Some(required_since) = op.introduced_in() {
        if revision < required_since {
            return Err(FailureReason::RevisionTooOld);
        }
    }

    let static_cost = gas::static_gas_cost(revision, op).ok_or(FailureReason::UndefinedInstruction)?;
    frame.gas_left -= static_cost as i64;
    if frame.gas_left < 0 {
        return Err(FailureReason::OutOfGas);
    }

    let bounds = gas::stack_bounds(op).ok_or(FailureReason::UndefinedInstruction)?;
    if (frame.stack.len() as u16) < bounds.required {
        return Err(FailureReason::StackUnderflow);
    }
    if frame.stack.len() + bounds.peak_growth as usize > Stack::limit() {
        return Err(FailureReason::StackOverflow);
    }

    let width = 1 + data.len();

    macro_rules! jump_or_advance {
        ($maybe_target:expr) => {
            match $maybe_target {
                Some(target) => Ok(StepOutcome::Jump(target)),
                None => Ok(StepOutcome::Advance(width)),
            }
        };
    }

    match op {
        OpCode::STOP => Ok(StepOutcome::Stop),

        OpCode::ADD => { arithmetic::add(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::MUL => { arithmetic::mul(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SUB => { arithmetic::sub(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::DIV => { arithmetic::div(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SDIV => { arithmetic::sdiv(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::MOD => { arithmetic::modulo(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SMOD => { arithmetic::smod(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::ADDMOD => { arithmetic::addmod(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::MULMOD => { arithmetic::mulmod(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::EXP => { arithmetic::exp(frame, revision)?; Ok(StepOutcome::Advance(width)) }
        OpCode::SIGNEXTEND => { arithmetic::signextend(&mut frame.stack); Ok(StepOutcome::Advance(width)) }

        OpCode::LT => { boolean::lt(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::GT => { boolean::gt(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SLT => { boolean::slt(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SGT => { boolean::sgt(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::EQ => { boolean::eq(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::ISZERO => { boolean::iszero(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::AND => { boolean::and(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::OR => { boolean::or(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::XOR => { boolean::xor(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::NOT => { boolean::not(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::BYTE => { bitwise::byte(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SHL => { bitwise::shl(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SHR => { bitwise::shr(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SAR => { bitwise::sar(&mut frame.stack); Ok(StepOutcome::Advance(width)) }

        OpCode::KECCAK256 => { memory::keccak256(frame, hash_cache)?; Ok(StepOutcome::Advance(width)) }

        OpCode::ADDRESS => { external::address(frame); Ok(StepOutcome::Advance(width)) }
        OpCode::CALLER => { external::caller(frame); Ok(StepOutcome::Advance(width)) }
        OpCode::CALLVALUE => { external::callvalue(frame); Ok(StepOutcome::Advance(width)) }
        OpCode::BALANCE => { external::balance(frame, host)?; Ok(StepOutcome::Advance(width)) }

        OpCode::ORIGIN => { external::push_tx_context_field(frame, host, external::origin_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::COINBASE => { external::push_tx_context_field(frame, host, external::coinbase_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::GASPRICE => { external::push_tx_context_field(frame, host, external::gasprice_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::TIMESTAMP => { external::push_tx_context_field(frame, host, external::timestamp_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::NUMBER => { external::push_tx_context_field(frame, host, external::number_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::DIFFICULTY => { external::push_tx_context_field(frame, host, external::difficulty_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::GASLIMIT => { external::push_tx_context_field(frame, host, external::gaslimit_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::CHAINID => { external::push_tx_context_field(frame, host, external::chainid_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::BASEFEE => { external::push_tx_context_field(frame, host, external::basefee_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::BLOBBASEFEE => { external::push_tx_context_field(frame, host, external::blobbasefee_accessor)?; Ok(StepOutcome::Advance(width)) }
        OpCode::BLOBHASH => { external::blobhash(frame, host)?; Ok(StepOutcome::Advance(width)) }

        OpCode::CALLDATALOAD => { control::calldataload(frame); Ok(StepOutcome::Advance(width)) }
        OpCode::CALLDATASIZE => { control::calldatasize(frame); Ok(StepOutcome::Advance(width)) }
        OpCode::CALLDATACOPY => { memory::calldatacopy(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::CODESIZE => {
            let code = frame.params.code.clone();
            memory::codesize(&mut frame.stack, &code);
            Ok(StepOutcome::Advance(width))
        }
        OpCode::CODECOPY => { memory::codecopy(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::EXTCODESIZE => { external::extcodesize(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::EXTCODECOPY => { external::extcodecopy(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::EXTCODEHASH => { external::extcodehash(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::RETURNDATASIZE => { memory::returndatasize(frame); Ok(StepOutcome::Advance(width)) }
        OpCode::RETURNDATACOPY => { memory::returndatacopy(frame)?; Ok(StepOutcome::Advance(width)) }

        OpCode::BLOCKHASH => { external::blockhash(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::SELFBALANCE => { external::selfbalance(frame, host)?; Ok(StepOutcome::Advance(width)) }

        OpCode::POP => { stack_manip::pop(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::MLOAD => { memory::mload(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::MSTORE => { memory::mstore(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::MSTORE8 => { memory::mstore8(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::MCOPY => { memory::mcopy(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::MSIZE => { memory::msize(&mut frame.stack, &frame.memory); Ok(StepOutcome::Advance(width)) }

        OpCode::SLOAD => { external::sload(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::SSTORE => { external::sstore(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::TLOAD => { external::tload(frame, host)?; Ok(StepOutcome::Advance(width)) }
        OpCode::TSTORE => { external::tstore(frame, host)?; Ok(StepOutcome::Advance(width)) }

        OpCode::JUMP => {
            let dst = frame.stack.pop();
            Ok(StepOutcome::Jump(control::op_jump(dst, lowered)?))
        }
        OpCode::JUMPI => {
            let dst = frame.stack.pop();
            let cond = frame.stack.pop();
            if cond.is_zero() {
                Ok(StepOutcome::Advance(width))
            } else {
                Ok(StepOutcome::Jump(control::op_jump(dst, lowered)?))
            }
        }
        OpCode::JUMPDEST => Ok(StepOutcome::Advance(width)),
        OpCode::PC => { frame.stack.push(U256::from(instr.arg())); Ok(StepOutcome::Advance(width)) }
        OpCode::GAS => { frame.stack.push(U256::from(frame.gas_left.max(0) as u64)); Ok(StepOutcome::Advance(width)) }

        OpCode::PUSH0 => { frame.stack.push(U256::zero()); Ok(StepOutcome::Advance(width)) }
        _ if op.push_width().is_some() => {
            let n = op.push_width().unwrap() as usize;
            stack_manip::push(&mut frame.stack, instr, data, n);
            Ok(StepOutcome::Advance(width))
        }
        _ if op.dup_height().is_some() => {
            stack_manip::dup(&mut frame.stack, op.dup_height().unwrap() as usize);
            Ok(StepOutcome::Advance(width))
        }
        _ if op.swap_height().is_some() => {
            stack_manip::swap(&mut frame.stack, op.swap_height().unwrap() as usize);
            Ok(StepOutcome::Advance(width))
        }
        _ if op.log_topics().is_some() => {
            external::do_log(frame, host, op.log_topics().unwrap() as usize)?;
            Ok(StepOutcome::Advance(width))
        }

        OpCode::CREATE => { call::do_create(frame, host, false)?; Ok(StepOutcome::Advance(width)) }
        OpCode::CREATE2 => { call::do_create(frame, host, true)?; Ok(StepOutcome::Advance(width)) }
        OpCode::CALL => { call::do_call(frame, host, CallKind::Call, false)?; Ok(StepOutcome::Advance(width)) }
        OpCode::CALLCODE => { call::do_call(frame, host, CallKind::CallCode, false)?; Ok(StepOutcome::Advance(width)) }
        OpCode::DELEGATECALL => { call::do_call(frame, host, CallKind::DelegateCall, false)?; Ok(StepOutcome::Advance(width)) }
        OpCode::STATICCALL => { call::do_call(frame, host, CallKind::StaticCall, true)?; Ok(StepOutcome::Advance(width)) }

        OpCode::RETURN => { control::ret(frame)?; Ok(StepOutcome::Return) }
        OpCode::REVERT => { control::ret(frame)?; Ok(StepOutcome::Revert) }
        OpCode::INVALID => Err(FailureReason::InvalidInstruction),
        OpCode::SELFDESTRUCT => { external::selfdestruct(frame, host)?; Ok(StepOutcome::SelfDestruct) }

        OpCode::PUSH1_PUSH1 => { super_instructions::push1_push1(&mut frame.stack, instr); Ok(StepOutcome::Advance(width)) }
        OpCode::SWAP1_POP => { super_instructions::swap1_pop(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::POP_POP => { super_instructions::pop_pop(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::PUSH2_JUMP => Ok(StepOutcome::Jump(super_instructions::push2_jump(instr, lowered)?)),
        OpCode::PUSH2_JUMPI => jump_or_advance!(super_instructions::push2_jumpi(&mut frame.stack, instr, lowered)?),
        OpCode::SWAP2_SWAP1_POP_JUMP => Ok(StepOutcome::Jump(super_instructions::swap2_swap1_pop_jump(&mut frame.stack, lowered)?)),
        OpCode::ISZERO_PUSH2_JUMPI => jump_or_advance!(super_instructions::iszero_push2_jumpi(&mut frame.stack, instr, lowered)?),
        OpCode::SWAP1_POP_SWAP2_SWAP1 => { super_instructions::swap1_pop_swap2_swap1(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::POP_SWAP2_SWAP1_POP => { super_instructions::pop_swap2_swap1_pop(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::AND_SWAP1_POP_SWAP2_SWAP1 => { super_instructions::and_swap1_pop_swap2_swap1(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::PUSH1_ADD => { super_instructions::push1_add(&mut frame.stack, instr); Ok(StepOutcome::Advance(width)) }
        OpCode::PUSH1_SHL => { super_instructions::push1_shl(&mut frame.stack, instr); Ok(StepOutcome::Advance(width)) }
        OpCode::PUSH1_DUP1 => { super_instructions::push1_dup1(&mut frame.stack, instr); Ok(StepOutcome::Advance(width)) }
        OpCode::DUP2_LT => { super_instructions::dup2_lt(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::DUP2_MSTORE => { super_instructions::dup2_mstore(frame)?; Ok(StepOutcome::Advance(width)) }
        OpCode::SWAP2_SWAP1 => { super_instructions::swap2_swap1(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::SWAP2_POP => { super_instructions::swap2_pop(&mut frame.stack); Ok(StepOutcome::Advance(width)) }
        OpCode::POP_JUMP => Ok(StepOutcome::Jump(super_instructions::pop_jump(&mut frame.stack, lowered)?)),
        OpCode::PUSH1_PUSH4_DUP3 => { super_instructions::push1_push4_dup3(&mut frame.stack, instr, data); Ok(StepOutcome::Advance(width)) }
        OpCode::PUSH1_PUSH1_PUSH1_SHL_SUB => { super_instructions::push1_push1_push1_shl_sub(&mut frame.stack, instr, data); Ok(StepOutcome::Advance(width)) }

        _ => Err(FailureReason::UndefinedInstruction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::converter::convert;
    use crate::common::Revision;
    use crate::host::DummyRunContext;
    use crate::runner::NoopRunner;
    use ethereum_types::Address;

    fn params(code: &[u8], gas: i64) -> CallParams {
        CallParams {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            code: Bytes::copy_from_slice(code),
            code_hash: None,
            input: Bytes::new(),
            gas,
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
    fn bare_stop_succeeds_and_spends_no_gas() {
        let code = [OpCode::STOP.to_u16() as u8];
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 1000), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(result.success);
        assert_eq!(result.gas_left, 1000);
    }

    #[test]
    fn push_pop_charges_expected_static_gas() {
        // PUSH1 1; POP; STOP
        let code = hex_literal::hex!("600150" "00");
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 1000), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(result.success);
        // PUSH1 (3) + POP (2) = 5
        assert_eq!(result.gas_left, 995);
    }

    #[test]
    fn push1_jump_jumpdest_reaches_the_target() {
        // PUSH1 4; JUMP; INVALID; JUMPDEST; STOP
        let code = hex_literal::hex!("6004565b00");
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 1000), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(result.success);
    }

    #[test]
    fn jump_to_a_non_jumpdest_fails() {
        // PUSH1 2; JUMP; STOP
        let code = hex_literal::hex!("60025600");
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 1000), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(!result.success);
    }

    #[test]
    fn running_out_of_gas_fails_the_call() {
        let code = hex_literal::hex!("6001600201");
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 5), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(!result.success);
    }

    #[test]
    fn sstore_under_static_call_is_rejected() {
        let code = hex_literal::hex!("6001600155"); // PUSH1 1; PUSH1 1; SSTORE
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let mut p = params(&code, 100_000);
        p.is_static = true;
        let result = run(p, &lowered, &mut host, &hash_cache, &mut runner);
        assert!(!result.success);
    }

    #[test]
    fn push0_fails_pre_shanghai() {
        let code = [OpCode::PUSH0.to_u16() as u8];
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let mut p = params(&code, 1000);
        p.revision = Revision::Paris;
        let result = run(p, &lowered, &mut host, &hash_cache, &mut runner);
        assert!(!result.success);
    }

    #[test]
    fn invalid_opcode_fails_the_call() {
        let code = [OpCode::INVALID.to_u16() as u8];
        let lowered = convert(&code, false);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 1000), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(!result.success);
    }

    #[test]
    fn super_instruction_fused_sequence_matches_base_opcode_semantics() {
        // PUSH1 1; PUSH1 2; ADD; STOP, with super-instruction fusion on.
        let code = hex_literal::hex!("600160020100");
        let lowered = convert(&code, true);
        let mut host = DummyRunContext;
        let mut runner = NoopRunner;
        let hash_cache = HashCache::default();
        let result = run(params(&code, 1000), &lowered, &mut host, &hash_cache, &mut runner);
        assert!(result.success);
        // PUSH1_PUSH1 (6) + ADD (3) = 9
        assert_eq!(result.gas_left, 1000 - 9);
    }
}

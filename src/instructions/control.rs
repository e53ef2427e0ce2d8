use crate::common::FailureReason;
use crate::instruction::Instruction;
use crate::opcode::OpCode;
use crate::state::Frame;
use ethereum_types::U256;

pub(crate) fn ret(frame: &mut Frame) -> Result<(), FailureReason> {
    let offset = frame.stack.pop();
    let size = frame.stack.pop();

    if let Some(region) = super::memory::verify_memory_region_u256(frame, offset, size)? {
        frame.output_data = frame.memory.get(region.offset, region.size).to_vec().into();
    }

    Ok(())
}

/// Validates a jump target against the lowered instruction stream directly:
/// every raw `JUMPDEST` survives conversion at its own raw byte offset (see
/// `crate::code::converter`'s bridging), so `lowered[dst]` being a `JUMPDEST`
/// word is both necessary and sufficient.
pub(crate) fn op_jump(dst: U256, lowered: &[Instruction]) -> Result<usize, FailureReason> {
    if dst > U256::from(i32::MAX) {
        return Err(FailureReason::InvalidJump);
    }
    let dst = dst.as_usize();
    if dst >= lowered.len() || lowered[dst].opcode() != OpCode::JUMPDEST {
        return Err(FailureReason::InvalidJump);
    }
    Ok(dst)
}

pub(crate) fn calldataload(frame: &mut Frame) {
    let index = frame.stack.pop();
    let input = &frame.params.input;
    let input_len = input.len();

    frame.stack.push({
        if index > U256::from(input_len) {
            U256::zero()
        } else {
            let index_usize = index.as_usize();
            let end = core::cmp::min(index_usize + 32, input_len);

            let mut data = [0; 32];
            data[..end - index_usize].copy_from_slice(&input[index_usize..end]);

            data.into()
        }
    });
}

pub(crate) fn calldatasize(frame: &mut Frame) {
    frame.stack.push(frame.params.input.len().into());
}

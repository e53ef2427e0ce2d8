use crate::common::FailureReason;
use crate::gas;
use crate::state::{Frame, Memory, Stack, MAX_MEMORY_SIZE};
use ethereum_types::U256;
use std::cmp::min;

/// A validated, in-bounds memory region. `None` (from the `U256` variants)
/// means a zero-size access, which never touches memory or charges for expansion.
pub(crate) struct MemoryRegion {
    pub offset: usize,
    pub size: usize,
}

/// Charges the marginal cost of growing memory to cover `[offset, offset+size)`
/// and performs the resize, or fails with `OutOfGas`/`MemoryOverflow`.
pub(crate) fn verify_memory_region(
    frame: &mut Frame,
    offset: U256,
    size: u64,
) -> Result<Option<MemoryRegion>, FailureReason> {
    if size == 0 {
        return Ok(None);
    }
    if offset > U256::from(MAX_MEMORY_SIZE) {
        return Err(FailureReason::MemoryOverflow);
    }

    let words = Memory::words_needed(offset.as_u64(), size).ok_or(FailureReason::MemoryOverflow)?;
    let cost = gas::memory_expansion_cost(words);
    if cost > frame.memory_cost_charged {
        let delta = cost - frame.memory_cost_charged;
        frame.gas_left -= delta as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
        frame.memory_cost_charged = cost;
        frame.memory.resize_to_words(words);
    }

    Ok(Some(MemoryRegion {
        offset: offset.as_usize(),
        size: size as usize,
    }))
}

/// `U256`-sized variant used by `SHA3`/`*COPY`, whose size operand is itself
/// a full word and must be bounds-checked before truncating to `u64`.
pub(crate) fn verify_memory_region_u256(
    frame: &mut Frame,
    offset: U256,
    size: U256,
) -> Result<Option<MemoryRegion>, FailureReason> {
    if size.is_zero() {
        return Ok(None);
    }
    if size > U256::from(u64::MAX) {
        return Err(FailureReason::MemoryOverflow);
    }
    verify_memory_region(frame, offset, size.as_u64())
}

pub(crate) fn mload(frame: &mut Frame) -> Result<(), FailureReason> {
    let offset = frame.stack.pop();
    let region = verify_memory_region(frame, offset, 32)?.unwrap();
    frame.stack.push(frame.memory.get_word(region.offset));
    Ok(())
}

pub(crate) fn mstore(frame: &mut Frame) -> Result<(), FailureReason> {
    let offset = frame.stack.pop();
    let value = frame.stack.pop();
    let region = verify_memory_region(frame, offset, 32)?.unwrap();
    let mut b = [0u8; 32];
    value.to_big_endian(&mut b);
    frame.memory.set(region.offset, &b);
    Ok(())
}

pub(crate) fn mstore8(frame: &mut Frame) -> Result<(), FailureReason> {
    let offset = frame.stack.pop();
    let value = frame.stack.pop();
    let region = verify_memory_region(frame, offset, 1)?.unwrap();
    frame.memory.set_byte(region.offset, value.low_u32() as u8);
    Ok(())
}

pub(crate) fn msize(stack: &mut Stack, memory: &Memory) {
    stack.push(memory.len().into());
}

pub(crate) fn mcopy(frame: &mut Frame) -> Result<(), FailureReason> {
    let dst = frame.stack.pop();
    let src = frame.stack.pop();
    let size = frame.stack.pop();

    let span = dst.max(src);
    if verify_memory_region_u256(frame, span, size)?.is_some() {
        let size = size.as_usize();
        charge_copy_cost(frame, size)?;
        let buf = frame.memory.get(src.as_usize(), size).to_vec();
        frame.memory.set(dst.as_usize(), &buf);
    }
    Ok(())
}

pub(crate) fn calldatacopy(frame: &mut Frame) -> Result<(), FailureReason> {
    let mem_index = frame.stack.pop();
    let input_index = frame.stack.pop();
    let size = frame.stack.pop();

    let region = verify_memory_region_u256(frame, mem_index, size)?;
    if let Some(region) = region {
        charge_copy_cost(frame, region.size)?;
        let input = &frame.params.input;
        copy_right_padded(&mut frame.memory, region.offset, region.size, input, input_index);
    }
    Ok(())
}

pub(crate) fn codesize(stack: &mut Stack, code: &[u8]) {
    stack.push(code.len().into());
}

pub(crate) fn codecopy(frame: &mut Frame) -> Result<(), FailureReason> {
    let mem_index = frame.stack.pop();
    let input_index = frame.stack.pop();
    let size = frame.stack.pop();

    let region = verify_memory_region_u256(frame, mem_index, size)?;
    if let Some(region) = region {
        charge_copy_cost(frame, region.size)?;
        let code = frame.params.code.clone();
        copy_right_padded(&mut frame.memory, region.offset, region.size, &code, input_index);
    }
    Ok(())
}

pub(crate) fn returndatasize(frame: &mut Frame) {
    frame.stack.push(frame.return_data.len().into());
}

pub(crate) fn returndatacopy(frame: &mut Frame) -> Result<(), FailureReason> {
    let mem_index = frame.stack.pop();
    let input_index = frame.stack.pop();
    let size = frame.stack.pop();

    let region = verify_memory_region_u256(frame, mem_index, size)?;

    if input_index > U256::from(frame.return_data.len()) {
        return Err(FailureReason::MemoryOverflow);
    }
    let src = input_index.as_usize();
    let region_size = region.as_ref().map(|r| r.size).unwrap_or(0);
    if src + region_size > frame.return_data.len() {
        return Err(FailureReason::MemoryOverflow);
    }

    if let Some(region) = region {
        charge_copy_cost(frame, region.size)?;
        let data = frame.return_data[src..src + region.size].to_vec();
        frame.memory.set(region.offset, &data);
    }
    Ok(())
}

pub(crate) fn keccak256(frame: &mut Frame, hash_cache: &crate::hash_cache::HashCache) -> Result<(), FailureReason> {
    let offset = frame.stack.pop();
    let size = frame.stack.pop();

    let region = verify_memory_region_u256(frame, offset, size)?;
    let digest = if let Some(region) = region {
        let words = Memory::words_needed(0, region.size as u64).unwrap();
        frame.gas_left -= gas::keccak256_dynamic_cost(words) as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
        hash_cache.hash(frame.memory.get(region.offset, region.size))
    } else {
        hash_cache.hash(&[])
    };

    frame.stack.push(U256::from_big_endian(&digest));
    Ok(())
}

fn charge_copy_cost(frame: &mut Frame, size: usize) -> Result<(), FailureReason> {
    let words = Memory::words_needed(0, size as u64).unwrap();
    frame.gas_left -= gas::copy_dynamic_cost(words) as i64;
    if frame.gas_left < 0 {
        return Err(FailureReason::OutOfGas);
    }
    Ok(())
}

/// Copies `size` bytes from `src[start..]` into `memory[offset..]`,
/// zero-filling whatever runs past the end of `src`. `start` is clamped to
/// `src.len()` rather than truncated, matching every `*COPY` opcode's
/// "offsets beyond the source are all zero" rule.
pub(crate) fn copy_right_padded(memory: &mut Memory, offset: usize, size: usize, src: &[u8], start: U256) {
    let start = min(U256::from(src.len()), start).as_usize();
    let copy_size = min(size, src.len() - start);
    if copy_size > 0 {
        memory.set(offset, &src[start..start + copy_size]);
    }
    if size - copy_size > 0 {
        memory.set(offset + copy_size, &vec![0u8; size - copy_size]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CallKind, CallParams, Revision};
    use bytes::Bytes;
    use ethereum_types::Address;

    fn frame_with_gas(gas: i64) -> Frame {
        Frame::new(CallParams {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            code: Bytes::new(),
            code_hash: None,
            input: Bytes::from_static(&[1, 2, 3, 4, 5]),
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
        })
    }

    #[test]
    fn mstore_then_mload_roundtrips() {
        let mut frame = frame_with_gas(1_000_000);
        frame.stack.push(U256::from(42));
        frame.stack.push(U256::zero());
        mstore(&mut frame).unwrap();
        frame.stack.push(U256::zero());
        mload(&mut frame).unwrap();
        assert_eq!(frame.stack.pop(), U256::from(42));
    }

    #[test]
    fn calldatacopy_zero_pads_past_input_end() {
        let mut frame = frame_with_gas(1_000_000);
        frame.stack.push(U256::from(10)); // size
        frame.stack.push(U256::from(0)); // input offset
        frame.stack.push(U256::from(0)); // mem offset
        calldatacopy(&mut frame).unwrap();
        assert_eq!(&frame.memory.get(0, 5), &[1, 2, 3, 4, 5]);
        assert_eq!(&frame.memory.get(5, 5), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn memory_expansion_runs_out_of_gas() {
        let mut frame = frame_with_gas(1);
        frame.stack.push(U256::from(1_000_000));
        let err = mload(&mut frame).unwrap_err();
        assert_eq!(err, FailureReason::OutOfGas);
    }
}

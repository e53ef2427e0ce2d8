use crate::common::{address_to_u256, u256_to_address, FailureReason, Revision};
use crate::gas;
use crate::host::{AccessStatus, RunContext, TxContext};
use crate::state::Frame;
use arrayvec::ArrayVec;
use ethereum_types::{H256, U256};

fn host_err(_: crate::error::HostError) -> FailureReason {
    FailureReason::HostError
}

pub(crate) fn address(frame: &mut Frame) {
    frame.stack.push(address_to_u256(frame.params.recipient));
}

pub(crate) fn caller(frame: &mut Frame) {
    frame.stack.push(address_to_u256(frame.params.sender));
}

pub(crate) fn callvalue(frame: &mut Frame) {
    frame.stack.push(frame.params.value);
}

pub(crate) fn balance(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let address = u256_to_address(frame.stack.pop());
    charge_account_access(frame, host, address)?;
    frame.stack.push(host.get_balance(address).map_err(host_err)?);
    Ok(())
}

pub(crate) fn extcodesize(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let address = u256_to_address(frame.stack.pop());
    charge_account_access(frame, host, address)?;
    frame.stack.push(host.get_code_size(address).map_err(host_err)?.into());
    Ok(())
}

pub(crate) fn extcodehash(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let address = u256_to_address(frame.stack.pop());
    charge_account_access(frame, host, address)?;
    let hash = host.get_code_hash(address).map_err(host_err)?;
    frame.stack.push(U256::from_big_endian(hash.as_bytes()));
    Ok(())
}

pub(crate) fn extcodecopy(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let address = u256_to_address(frame.stack.pop());
    let mem_offset = frame.stack.pop();
    let code_offset = frame.stack.pop();
    let size = frame.stack.pop();

    charge_account_access(frame, host, address)?;

    let region = super::memory::verify_memory_region_u256(frame, mem_offset, size)?;
    if let Some(region) = region {
        let words = crate::state::Memory::words_needed(0, region.size as u64).unwrap();
        frame.gas_left -= gas::copy_dynamic_cost(words) as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
        let code = host.get_code(address).map_err(host_err)?;
        super::memory::copy_right_padded(&mut frame.memory, region.offset, region.size, &code, code_offset);
    }
    Ok(())
}

pub(crate) fn blobhash(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let index = frame.stack.pop();
    let tx_context = host.get_tx_context().map_err(host_err)?;
    let hash = if index < U256::from(tx_context.blob_hashes.len()) {
        U256::from_big_endian(tx_context.blob_hashes[index.as_usize()].as_bytes())
    } else {
        U256::zero()
    };
    frame.stack.push(hash);
    Ok(())
}

/// Shared body of every opcode that reads a single scalar out of the
/// block/transaction context (`ORIGIN`, `COINBASE`, `GASPRICE`, ...).
pub(crate) fn push_tx_context_field(
    frame: &mut Frame,
    host: &mut dyn RunContext,
    accessor: fn(&TxContext) -> U256,
) -> Result<(), FailureReason> {
    let tx_context = host.get_tx_context().map_err(host_err)?;
    frame.stack.push(accessor(&tx_context));
    Ok(())
}

fn charge_account_access(
    frame: &mut Frame,
    host: &mut dyn RunContext,
    address: ethereum_types::Address,
) -> Result<(), FailureReason> {
    if frame.params.revision >= Revision::Berlin {
        let access = host.access_account(address).map_err(host_err)?;
        let cost = gas::cold_account_access_surcharge(frame.params.revision, access == AccessStatus::Cold);
        frame.gas_left -= cost as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
    }
    Ok(())
}

pub(crate) fn origin_accessor(tx_context: &TxContext) -> U256 {
    address_to_u256(tx_context.tx_origin)
}

pub(crate) fn coinbase_accessor(tx_context: &TxContext) -> U256 {
    address_to_u256(tx_context.block_coinbase)
}

pub(crate) fn gasprice_accessor(tx_context: &TxContext) -> U256 {
    tx_context.tx_gas_price
}

pub(crate) fn timestamp_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_timestamp.into()
}

pub(crate) fn number_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_number.into()
}

pub(crate) fn gaslimit_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_gas_limit.into()
}

pub(crate) fn difficulty_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_difficulty
}

pub(crate) fn chainid_accessor(tx_context: &TxContext) -> U256 {
    tx_context.chain_id
}

pub(crate) fn basefee_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_base_fee
}

pub(crate) fn blobbasefee_accessor(tx_context: &TxContext) -> U256 {
    tx_context.blob_base_fee
}

pub(crate) fn selfbalance(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let balance = host.get_balance(frame.params.recipient).map_err(host_err)?;
    frame.stack.push(balance);
    Ok(())
}

pub(crate) fn blockhash(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let number = frame.stack.pop();

    let upper_bound = host.get_tx_context().map_err(host_err)?.block_number;
    let lower_bound = upper_bound.saturating_sub(256);

    let mut header = H256::zero();
    if number <= U256::from(u64::MAX) {
        let n = number.as_u64();
        if (lower_bound..upper_bound).contains(&n) {
            header = host.get_block_hash(n).map_err(host_err)?;
        }
    }

    frame.stack.push(U256::from_big_endian(header.as_bytes()));
    Ok(())
}

pub(crate) fn do_log(
    frame: &mut Frame,
    host: &mut dyn RunContext,
    num_topics: usize,
) -> Result<(), FailureReason> {
    if frame.params.is_static {
        return Err(FailureReason::StaticModeViolation);
    }

    let offset = frame.stack.pop();
    let size = frame.stack.pop();

    let region = super::memory::verify_memory_region_u256(frame, offset, size)?;

    if let Some(region) = &region {
        frame.gas_left -= gas::log_dynamic_cost(region.size as u64) as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
    }

    let mut topics: ArrayVec<H256, 4> = ArrayVec::new();
    for _ in 0..num_topics {
        topics.push(H256(frame.stack.pop().into()));
    }

    let data = if let Some(region) = region {
        frame.memory.get(region.offset, region.size).to_vec()
    } else {
        Vec::new()
    };

    host.emit_log(frame.params.recipient, &data, &topics)
        .map_err(host_err)?;
    Ok(())
}

pub(crate) fn sload(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let key = H256(frame.stack.pop().into());

    if frame.params.revision >= Revision::Berlin {
        let access = host
            .access_storage(frame.params.recipient, key)
            .map_err(host_err)?;
        let surcharge = gas::cold_sload_surcharge(frame.params.revision, access == AccessStatus::Cold);
        frame.gas_left -= surcharge as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
    }

    let value = host
        .get_storage(frame.params.recipient, key)
        .map_err(host_err)?;
    frame.stack.push(U256::from_big_endian(value.as_bytes()));
    Ok(())
}

pub(crate) fn sstore(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    if frame.params.is_static {
        return Err(FailureReason::StaticModeViolation);
    }
    if gas::sstore_sentry_violated(frame.params.revision, frame.gas_left) {
        return Err(FailureReason::OutOfGas);
    }

    let key = H256(frame.stack.pop().into());
    let value = H256(frame.stack.pop().into());

    let is_cold = if frame.params.revision >= Revision::Berlin {
        host.access_storage(frame.params.recipient, key).map_err(host_err)? == AccessStatus::Cold
    } else {
        false
    };

    let original = host
        .get_committed_storage(frame.params.recipient, key)
        .map_err(host_err)?;
    let current = host
        .get_storage(frame.params.recipient, key)
        .map_err(host_err)?;
    host.set_storage(frame.params.recipient, key, value)
        .map_err(host_err)?;

    let cost = gas::sstore_cost(
        frame.params.revision,
        is_cold,
        U256::from_big_endian(original.as_bytes()),
        U256::from_big_endian(current.as_bytes()),
        U256::from_big_endian(value.as_bytes()),
    );

    frame.gas_left -= cost.gas_cost as i64;
    if frame.gas_left < 0 {
        return Err(FailureReason::OutOfGas);
    }
    frame.gas_refund += cost.gas_refund;
    Ok(())
}

pub(crate) fn tload(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    let key = H256(frame.stack.pop().into());
    let value = host
        .get_transient_storage(frame.params.recipient, key)
        .map_err(host_err)?;
    frame.stack.push(U256::from_big_endian(value.as_bytes()));
    Ok(())
}

pub(crate) fn tstore(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    if frame.params.is_static {
        return Err(FailureReason::StaticModeViolation);
    }
    let key = H256(frame.stack.pop().into());
    let value = H256(frame.stack.pop().into());
    host.set_transient_storage(frame.params.recipient, key, value)
        .map_err(host_err)?;
    Ok(())
}

pub(crate) fn selfdestruct(frame: &mut Frame, host: &mut dyn RunContext) -> Result<(), FailureReason> {
    if frame.params.is_static {
        return Err(FailureReason::StaticModeViolation);
    }

    let beneficiary = u256_to_address(frame.stack.pop());

    let is_cold = if frame.params.revision >= Revision::Berlin {
        host.access_account(beneficiary).map_err(host_err)? == AccessStatus::Cold
    } else {
        false
    };

    let recipient_balance = host.get_balance(frame.params.recipient).map_err(host_err)?;
    let sends_value_to_new_account = frame.params.revision >= Revision::Tangerine
        && (frame.params.revision == Revision::Tangerine || !recipient_balance.is_zero())
        && !host.account_exists(beneficiary).map_err(host_err)?;

    let cost = gas::selfdestruct_dynamic_cost(frame.params.revision, is_cold, sends_value_to_new_account);
    frame.gas_left -= cost as i64;
    if frame.gas_left < 0 {
        return Err(FailureReason::OutOfGas);
    }

    host.selfdestruct(frame.params.recipient, beneficiary)
        .map_err(host_err)?;
    frame.selfdestructed = true;
    Ok(())
}

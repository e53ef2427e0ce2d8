use crate::common::{address_to_u256, u256_to_address, CallKind, CallParams, FailureReason, Revision};
use crate::gas;
use crate::host::{AccessStatus, RunContext};
use crate::state::Frame;
use ethereum_types::{H256, U256};
use std::cmp::min;

fn host_err(_: crate::error::HostError) -> FailureReason {
    FailureReason::HostError
}

/// Shared body of `CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL`: pop the
/// shared operand layout, charge access/value/new-account surcharges, apply
/// the one-64th rule and stipend, and dispatch to the host.
pub(crate) fn do_call(
    frame: &mut Frame,
    host: &mut dyn RunContext,
    kind: CallKind,
    is_static: bool,
) -> Result<(), FailureReason> {
    let revision = frame.params.revision;

    let gas = frame.stack.pop();
    let dst = u256_to_address(frame.stack.pop());
    let value = if is_static || matches!(kind, CallKind::DelegateCall) {
        U256::zero()
    } else {
        frame.stack.pop()
    };
    let has_value = !value.is_zero();
    let input_offset = frame.stack.pop();
    let input_size = frame.stack.pop();
    let output_offset = frame.stack.pop();
    let output_size = frame.stack.pop();

    frame.stack.push(U256::zero()); // assume failure until the call returns

    if revision >= Revision::Berlin {
        let access = host.access_account(dst).map_err(host_err)?;
        let cost = gas::cold_account_access_surcharge(revision, access == AccessStatus::Cold);
        frame.gas_left -= cost as i64;
        if frame.gas_left < 0 {
            return Err(FailureReason::OutOfGas);
        }
    }

    let input_region = super::memory::verify_memory_region_u256(frame, input_offset, input_size)?;
    let output_region = super::memory::verify_memory_region_u256(frame, output_offset, output_size)?;

    let input = input_region
        .map(|r| frame.memory.get(r.offset, r.size).to_vec().into())
        .unwrap_or_default();

    let sender = if matches!(kind, CallKind::DelegateCall) {
        frame.params.sender
    } else {
        frame.params.recipient
    };
    let call_value = if matches!(kind, CallKind::DelegateCall) {
        frame.params.value
    } else {
        value
    };

    let mut cost = if has_value { 9000 } else { 0 };
    if matches!(kind, CallKind::Call) {
        if has_value && frame.params.is_static {
            return Err(FailureReason::StaticModeViolation);
        }
        if (has_value || revision < Revision::Spurious) && !host.account_exists(dst).map_err(host_err)? {
            cost += 25000;
        }
    }
    frame.gas_left -= cost;
    if frame.gas_left < 0 {
        return Err(FailureReason::OutOfGas);
    }

    let mut forwarded_gas = if gas < U256::from(i64::MAX) {
        gas.as_u64() as i64
    } else {
        i64::MAX
    };

    if revision >= Revision::Tangerine {
        forwarded_gas = min(forwarded_gas, gas::max_forwardable_gas(revision, frame.gas_left));
    } else if forwarded_gas > frame.gas_left {
        return Err(FailureReason::OutOfGas);
    }

    if has_value {
        forwarded_gas += gas::CALL_STIPEND as i64;
    }

    frame.return_data = bytes::Bytes::new();

    let recipient_balance = host.get_balance(frame.params.recipient).map_err(host_err)?;
    if frame.params.depth < 1024 && !(has_value && recipient_balance < value) {
        let call_params = CallParams {
            kind,
            is_static: is_static || frame.params.is_static,
            depth: frame.params.depth + 1,
            code: bytes::Bytes::new(),
            code_hash: None,
            input,
            gas: forwarded_gas,
            recipient: dst,
            sender,
            origin: frame.params.origin,
            coinbase: frame.params.coinbase,
            value: call_value,
            gas_price: frame.params.gas_price,
            base_fee: frame.params.base_fee,
            blob_base_fee: frame.params.blob_base_fee,
            block_number: frame.params.block_number,
            timestamp: frame.params.timestamp,
            gas_limit: frame.params.gas_limit,
            prev_randao: frame.params.prev_randao,
            chain_id: frame.params.chain_id,
            blob_hashes: frame.params.blob_hashes.clone(),
            revision,
        };

        let result = host.call(kind, call_params);
        frame.return_data = result.output.clone();
        *frame.stack.peek_mut(0) = if result.success { U256::one() } else { U256::zero() };

        if let Some(region) = output_region {
            let copy_size = min(region.size, result.output.len());
            if copy_size > 0 {
                frame.memory.set(region.offset, &result.output[..copy_size]);
            }
        }

        if has_value {
            frame.gas_left += gas::CALL_STIPEND as i64;
        }
        frame.gas_left -= forwarded_gas - result.gas_left;
        if result.success {
            frame.gas_refund += result.gas_refund;
        }
    }

    Ok(())
}

pub(crate) fn do_create(
    frame: &mut Frame,
    host: &mut dyn RunContext,
    is_create2: bool,
) -> Result<(), FailureReason> {
    if frame.params.is_static {
        return Err(FailureReason::StaticModeViolation);
    }

    let revision = frame.params.revision;

    let endowment = frame.stack.pop();
    let init_code_offset = frame.stack.pop();
    let init_code_size = frame.stack.pop();

    let region = super::memory::verify_memory_region_u256(frame, init_code_offset, init_code_size)?;

    if revision >= Revision::Shanghai && init_code_size > U256::from(crate::code::MAX_CODE_SIZE) {
        return Err(FailureReason::InitCodeTooLarge);
    }

    if revision >= Revision::Shanghai {
        if let Some(region) = &region {
            let words = crate::state::Memory::words_needed(0, region.size as u64).unwrap();
            frame.gas_left -= gas::init_code_word_cost(revision, words) as i64;
            if frame.gas_left < 0 {
                return Err(FailureReason::OutOfGas);
            }
        }
    }

    let kind = if is_create2 {
        let salt = frame.stack.pop();

        if let Some(region) = &region {
            let words = crate::state::Memory::words_needed(0, region.size as u64).unwrap();
            frame.gas_left -= gas::create2_dynamic_cost(words) as i64;
            if frame.gas_left < 0 {
                return Err(FailureReason::OutOfGas);
            }
        }

        CallKind::Create2 { salt: U256::from_big_endian(H256(salt.into()).as_bytes()) }
    } else {
        CallKind::Create
    };

    frame.stack.push(U256::zero());
    frame.return_data = bytes::Bytes::new();

    let recipient_balance = host.get_balance(frame.params.recipient).map_err(host_err)?;
    if frame.params.depth < 1024 && !(!endowment.is_zero() && recipient_balance < endowment) {
        let forwarded_gas = gas::max_forwardable_gas(revision, frame.gas_left);

        let init_code = region
            .map(|r| frame.memory.get(r.offset, r.size).to_vec().into())
            .unwrap_or_default();

        let call_params = CallParams {
            kind,
            is_static: false,
            depth: frame.params.depth + 1,
            code: bytes::Bytes::new(),
            code_hash: None,
            input: init_code,
            gas: forwarded_gas,
            recipient: ethereum_types::Address::zero(),
            sender: frame.params.recipient,
            origin: frame.params.origin,
            coinbase: frame.params.coinbase,
            value: endowment,
            gas_price: frame.params.gas_price,
            base_fee: frame.params.base_fee,
            blob_base_fee: frame.params.blob_base_fee,
            block_number: frame.params.block_number,
            timestamp: frame.params.timestamp,
            gas_limit: frame.params.gas_limit,
            prev_randao: frame.params.prev_randao,
            chain_id: frame.params.chain_id,
            blob_hashes: frame.params.blob_hashes.clone(),
            revision,
        };

        let result = host.call(kind, call_params);
        frame.gas_left -= forwarded_gas - result.gas_left;
        frame.return_data = result.output;

        if result.success {
            frame.gas_refund += result.gas_refund;
            if let Some(addr) = result.created_address {
                *frame.stack.peek_mut(0) = address_to_u256(addr);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CallResult;
    use crate::host::{StorageStatus, TxContext};

    struct AcceptingHost;
    impl RunContext for AcceptingHost {
        fn account_exists(&self, _: ethereum_types::Address) -> Result<bool, crate::error::HostError> {
            Ok(true)
        }
        fn get_balance(&self, _: ethereum_types::Address) -> Result<U256, crate::error::HostError> {
            Ok(U256::from(1_000_000))
        }
        fn get_nonce(&self, _: ethereum_types::Address) -> Result<u64, crate::error::HostError> {
            Ok(0)
        }
        fn get_code_size(&self, _: ethereum_types::Address) -> Result<usize, crate::error::HostError> {
            Ok(0)
        }
        fn get_code_hash(&self, _: ethereum_types::Address) -> Result<H256, crate::error::HostError> {
            Ok(H256::zero())
        }
        fn get_code(&self, _: ethereum_types::Address) -> Result<bytes::Bytes, crate::error::HostError> {
            Ok(bytes::Bytes::new())
        }
        fn access_account(&mut self, _: ethereum_types::Address) -> Result<AccessStatus, crate::error::HostError> {
            Ok(AccessStatus::Warm)
        }
        fn access_storage(&mut self, _: ethereum_types::Address, _: H256) -> Result<AccessStatus, crate::error::HostError> {
            Ok(AccessStatus::Warm)
        }
        fn is_address_in_access_list(&self, _: ethereum_types::Address) -> bool {
            true
        }
        fn is_slot_in_access_list(&self, _: ethereum_types::Address, _: H256) -> bool {
            true
        }
        fn get_storage(&self, _: ethereum_types::Address, _: H256) -> Result<H256, crate::error::HostError> {
            Ok(H256::zero())
        }
        fn set_storage(
            &mut self,
            _: ethereum_types::Address,
            _: H256,
            _: H256,
        ) -> Result<StorageStatus, crate::error::HostError> {
            Ok(StorageStatus::Added)
        }
        fn get_committed_storage(&self, _: ethereum_types::Address, _: H256) -> Result<H256, crate::error::HostError> {
            Ok(H256::zero())
        }
        fn get_transient_storage(&self, _: ethereum_types::Address, _: H256) -> Result<H256, crate::error::HostError> {
            Ok(H256::zero())
        }
        fn set_transient_storage(
            &mut self,
            _: ethereum_types::Address,
            _: H256,
            _: H256,
        ) -> Result<(), crate::error::HostError> {
            Ok(())
        }
        fn emit_log(&mut self, _: ethereum_types::Address, _: &[u8], _: &[H256]) -> Result<(), crate::error::HostError> {
            Ok(())
        }
        fn selfdestruct(&mut self, _: ethereum_types::Address, _: ethereum_types::Address) -> Result<bool, crate::error::HostError> {
            Ok(true)
        }
        fn has_selfdestructed(&self, _: ethereum_types::Address) -> bool {
            false
        }
        fn call(&mut self, _: CallKind, params: CallParams) -> CallResult {
            CallResult {
                success: true,
                output: bytes::Bytes::new(),
                gas_left: params.gas,
                gas_refund: 0,
                created_address: Some(ethereum_types::Address::zero()),
            }
        }
        fn get_block_hash(&self, _: u64) -> Result<H256, crate::error::HostError> {
            Ok(H256::zero())
        }
        fn get_tx_context(&self) -> Result<TxContext, crate::error::HostError> {
            Ok(TxContext {
                tx_gas_price: U256::zero(),
                tx_origin: ethereum_types::Address::zero(),
                block_coinbase: ethereum_types::Address::zero(),
                block_number: 0,
                block_timestamp: 0,
                block_gas_limit: 0,
                block_difficulty: U256::zero(),
                block_prev_randao: U256::zero(),
                chain_id: U256::zero(),
                block_base_fee: U256::zero(),
                blob_base_fee: U256::zero(),
                blob_hashes: vec![],
            })
        }
    }

    fn frame() -> Frame {
        Frame::new(CallParams {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            code: bytes::Bytes::new(),
            code_hash: None,
            input: bytes::Bytes::new(),
            gas: 1_000_000,
            recipient: ethereum_types::Address::zero(),
            sender: ethereum_types::Address::zero(),
            origin: ethereum_types::Address::zero(),
            coinbase: ethereum_types::Address::zero(),
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
    fn call_to_empty_account_succeeds() {
        let mut frame = frame();
        let mut host = AcceptingHost;
        frame.gas_left = 1_000_000;
        frame.stack.push(U256::zero()); // output size
        frame.stack.push(U256::zero()); // output offset
        frame.stack.push(U256::zero()); // input size
        frame.stack.push(U256::zero()); // input offset
        frame.stack.push(U256::zero()); // value
        frame.stack.push(U256::zero()); // dst
        frame.stack.push(U256::from(100_000)); // gas
        do_call(&mut frame, &mut host, CallKind::Call, false).unwrap();
        assert_eq!(frame.stack.pop(), U256::one());
    }

    #[test]
    fn call_with_value_and_insufficient_balance_does_not_leak_the_stipend() {
        let mut frame = frame();
        let mut host = AcceptingHost; // get_balance always returns 1_000_000
        frame.gas_left = 1_000_000;
        frame.stack.push(U256::zero()); // output size
        frame.stack.push(U256::zero()); // output offset
        frame.stack.push(U256::zero()); // input size
        frame.stack.push(U256::zero()); // input offset
        frame.stack.push(U256::from(2_000_000)); // value, exceeds the caller's balance
        frame.stack.push(U256::zero()); // dst
        frame.stack.push(U256::from(100_000)); // gas
        do_call(&mut frame, &mut host, CallKind::Call, false).unwrap();
        assert_eq!(frame.stack.pop(), U256::zero(), "skipped call must push failure");
        assert_eq!(frame.gas_left, 1_000_000 - 9000, "the stipend must not be credited when the call never dispatches");
    }

    #[test]
    fn create_rejects_init_code_one_byte_over_the_cap() {
        let mut frame = frame();
        let mut host = AcceptingHost;
        frame.gas_left = 10_000_000;
        let size = crate::code::MAX_CODE_SIZE + 1;
        frame.stack.push(U256::from(size)); // size
        frame.stack.push(U256::zero()); // offset
        frame.stack.push(U256::zero()); // endowment
        let err = do_create(&mut frame, &mut host, false).unwrap_err();
        assert_eq!(err, FailureReason::InitCodeTooLarge);
    }

    #[test]
    fn create_accepts_init_code_exactly_at_the_cap() {
        let mut frame = frame();
        let mut host = AcceptingHost;
        frame.gas_left = 10_000_000;
        let size = crate::code::MAX_CODE_SIZE;
        frame.stack.push(U256::from(size)); // size
        frame.stack.push(U256::zero()); // offset
        frame.stack.push(U256::zero()); // endowment
        do_create(&mut frame, &mut host, false).unwrap();
    }

    #[test]
    fn create2_reports_created_address() {
        let mut frame = frame();
        let mut host = AcceptingHost;
        frame.gas_left = 1_000_000;
        frame.stack.push(U256::zero()); // salt
        frame.stack.push(U256::zero()); // size
        frame.stack.push(U256::zero()); // offset
        frame.stack.push(U256::zero()); // endowment
        do_create(&mut frame, &mut host, true).unwrap();
        assert_eq!(frame.stack.pop(), address_to_u256(ethereum_types::Address::zero()));
    }
}

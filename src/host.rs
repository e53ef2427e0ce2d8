//! The synchronous host callback surface: everything the interpreter needs
//! from world state, the access list, and the ability to recurse into a
//! nested call, without ever suspending the dispatch loop to do it.

use crate::common::{CallKind, CallParams, CallResult};
use crate::error::HostError;
use ethereum_types::{Address, H256, U256};

/// State access status ([EIP-2929]).
///
/// [EIP-2929]: https://eips.ethereum.org/EIPS/eip-2929
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessStatus {
    #[default]
    Cold,
    Warm,
}

/// Storage write transition, per [EIP-2200]/[EIP-2929]/[EIP-3529]. Distinct
/// from [`crate::gas::SstoreCost`]: this is what the host reports back after
/// performing the write, while `SstoreCost` is what the instruction computes
/// beforehand to know how much gas to charge.
///
/// [EIP-2200]: https://eips.ethereum.org/EIPS/eip-2200
/// [EIP-2929]: https://eips.ethereum.org/EIPS/eip-2929
/// [EIP-3529]: https://eips.ethereum.org/EIPS/eip-3529
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    Unchanged,
    Modified,
    ModifiedAgain,
    Added,
    Deleted,
}

/// Block- and transaction-scoped data, constant for the lifetime of a single
/// top-level call and all of its nested frames.
#[derive(Clone, Debug, Default)]
pub struct TxContext {
    pub tx_gas_price: U256,
    pub tx_origin: Address,
    pub block_coinbase: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub block_gas_limit: u64,
    pub block_difficulty: U256,
    pub block_prev_randao: U256,
    pub chain_id: U256,
    pub block_base_fee: U256,
    pub blob_base_fee: U256,
    pub blob_hashes: Vec<H256>,
}

/// Everything the interpreter needs from the embedding world-state, called
/// synchronously and opaquely: the interpreter does not know or care whether
/// a given callback resolves instantly or blocks on I/O.
pub trait RunContext {
    fn account_exists(&self, address: Address) -> Result<bool, HostError>;
    fn get_balance(&self, address: Address) -> Result<U256, HostError>;
    fn get_nonce(&self, address: Address) -> Result<u64, HostError>;
    fn get_code_size(&self, address: Address) -> Result<usize, HostError>;
    fn get_code_hash(&self, address: Address) -> Result<H256, HostError>;
    fn get_code(&self, address: Address) -> Result<bytes::Bytes, HostError>;

    fn access_account(&mut self, address: Address) -> Result<AccessStatus, HostError>;
    fn access_storage(&mut self, address: Address, key: H256) -> Result<AccessStatus, HostError>;
    fn is_address_in_access_list(&self, address: Address) -> bool;
    fn is_slot_in_access_list(&self, address: Address, key: H256) -> bool;

    fn get_storage(&self, address: Address, key: H256) -> Result<H256, HostError>;
    fn set_storage(
        &mut self,
        address: Address,
        key: H256,
        value: H256,
    ) -> Result<StorageStatus, HostError>;
    fn get_committed_storage(&self, address: Address, key: H256) -> Result<H256, HostError>;
    fn get_transient_storage(&self, address: Address, key: H256) -> Result<H256, HostError>;
    fn set_transient_storage(
        &mut self,
        address: Address,
        key: H256,
        value: H256,
    ) -> Result<(), HostError>;

    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]) -> Result<(), HostError>;
    /// Returns `true` if this is the first time `address` self-destructs in
    /// this transaction (relevant for refund bookkeeping pre-London).
    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> Result<bool, HostError>;
    fn has_selfdestructed(&self, address: Address) -> bool;

    /// Execute a nested call or create. `kind` and `params.kind` agree; it is
    /// passed separately because some hosts dispatch on it before looking at
    /// the rest of `params`.
    fn call(&mut self, kind: CallKind, params: CallParams) -> CallResult;

    fn get_block_hash(&self, block_number: u64) -> Result<H256, HostError>;
    fn get_tx_context(&self) -> Result<TxContext, HostError>;
}

/// A host that refuses every operation. Useful as a base for tests that only
/// exercise opcodes with no host interaction.
#[derive(Default)]
pub struct DummyRunContext;

impl RunContext for DummyRunContext {
    fn account_exists(&self, _: Address) -> Result<bool, HostError> {
        Err(HostError::Unsupported("account_exists"))
    }
    fn get_balance(&self, _: Address) -> Result<U256, HostError> {
        Err(HostError::Unsupported("get_balance"))
    }
    fn get_nonce(&self, _: Address) -> Result<u64, HostError> {
        Err(HostError::Unsupported("get_nonce"))
    }
    fn get_code_size(&self, _: Address) -> Result<usize, HostError> {
        Err(HostError::Unsupported("get_code_size"))
    }
    fn get_code_hash(&self, _: Address) -> Result<H256, HostError> {
        Err(HostError::Unsupported("get_code_hash"))
    }
    fn get_code(&self, _: Address) -> Result<bytes::Bytes, HostError> {
        Err(HostError::Unsupported("get_code"))
    }
    fn access_account(&mut self, _: Address) -> Result<AccessStatus, HostError> {
        Err(HostError::Unsupported("access_account"))
    }
    fn access_storage(&mut self, _: Address, _: H256) -> Result<AccessStatus, HostError> {
        Err(HostError::Unsupported("access_storage"))
    }
    fn is_address_in_access_list(&self, _: Address) -> bool {
        false
    }
    fn is_slot_in_access_list(&self, _: Address, _: H256) -> bool {
        false
    }
    fn get_storage(&self, _: Address, _: H256) -> Result<H256, HostError> {
        Err(HostError::Unsupported("get_storage"))
    }
    fn set_storage(&mut self, _: Address, _: H256, _: H256) -> Result<StorageStatus, HostError> {
        Err(HostError::Unsupported("set_storage"))
    }
    fn get_committed_storage(&self, _: Address, _: H256) -> Result<H256, HostError> {
        Err(HostError::Unsupported("get_committed_storage"))
    }
    fn get_transient_storage(&self, _: Address, _: H256) -> Result<H256, HostError> {
        Err(HostError::Unsupported("get_transient_storage"))
    }
    fn set_transient_storage(&mut self, _: Address, _: H256, _: H256) -> Result<(), HostError> {
        Err(HostError::Unsupported("set_transient_storage"))
    }
    fn emit_log(&mut self, _: Address, _: &[u8], _: &[H256]) -> Result<(), HostError> {
        Err(HostError::Unsupported("emit_log"))
    }
    fn selfdestruct(&mut self, _: Address, _: Address) -> Result<bool, HostError> {
        Err(HostError::Unsupported("selfdestruct"))
    }
    fn has_selfdestructed(&self, _: Address) -> bool {
        false
    }
    fn call(&mut self, _: CallKind, _: CallParams) -> CallResult {
        CallResult::failed()
    }
    fn get_block_hash(&self, _: u64) -> Result<H256, HostError> {
        Err(HostError::Unsupported("get_block_hash"))
    }
    fn get_tx_context(&self) -> Result<TxContext, HostError> {
        Err(HostError::Unsupported("get_tx_context"))
    }
}

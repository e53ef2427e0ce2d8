//! An in-memory [`RunContext`] for tests: plain `HashMap`-backed accounts and
//! storage, with an access list that tracks warm/cold status the way a real
//! backend would, instead of blanket-accepting every access like the
//! dispatch-loop unit tests' throwaway host doubles do.

use crate::common::{CallKind, CallParams, CallResult};
use crate::error::HostError;
use crate::host::{AccessStatus, RunContext, StorageStatus, TxContext};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, Default)]
pub struct MockedAccount {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub storage: HashMap<H256, H256>,
}

/// A host whose every piece of state is a plain in-memory map, built up by
/// test setup code before a call is dispatched against it.
#[derive(Clone, Debug)]
pub struct MockedHost {
    pub accounts: HashMap<Address, MockedAccount>,
    pub tx_context: TxContext,
    pub block_hashes: HashMap<u64, H256>,
    pub logs: Vec<(Address, Vec<u8>, Vec<H256>)>,
    pub selfdestructs: Vec<(Address, Address)>,
    accessed_accounts: HashSet<Address>,
    accessed_storage: HashSet<(Address, H256)>,
    call_result: CallResult,
}

impl Default for MockedHost {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tx_context: TxContext::default(),
            block_hashes: HashMap::new(),
            logs: Vec::new(),
            selfdestructs: Vec::new(),
            accessed_accounts: HashSet::new(),
            accessed_storage: HashSet::new(),
            call_result: CallResult::failed(),
        }
    }
}

impl MockedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// What any nested `CALL`/`CREATE` will report back, regardless of
    /// `params`. Defaults to `CallResult::failed()`.
    pub fn set_call_result(&mut self, result: CallResult) {
        self.call_result = result;
    }

    pub fn account_mut(&mut self, address: Address) -> &mut MockedAccount {
        self.accounts.entry(address).or_default()
    }

    fn account(&self, address: Address) -> MockedAccount {
        self.accounts.get(&address).cloned().unwrap_or_default()
    }
}

impl RunContext for MockedHost {
    fn account_exists(&self, address: Address) -> Result<bool, HostError> {
        Ok(self.accounts.contains_key(&address))
    }

    fn get_balance(&self, address: Address) -> Result<U256, HostError> {
        Ok(self.account(address).balance)
    }

    fn get_nonce(&self, address: Address) -> Result<u64, HostError> {
        Ok(self.account(address).nonce)
    }

    fn get_code_size(&self, address: Address) -> Result<usize, HostError> {
        Ok(self.account(address).code.len())
    }

    fn get_code_hash(&self, address: Address) -> Result<H256, HostError> {
        let code = self.account(address).code;
        Ok(H256::from(crate::hash_cache::HashCache::default().hash(&code)))
    }

    fn get_code(&self, address: Address) -> Result<Bytes, HostError> {
        Ok(self.account(address).code)
    }

    fn access_account(&mut self, address: Address) -> Result<AccessStatus, HostError> {
        if self.accessed_accounts.insert(address) {
            Ok(AccessStatus::Cold)
        } else {
            Ok(AccessStatus::Warm)
        }
    }

    fn access_storage(&mut self, address: Address, key: H256) -> Result<AccessStatus, HostError> {
        if self.accessed_storage.insert((address, key)) {
            Ok(AccessStatus::Cold)
        } else {
            Ok(AccessStatus::Warm)
        }
    }

    fn is_address_in_access_list(&self, address: Address) -> bool {
        self.accessed_accounts.contains(&address)
    }

    fn is_slot_in_access_list(&self, address: Address, key: H256) -> bool {
        self.accessed_storage.contains(&(address, key))
    }

    fn get_storage(&self, address: Address, key: H256) -> Result<H256, HostError> {
        Ok(self.account(address).storage.get(&key).copied().unwrap_or_default())
    }

    fn set_storage(&mut self, address: Address, key: H256, value: H256) -> Result<StorageStatus, HostError> {
        let account = self.account_mut(address);
        let existed = account.storage.contains_key(&key);
        let was_zero = account.storage.get(&key).copied().unwrap_or_default().is_zero();
        account.storage.insert(key, value);
        Ok(if !existed && !value.is_zero() {
            StorageStatus::Added
        } else if value.is_zero() && !was_zero {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        })
    }

    fn get_committed_storage(&self, address: Address, key: H256) -> Result<H256, HostError> {
        self.get_storage(address, key)
    }

    fn get_transient_storage(&self, _address: Address, _key: H256) -> Result<H256, HostError> {
        Ok(H256::zero())
    }

    fn set_transient_storage(&mut self, _address: Address, _key: H256, _value: H256) -> Result<(), HostError> {
        Ok(())
    }

    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]) -> Result<(), HostError> {
        self.logs.push((address, data.to_vec(), topics.to_vec()));
        Ok(())
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> Result<bool, HostError> {
        let first_time = !self.selfdestructs.iter().any(|(a, _)| *a == address);
        self.selfdestructs.push((address, beneficiary));
        Ok(first_time)
    }

    fn has_selfdestructed(&self, address: Address) -> bool {
        self.selfdestructs.iter().any(|(a, _)| *a == address)
    }

    fn call(&mut self, _kind: CallKind, _params: CallParams) -> CallResult {
        self.call_result.clone()
    }

    fn get_block_hash(&self, block_number: u64) -> Result<H256, HostError> {
        Ok(self.block_hashes.get(&block_number).copied().unwrap_or_default())
    }

    fn get_tx_context(&self) -> Result<TxContext, HostError> {
        Ok(self.tx_context.clone())
    }
}

//! A fluent harness for exercising the interpreter against a [`MockedHost`]
//! without hand-writing a `CallParams` literal in every test.

use crate::code::converter::convert;
use crate::common::{CallKind, CallParams, CallResult, Revision};
use crate::hash_cache::HashCache;
use crate::runner::NoopRunner;
use crate::util::mocked_host::MockedHost;
use bytes::Bytes;
use ethereum_types::{Address, U256};
use std::sync::Arc;

#[derive(Clone, Copy)]
enum GasCheck {
    Used(i64),
    Left(i64),
}

/// Builds a [`CallParams`]/[`MockedHost`] pair, runs it, and asserts whatever
/// checks were configured.
#[must_use]
pub struct EvmTester {
    host: MockedHost,
    apply_host_fns: Vec<Arc<dyn Fn(&mut MockedHost, &CallParams)>>,
    params: CallParams,
    code: Bytes,
    with_super_instructions: bool,
    gas_check: Option<GasCheck>,
    expect_success: Option<bool>,
    expected_output: Option<Vec<u8>>,
}

impl Default for EvmTester {
    fn default() -> Self {
        Self::new()
    }
}

impl EvmTester {
    pub fn new() -> Self {
        Self {
            host: MockedHost::new(),
            apply_host_fns: vec![],
            params: CallParams {
                kind: CallKind::Call,
                is_static: false,
                depth: 0,
                code: Bytes::new(),
                code_hash: None,
                input: Bytes::new(),
                gas: i64::MAX,
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
            },
            code: Bytes::new(),
            with_super_instructions: false,
            gas_check: None,
            expect_success: None,
            expected_output: None,
        }
    }

    pub fn code(mut self, code: impl Into<Bytes>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_super_instructions(mut self) -> Self {
        self.with_super_instructions = true;
        self
    }

    pub fn apply_host(mut self, f: impl Fn(&mut MockedHost, &CallParams) + 'static) -> Self {
        self.apply_host_fns.push(Arc::new(f));
        self
    }

    pub fn revision(mut self, revision: Revision) -> Self {
        self.params.revision = revision;
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.params.depth = depth;
        self
    }

    pub fn gas(mut self, gas: i64) -> Self {
        self.params.gas = gas;
        self
    }

    pub fn set_static(mut self, is_static: bool) -> Self {
        self.params.is_static = is_static;
        self
    }

    pub fn recipient(mut self, recipient: Address) -> Self {
        self.params.recipient = recipient;
        self
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.params.sender = sender;
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.params.value = value.into();
        self
    }

    pub fn input(mut self, input: impl Into<Bytes>) -> Self {
        self.params.input = input.into();
        self
    }

    pub fn gas_used(mut self, expected: i64) -> Self {
        self.gas_check = Some(GasCheck::Used(expected));
        self
    }

    pub fn gas_left(mut self, expected: i64) -> Self {
        self.gas_check = Some(GasCheck::Left(expected));
        self
    }

    pub fn expect_success(mut self, success: bool) -> Self {
        self.expect_success = Some(success);
        self
    }

    pub fn output(mut self, expected: impl Into<Vec<u8>>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    pub fn run(mut self) -> CallResult {
        self.params.code = self.code.clone();
        for f in &self.apply_host_fns {
            f(&mut self.host, &self.params);
        }

        let lowered = convert(&self.code, self.with_super_instructions);
        let hash_cache = HashCache::default();
        let mut runner = NoopRunner;
        let result = crate::interpreter::run(self.params.clone(), &lowered, &mut self.host, &hash_cache, &mut runner);

        if let Some(expected) = self.expect_success {
            assert_eq!(result.success, expected, "success mismatch");
        }
        if let Some(check) = self.gas_check {
            match check {
                GasCheck::Used(used) => assert_eq!(self.params.gas - result.gas_left, used, "gas used mismatch"),
                GasCheck::Left(left) => assert_eq!(result.gas_left, left, "gas left mismatch"),
            }
        }
        if let Some(expected) = &self.expected_output {
            assert_eq!(&result.output[..], &expected[..], "output mismatch");
        }

        result
    }
}

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use strum_macros::Display;

/// EVM consensus revision.
///
/// Later variants carry strictly more rules than earlier ones; opcode
/// availability and gas prices are gated by `revision >= SomeFork`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    /// The Frontier revision. The one Ethereum launched with.
    Frontier = 0,
    /// [EIP-606](https://eips.ethereum.org/EIPS/eip-606).
    Homestead = 1,
    /// [EIP-608](https://eips.ethereum.org/EIPS/eip-608).
    Tangerine = 2,
    /// [EIP-607](https://eips.ethereum.org/EIPS/eip-607).
    Spurious = 3,
    /// [EIP-609](https://eips.ethereum.org/EIPS/eip-609).
    Byzantium = 4,
    /// [EIP-1013](https://eips.ethereum.org/EIPS/eip-1013).
    Constantinople = 5,
    /// [EIP-1716](https://eips.ethereum.org/EIPS/eip-1716).
    Petersburg = 6,
    /// [EIP-1679](https://eips.ethereum.org/EIPS/eip-1679).
    Istanbul = 7,
    /// Berlin: [EIP-2929](https://eips.ethereum.org/EIPS/eip-2929)/[EIP-2930](https://eips.ethereum.org/EIPS/eip-2930).
    Berlin = 8,
    /// London: [EIP-1559](https://eips.ethereum.org/EIPS/eip-1559)/[EIP-3529](https://eips.ethereum.org/EIPS/eip-3529).
    London = 9,
    /// Paris (the Merge).
    Paris = 10,
    /// Shanghai: [EIP-3855](https://eips.ethereum.org/EIPS/eip-3855) (`PUSH0`).
    Shanghai = 11,
    /// Cancun: [EIP-1153](https://eips.ethereum.org/EIPS/eip-1153), [EIP-4844](https://eips.ethereum.org/EIPS/eip-4844), [EIP-5656](https://eips.ethereum.org/EIPS/eip-5656).
    Cancun = 12,
}

impl Revision {
    pub const ALL: [Self; 13] = [
        Self::Frontier,
        Self::Homestead,
        Self::Tangerine,
        Self::Spurious,
        Self::Byzantium,
        Self::Constantinople,
        Self::Petersburg,
        Self::Istanbul,
        Self::Berlin,
        Self::London,
        Self::Paris,
        Self::Shanghai,
        Self::Cancun,
    ];

    pub fn iter() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied()
    }

    pub const fn len() -> usize {
        Self::Cancun as usize + 1
    }

    pub const fn latest() -> Self {
        Self::Cancun
    }
}

/// The kind of call-like instruction that produced a nested frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Call,
    DelegateCall,
    CallCode,
    StaticCall,
    Create,
    Create2 { salt: U256 },
}

/// A call into a contract, as delivered by the host or synthesized for a nested frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CallParams {
    /// The kind of the call. Zero-depth calls use `CallKind::Call`.
    pub kind: CallKind,
    /// Read-only frame: any write-family opcode fails with `StaticModeViolation`.
    pub is_static: bool,
    /// Call depth, zero at the top-level call.
    pub depth: u32,
    /// Contract code to execute.
    pub code: Bytes,
    /// Content hash of `code`. Absent means "do not use the conversion cache".
    pub code_hash: Option<[u8; 32]>,
    /// Call data.
    pub input: Bytes,
    /// Initial gas.
    pub gas: i64,
    pub recipient: Address,
    pub sender: Address,
    pub origin: Address,
    pub coinbase: Address,
    pub value: U256,
    pub gas_price: U256,
    pub base_fee: U256,
    pub blob_base_fee: U256,
    pub block_number: i64,
    pub timestamp: i64,
    pub gas_limit: i64,
    pub prev_randao: U256,
    pub chain_id: U256,
    pub blob_hashes: Vec<H256>,
    pub revision: Revision,
}

/// The outcome of a completed call, nested or top-level.
#[derive(Clone, Debug, PartialEq)]
pub struct CallResult {
    pub success: bool,
    pub output: Bytes,
    pub gas_left: i64,
    pub gas_refund: i64,
    /// Set only for `CREATE`/`CREATE2`-kind calls that succeeded.
    pub created_address: Option<Address>,
}

impl CallResult {
    pub fn failed() -> Self {
        Self {
            success: false,
            output: Bytes::new(),
            gas_left: 0,
            gas_refund: 0,
            created_address: None,
        }
    }
}

/// Terminal or in-flight state of a single call frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Stopped,
    Reverted,
    Returned,
    SelfDestructed,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Running)
    }
}

/// Diagnostic detail behind a `Status::Failed` result. Never surfaced through
/// `CallResult` (per the external contract, a failure is just zero-everything),
/// but useful to a logging/statistics runner or to tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum FailureReason {
    #[strum(serialize = "out of gas")]
    OutOfGas,
    #[strum(serialize = "stack underflow")]
    StackUnderflow,
    #[strum(serialize = "stack overflow")]
    StackOverflow,
    #[strum(serialize = "bad jump destination")]
    InvalidJump,
    #[strum(serialize = "undefined instruction")]
    UndefinedInstruction,
    #[strum(serialize = "static mode violation")]
    StaticModeViolation,
    #[strum(serialize = "init code too large")]
    InitCodeTooLarge,
    #[strum(serialize = "pc out of range")]
    PcOutOfRange,
    #[strum(serialize = "opcode not active in this revision")]
    RevisionTooOld,
    #[strum(serialize = "numeric overflow in memory sizing")]
    MemoryOverflow,
    #[strum(serialize = "invalid instruction")]
    InvalidInstruction,
    #[strum(serialize = "host callback failed")]
    HostError,
}

#[inline]
pub(crate) fn u256_to_address(v: U256) -> Address {
    Address::from(H256(v.into()))
}

#[inline]
pub(crate) fn address_to_u256(v: Address) -> U256 {
    U256::from_big_endian(v.as_bytes())
}

//! Static and dynamic gas accounting.
//!
//! Static, per-opcode costs and stack-bounds requirements are tabulated once
//! per revision, mirroring how a geth-style cost schedule is normally laid
//! out: each later fork's table is derived from its predecessor's by patching
//! in only what changed. Dynamic costs (memory expansion, `SSTORE`,
//! `EXP`, `SHA3`, `LOG*`, calls, creates) are plain functions, computed by
//! the instruction handler that needs them.

use crate::common::Revision;
use crate::opcode::OpCode;
use once_cell::sync::Lazy;

pub const COLD_SLOAD_COST: u64 = 2100;
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
pub const WARM_STORAGE_READ_COST: u64 = 100;
pub const ADDITIONAL_COLD_ACCOUNT_ACCESS_COST: u64 =
    COLD_ACCOUNT_ACCESS_COST - WARM_STORAGE_READ_COST;
pub const NEW_ACCOUNT_COST: u64 = 25_000;
pub const CALL_STIPEND: u64 = 2300;
pub const SSTORE_SENTRY_GAS: i64 = 2300;

/// Size of the flat opcode-indexed tables: covers base opcodes
/// (`0x00..=0xFF`) and super-instructions (`0x200..`); the auxiliary range
/// (`0x100..=0x1FF`) never carries a static cost of its own.
const TABLE_SIZE: usize = 0x214;

/// Stack bounds for a single dispatch: `required` is the minimum stack depth
/// needed to avoid underflow anywhere in the operation, `peak_growth` is the
/// largest the stack transiently grows above its entry height, used for the
/// overflow check. A plain single-effect opcode has `peak_growth` equal to
/// `max(stack_height_change, 0)`; a fused super-instruction can need more,
/// since an early push in the sequence can transiently exceed the net change
/// of the whole fusion before later pops bring it back down.
#[derive(Clone, Copy, Debug)]
pub struct StackBounds {
    pub required: u16,
    pub peak_growth: u16,
}

const fn bounds(required: u16, peak_growth: u16) -> StackBounds {
    StackBounds {
        required,
        peak_growth,
    }
}

static STACK_BOUNDS: Lazy<[Option<StackBounds>; TABLE_SIZE]> = Lazy::new(|| {
    let mut t: [Option<StackBounds>; TABLE_SIZE] = [None; TABLE_SIZE];

    t[OpCode::STOP.to_usize()] = Some(bounds(0, 0));
    for op in [
        OpCode::ADD, OpCode::MUL, OpCode::SUB, OpCode::DIV, OpCode::SDIV, OpCode::MOD,
        OpCode::SMOD, OpCode::EXP, OpCode::SIGNEXTEND, OpCode::LT, OpCode::GT, OpCode::SLT,
        OpCode::SGT, OpCode::EQ, OpCode::AND, OpCode::OR, OpCode::XOR, OpCode::BYTE,
        OpCode::SHL, OpCode::SHR, OpCode::SAR, OpCode::KECCAK256,
    ] {
        t[op.to_usize()] = Some(bounds(2, 0));
    }
    for op in [OpCode::ADDMOD, OpCode::MULMOD] {
        t[op.to_usize()] = Some(bounds(3, 0));
    }
    for op in [OpCode::ISZERO, OpCode::NOT] {
        t[op.to_usize()] = Some(bounds(1, 0));
    }

    for op in [
        OpCode::ADDRESS, OpCode::ORIGIN, OpCode::CALLER, OpCode::CALLVALUE,
        OpCode::CALLDATASIZE, OpCode::CODESIZE, OpCode::GASPRICE, OpCode::RETURNDATASIZE,
        OpCode::COINBASE, OpCode::TIMESTAMP, OpCode::NUMBER, OpCode::DIFFICULTY,
        OpCode::GASLIMIT, OpCode::CHAINID, OpCode::SELFBALANCE, OpCode::BASEFEE,
        OpCode::BLOBBASEFEE, OpCode::PC, OpCode::MSIZE, OpCode::GAS, OpCode::PUSH0,
    ] {
        t[op.to_usize()] = Some(bounds(0, 1));
    }
    for op in [
        OpCode::BALANCE, OpCode::CALLDATALOAD, OpCode::EXTCODESIZE, OpCode::RETURNDATACOPY,
        OpCode::EXTCODEHASH, OpCode::BLOCKHASH, OpCode::MLOAD, OpCode::SLOAD, OpCode::TLOAD,
        OpCode::BLOBHASH,
    ] {
        t[op.to_usize()] = Some(bounds(1, 0));
    }
    for op in [OpCode::CALLDATACOPY, OpCode::CODECOPY] {
        t[op.to_usize()] = Some(bounds(3, 0));
    }
    t[OpCode::EXTCODECOPY.to_usize()] = Some(bounds(4, 0));

    t[OpCode::POP.to_usize()] = Some(bounds(1, 0));
    for op in [OpCode::MSTORE, OpCode::SSTORE, OpCode::TSTORE] {
        t[op.to_usize()] = Some(bounds(2, 0));
    }
    t[OpCode::MSTORE8.to_usize()] = Some(bounds(2, 0));
    t[OpCode::JUMP.to_usize()] = Some(bounds(1, 0));
    t[OpCode::JUMPI.to_usize()] = Some(bounds(2, 0));
    t[OpCode::JUMPDEST.to_usize()] = Some(bounds(0, 0));
    t[OpCode::MCOPY.to_usize()] = Some(bounds(3, 0));

    for (i, op) in (OpCode::PUSH1.to_usize()..=OpCode::PUSH32.to_usize()).enumerate() {
        let _ = i;
        t[op] = Some(bounds(0, 1));
    }
    for (i, op) in (OpCode::DUP1.to_usize()..=OpCode::DUP16.to_usize()).enumerate() {
        t[op] = Some(bounds(i as u16 + 1, 1));
    }
    for (i, op) in (OpCode::SWAP1.to_usize()..=OpCode::SWAP16.to_usize()).enumerate() {
        t[op] = Some(bounds(i as u16 + 2, 0));
    }
    for (i, op) in (OpCode::LOG0.to_usize()..=OpCode::LOG4.to_usize()).enumerate() {
        t[op] = Some(bounds(i as u16 + 2, 0));
    }

    t[OpCode::CREATE.to_usize()] = Some(bounds(3, 1));
    t[OpCode::CALL.to_usize()] = Some(bounds(7, 1));
    t[OpCode::CALLCODE.to_usize()] = Some(bounds(7, 1));
    t[OpCode::RETURN.to_usize()] = Some(bounds(2, 0));
    t[OpCode::DELEGATECALL.to_usize()] = Some(bounds(6, 1));
    t[OpCode::CREATE2.to_usize()] = Some(bounds(4, 1));
    t[OpCode::STATICCALL.to_usize()] = Some(bounds(6, 1));
    t[OpCode::REVERT.to_usize()] = Some(bounds(2, 0));
    t[OpCode::INVALID.to_usize()] = Some(bounds(0, 0));
    t[OpCode::SELFDESTRUCT.to_usize()] = Some(bounds(1, 0));

    // Super-instructions: bounds computed by simulating the constituent
    // sequence (see the worked derivations in DESIGN.md).
    t[OpCode::PUSH1_PUSH1.to_usize()] = Some(bounds(0, 2));
    t[OpCode::SWAP1_POP.to_usize()] = Some(bounds(2, 0));
    t[OpCode::POP_POP.to_usize()] = Some(bounds(2, 0));
    t[OpCode::PUSH2_JUMP.to_usize()] = Some(bounds(0, 1));
    t[OpCode::PUSH2_JUMPI.to_usize()] = Some(bounds(1, 1));
    t[OpCode::SWAP2_SWAP1_POP_JUMP.to_usize()] = Some(bounds(3, 0));
    t[OpCode::ISZERO_PUSH2_JUMPI.to_usize()] = Some(bounds(1, 1));
    t[OpCode::SWAP1_POP_SWAP2_SWAP1.to_usize()] = Some(bounds(4, 0));
    t[OpCode::POP_SWAP2_SWAP1_POP.to_usize()] = Some(bounds(4, 0));
    t[OpCode::AND_SWAP1_POP_SWAP2_SWAP1.to_usize()] = Some(bounds(5, 0));
    t[OpCode::PUSH1_ADD.to_usize()] = Some(bounds(1, 1));
    t[OpCode::PUSH1_SHL.to_usize()] = Some(bounds(1, 1));
    t[OpCode::PUSH1_DUP1.to_usize()] = Some(bounds(0, 2));
    t[OpCode::DUP2_LT.to_usize()] = Some(bounds(2, 1));
    t[OpCode::DUP2_MSTORE.to_usize()] = Some(bounds(2, 1));
    t[OpCode::SWAP2_SWAP1.to_usize()] = Some(bounds(3, 0));
    t[OpCode::SWAP2_POP.to_usize()] = Some(bounds(3, 0));
    t[OpCode::POP_JUMP.to_usize()] = Some(bounds(2, 0));
    t[OpCode::PUSH1_PUSH4_DUP3.to_usize()] = Some(bounds(1, 3));
    t[OpCode::PUSH1_PUSH1_PUSH1_SHL_SUB.to_usize()] = Some(bounds(0, 3));

    t
});

pub fn stack_bounds(op: OpCode) -> Option<StackBounds> {
    STACK_BOUNDS.get(op.to_usize()).copied().flatten()
}

macro_rules! fork_table {
    ($name:ident, $base:expr, { $($op:expr => $cost:expr),* $(,)? }) => {
        static $name: Lazy<[Option<u16>; TABLE_SIZE]> = Lazy::new(|| {
            let mut t = *$base;
            $(t[$op.to_usize()] = Some($cost);)*
            t
        });
    };
}

static FRONTIER_GAS_COSTS: Lazy<[Option<u16>; TABLE_SIZE]> = Lazy::new(|| {
    let mut t: [Option<u16>; TABLE_SIZE] = [None; TABLE_SIZE];

    t[OpCode::STOP.to_usize()] = Some(0);
    t[OpCode::ADD.to_usize()] = Some(3);
    t[OpCode::MUL.to_usize()] = Some(5);
    t[OpCode::SUB.to_usize()] = Some(3);
    t[OpCode::DIV.to_usize()] = Some(5);
    t[OpCode::SDIV.to_usize()] = Some(5);
    t[OpCode::MOD.to_usize()] = Some(5);
    t[OpCode::SMOD.to_usize()] = Some(5);
    t[OpCode::ADDMOD.to_usize()] = Some(8);
    t[OpCode::MULMOD.to_usize()] = Some(8);
    t[OpCode::EXP.to_usize()] = Some(10);
    t[OpCode::SIGNEXTEND.to_usize()] = Some(5);
    for op in [OpCode::LT, OpCode::GT, OpCode::SLT, OpCode::SGT, OpCode::EQ] {
        t[op.to_usize()] = Some(3);
    }
    t[OpCode::ISZERO.to_usize()] = Some(3);
    for op in [OpCode::AND, OpCode::OR, OpCode::XOR, OpCode::NOT, OpCode::BYTE] {
        t[op.to_usize()] = Some(3);
    }
    t[OpCode::KECCAK256.to_usize()] = Some(30);
    t[OpCode::ADDRESS.to_usize()] = Some(2);
    t[OpCode::BALANCE.to_usize()] = Some(20);
    t[OpCode::ORIGIN.to_usize()] = Some(2);
    t[OpCode::CALLER.to_usize()] = Some(2);
    t[OpCode::CALLVALUE.to_usize()] = Some(2);
    t[OpCode::CALLDATALOAD.to_usize()] = Some(3);
    t[OpCode::CALLDATASIZE.to_usize()] = Some(2);
    t[OpCode::CALLDATACOPY.to_usize()] = Some(3);
    t[OpCode::CODESIZE.to_usize()] = Some(2);
    t[OpCode::CODECOPY.to_usize()] = Some(3);
    t[OpCode::GASPRICE.to_usize()] = Some(2);
    t[OpCode::EXTCODESIZE.to_usize()] = Some(20);
    t[OpCode::EXTCODECOPY.to_usize()] = Some(20);
    t[OpCode::BLOCKHASH.to_usize()] = Some(20);
    t[OpCode::COINBASE.to_usize()] = Some(2);
    t[OpCode::TIMESTAMP.to_usize()] = Some(2);
    t[OpCode::NUMBER.to_usize()] = Some(2);
    t[OpCode::DIFFICULTY.to_usize()] = Some(2);
    t[OpCode::GASLIMIT.to_usize()] = Some(2);
    t[OpCode::POP.to_usize()] = Some(2);
    t[OpCode::MLOAD.to_usize()] = Some(3);
    t[OpCode::MSTORE.to_usize()] = Some(3);
    t[OpCode::MSTORE8.to_usize()] = Some(3);
    t[OpCode::SLOAD.to_usize()] = Some(50);
    t[OpCode::SSTORE.to_usize()] = Some(0);
    t[OpCode::JUMP.to_usize()] = Some(8);
    t[OpCode::JUMPI.to_usize()] = Some(10);
    t[OpCode::PC.to_usize()] = Some(2);
    t[OpCode::MSIZE.to_usize()] = Some(2);
    t[OpCode::GAS.to_usize()] = Some(2);
    t[OpCode::JUMPDEST.to_usize()] = Some(1);

    for op in OpCode::PUSH1.to_usize()..=OpCode::PUSH32.to_usize() {
        t[op] = Some(3);
    }
    for op in OpCode::DUP1.to_usize()..=OpCode::DUP16.to_usize() {
        t[op] = Some(3);
    }
    for op in OpCode::SWAP1.to_usize()..=OpCode::SWAP16.to_usize() {
        t[op] = Some(3);
    }
    for (i, op) in (OpCode::LOG0.to_usize()..=OpCode::LOG4.to_usize()).enumerate() {
        t[op] = Some((1 + i as u16) * 375);
    }

    t[OpCode::CREATE.to_usize()] = Some(32000);
    t[OpCode::CALL.to_usize()] = Some(40);
    t[OpCode::CALLCODE.to_usize()] = Some(40);
    t[OpCode::RETURN.to_usize()] = Some(0);
    t[OpCode::INVALID.to_usize()] = Some(0);
    t[OpCode::SELFDESTRUCT.to_usize()] = Some(0);

    t[OpCode::PUSH1_PUSH1.to_usize()] = Some(6);
    t[OpCode::SWAP1_POP.to_usize()] = Some(5);
    t[OpCode::POP_POP.to_usize()] = Some(4);
    t[OpCode::PUSH2_JUMP.to_usize()] = Some(11);
    t[OpCode::PUSH2_JUMPI.to_usize()] = Some(13);
    t[OpCode::SWAP2_SWAP1_POP_JUMP.to_usize()] = Some(16);
    t[OpCode::ISZERO_PUSH2_JUMPI.to_usize()] = Some(16);
    t[OpCode::SWAP1_POP_SWAP2_SWAP1.to_usize()] = Some(11);
    t[OpCode::POP_SWAP2_SWAP1_POP.to_usize()] = Some(10);
    t[OpCode::PUSH1_ADD.to_usize()] = Some(6);
    t[OpCode::PUSH1_DUP1.to_usize()] = Some(6);
    t[OpCode::DUP2_LT.to_usize()] = Some(6);
    t[OpCode::DUP2_MSTORE.to_usize()] = Some(6);
    t[OpCode::SWAP2_SWAP1.to_usize()] = Some(6);
    t[OpCode::SWAP2_POP.to_usize()] = Some(5);
    t[OpCode::POP_JUMP.to_usize()] = Some(10);
    t[OpCode::PUSH1_PUSH4_DUP3.to_usize()] = Some(9);

    t
});

fork_table!(HOMESTEAD_GAS_COSTS, FRONTIER_GAS_COSTS, {
    OpCode::DELEGATECALL => 40,
});

fork_table!(TANGERINE_GAS_COSTS, HOMESTEAD_GAS_COSTS, {
    OpCode::BALANCE => 400,
    OpCode::EXTCODESIZE => 700,
    OpCode::EXTCODECOPY => 700,
    OpCode::SLOAD => 200,
    OpCode::CALL => 700,
    OpCode::CALLCODE => 700,
    OpCode::DELEGATECALL => 700,
    OpCode::SELFDESTRUCT => 5000,
});

static SPURIOUS_GAS_COSTS: Lazy<[Option<u16>; TABLE_SIZE]> = Lazy::new(|| *TANGERINE_GAS_COSTS);

fork_table!(BYZANTIUM_GAS_COSTS, SPURIOUS_GAS_COSTS, {
    OpCode::RETURNDATASIZE => 2,
    OpCode::RETURNDATACOPY => 3,
    OpCode::STATICCALL => 700,
    OpCode::REVERT => 0,
});

fork_table!(CONSTANTINOPLE_GAS_COSTS, BYZANTIUM_GAS_COSTS, {
    OpCode::SHL => 3,
    OpCode::SHR => 3,
    OpCode::SAR => 3,
    OpCode::EXTCODEHASH => 400,
    OpCode::CREATE2 => 32000,
});

static PETERSBURG_GAS_COSTS: Lazy<[Option<u16>; TABLE_SIZE]> =
    Lazy::new(|| *CONSTANTINOPLE_GAS_COSTS);

fork_table!(ISTANBUL_GAS_COSTS, PETERSBURG_GAS_COSTS, {
    OpCode::BALANCE => 700,
    OpCode::CHAINID => 2,
    OpCode::EXTCODEHASH => 700,
    OpCode::SELFBALANCE => 5,
    OpCode::SLOAD => 800,
});

static BERLIN_GAS_COSTS: Lazy<[Option<u16>; TABLE_SIZE]> = Lazy::new(|| {
    let mut t = *ISTANBUL_GAS_COSTS;
    let warm = WARM_STORAGE_READ_COST as u16;
    t[OpCode::EXTCODESIZE.to_usize()] = Some(warm);
    t[OpCode::EXTCODECOPY.to_usize()] = Some(warm);
    t[OpCode::EXTCODEHASH.to_usize()] = Some(warm);
    t[OpCode::BALANCE.to_usize()] = Some(warm);
    t[OpCode::CALL.to_usize()] = Some(warm);
    t[OpCode::CALLCODE.to_usize()] = Some(warm);
    t[OpCode::DELEGATECALL.to_usize()] = Some(warm);
    t[OpCode::STATICCALL.to_usize()] = Some(warm);
    t[OpCode::SLOAD.to_usize()] = Some(warm);
    t
});

fork_table!(LONDON_GAS_COSTS, BERLIN_GAS_COSTS, {
    OpCode::BASEFEE => 2,
});

static PARIS_GAS_COSTS: Lazy<[Option<u16>; TABLE_SIZE]> = Lazy::new(|| *LONDON_GAS_COSTS);

fork_table!(SHANGHAI_GAS_COSTS, PARIS_GAS_COSTS, {
    OpCode::PUSH0 => 2,
});

fork_table!(CANCUN_GAS_COSTS, SHANGHAI_GAS_COSTS, {
    OpCode::TLOAD => WARM_STORAGE_READ_COST as u16,
    OpCode::TSTORE => WARM_STORAGE_READ_COST as u16,
    OpCode::BLOBHASH => 3,
    OpCode::BLOBBASEFEE => 2,
    OpCode::MCOPY => 3,
});

/// Static gas cost table for `revision`. `None` means the opcode is
/// undefined (or not yet introduced) in that revision.
pub fn static_gas_costs(revision: Revision) -> &'static [Option<u16>; TABLE_SIZE] {
    match revision {
        Revision::Frontier => &FRONTIER_GAS_COSTS,
        Revision::Homestead => &HOMESTEAD_GAS_COSTS,
        Revision::Tangerine => &TANGERINE_GAS_COSTS,
        Revision::Spurious => &SPURIOUS_GAS_COSTS,
        Revision::Byzantium => &BYZANTIUM_GAS_COSTS,
        Revision::Constantinople => &CONSTANTINOPLE_GAS_COSTS,
        Revision::Petersburg => &PETERSBURG_GAS_COSTS,
        Revision::Istanbul => &ISTANBUL_GAS_COSTS,
        Revision::Berlin => &BERLIN_GAS_COSTS,
        Revision::London => &LONDON_GAS_COSTS,
        Revision::Paris => &PARIS_GAS_COSTS,
        Revision::Shanghai => &SHANGHAI_GAS_COSTS,
        Revision::Cancun => &CANCUN_GAS_COSTS,
    }
}

pub fn static_gas_cost(revision: Revision, op: OpCode) -> Option<u64> {
    static_gas_costs(revision)
        .get(op.to_usize())
        .copied()
        .flatten()
        .map(u64::from)
}

/// Memory expansion cost for growing to `words` 32-byte words, per the
/// quadratic schedule `3w + w^2/512`. Callers charge only the delta between
/// this and whatever was already charged for the memory's current size.
pub fn memory_expansion_cost(words: u64) -> u64 {
    3 * words + (words * words) / 512
}

/// `SHA3`/`KECCAK256` dynamic cost: 6 gas per word hashed.
pub fn keccak256_dynamic_cost(words: u64) -> u64 {
    6 * words
}

/// `CALLDATACOPY`/`CODECOPY`/`EXTCODECOPY`/`RETURNDATACOPY`/`MCOPY` dynamic cost: 3 gas per word copied.
pub fn copy_dynamic_cost(words: u64) -> u64 {
    3 * words
}

/// `LOGn` dynamic cost: 8 gas per byte of data logged.
pub fn log_dynamic_cost(data_len: u64) -> u64 {
    8 * data_len
}

/// `EXP` dynamic cost: `10` gas per significant byte of the exponent before
/// Spurious Dragon, `50` from Spurious Dragon on (EIP-160).
pub fn exp_dynamic_cost(revision: Revision, exponent_byte_len: u64) -> u64 {
    let per_byte = if revision >= Revision::Spurious { 50 } else { 10 };
    per_byte * exponent_byte_len
}

/// `EIP-2929` cold/warm surcharge for an account access (`BALANCE`,
/// `EXTCODESIZE`, `EXTCODECOPY`, `EXTCODEHASH`, `CALL`-family, `SELFDESTRUCT`
/// beneficiary). Pre-Berlin this is always zero: the static cost already
/// reflects the flat pre-2929 price.
pub fn cold_account_access_surcharge(revision: Revision, is_cold: bool) -> u64 {
    if revision >= Revision::Berlin && is_cold {
        ADDITIONAL_COLD_ACCOUNT_ACCESS_COST
    } else {
        0
    }
}

/// `EIP-2929` cold/warm surcharge for a storage slot access (`SLOAD`,
/// and the base cost baked into `SSTORE`'s own table).
pub fn cold_sload_surcharge(revision: Revision, is_cold: bool) -> u64 {
    if revision >= Revision::Berlin && is_cold {
        COLD_SLOAD_COST - WARM_STORAGE_READ_COST
    } else {
        0
    }
}

/// Storage write transition, per [EIP-2200]/[EIP-2929]/[EIP-3529].
///
/// [EIP-2200]: https://eips.ethereum.org/EIPS/eip-2200
/// [EIP-2929]: https://eips.ethereum.org/EIPS/eip-2929
/// [EIP-3529]: https://eips.ethereum.org/EIPS/eip-3529
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SstoreCost {
    pub gas_cost: u64,
    pub gas_refund: i64,
}

/// `current`/`original`/`new` are the slot's value before this write, at the
/// start of the transaction, and after this write, respectively.
pub fn sstore_cost(
    revision: Revision,
    is_cold: bool,
    original: ethereum_types::U256,
    current: ethereum_types::U256,
    new: ethereum_types::U256,
) -> SstoreCost {
    if revision < Revision::Istanbul {
        // Pre-Istanbul: flat transition costs, no refund bookkeeping here.
        let gas_cost = if new.is_zero() && !current.is_zero() {
            5000
        } else if current.is_zero() && !new.is_zero() {
            20000
        } else {
            5000
        };
        let gas_refund = if !current.is_zero() && new.is_zero() {
            15000
        } else {
            0
        };
        return SstoreCost { gas_cost, gas_refund };
    }

    let cold_surcharge = if is_cold { COLD_SLOAD_COST } else { 0 };

    if current == new {
        return SstoreCost {
            gas_cost: cold_surcharge + WARM_STORAGE_READ_COST,
            gas_refund: 0,
        };
    }

    let (sstore_reset, sstore_clear_refund, sstore_set) = (5000u64, 4800i64, 20000u64);

    if original == current {
        if original.is_zero() {
            return SstoreCost {
                gas_cost: cold_surcharge + sstore_set,
                gas_refund: 0,
            };
        }
        let mut refund = 0i64;
        if new.is_zero() {
            refund += sstore_clear_refund;
        }
        return SstoreCost {
            gas_cost: cold_surcharge + sstore_reset - WARM_STORAGE_READ_COST,
            gas_refund: refund,
        };
    }

    // Dirty slot, second-or-later write within the transaction: no base
    // charge beyond the warm-access cost, only refund bookkeeping changes.
    let mut refund = 0i64;
    if !original.is_zero() {
        if current.is_zero() {
            refund -= sstore_clear_refund;
        }
        if new.is_zero() {
            refund += sstore_clear_refund;
        }
    }
    if original == new {
        if original.is_zero() {
            refund += sstore_set as i64 - WARM_STORAGE_READ_COST as i64;
        } else {
            refund += sstore_reset as i64 - WARM_STORAGE_READ_COST as i64;
        }
    }
    SstoreCost {
        gas_cost: cold_surcharge + WARM_STORAGE_READ_COST,
        gas_refund: refund,
    }
}

/// `EIP-2200` sentry check: below Istanbul there is no minimum-remaining-gas
/// gate at all.
pub fn sstore_sentry_violated(revision: Revision, gas_left: i64) -> bool {
    revision >= Revision::Istanbul && gas_left <= SSTORE_SENTRY_GAS
}

/// `SELFDESTRUCT` cost: flat base cost (already in the static table) plus an
/// `EIP-2929` cold-beneficiary surcharge and (Tangerine+) a new-account surcharge.
pub fn selfdestruct_dynamic_cost(
    revision: Revision,
    beneficiary_is_cold: bool,
    beneficiary_is_new_account: bool,
) -> u64 {
    let mut cost = cold_account_access_surcharge(revision, beneficiary_is_cold);
    if revision >= Revision::Tangerine && beneficiary_is_new_account {
        cost += NEW_ACCOUNT_COST;
    }
    cost
}

/// The "one 64th rule" ([EIP-150]): the amount of gas forwardable to a call
/// or create is capped at `available - available / 64`.
///
/// [EIP-150]: https://eips.ethereum.org/EIPS/eip-150
pub fn max_forwardable_gas(revision: Revision, available: i64) -> i64 {
    if revision >= Revision::Tangerine {
        available - available / 64
    } else {
        available
    }
}

/// `CREATE2` dynamic cost: `6` gas per word of init code, for hashing the salt.
pub fn create2_dynamic_cost(init_code_words: u64) -> u64 {
    6 * init_code_words
}

/// [EIP-3860] init-code word cost, charged on top of `CREATE`/`CREATE2`'s base
/// cost from Shanghai onward.
///
/// [EIP-3860]: https://eips.ethereum.org/EIPS/eip-3860
pub fn init_code_word_cost(revision: Revision, init_code_words: u64) -> u64 {
    if revision >= Revision::Shanghai {
        2 * init_code_words
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    #[test]
    fn memory_cost_matches_quadratic_formula() {
        assert_eq!(memory_expansion_cost(1), 3);
        assert_eq!(memory_expansion_cost(512), 3 * 512 + 512);
    }

    #[test]
    fn sstore_pre_istanbul_is_flat() {
        let cost = sstore_cost(Revision::Byzantium, false, U256::zero(), U256::zero(), U256::from(1));
        assert_eq!(cost.gas_cost, 20000);
        assert_eq!(cost.gas_refund, 0);
    }

    #[test]
    fn sstore_noop_after_istanbul_is_cheap() {
        let cost = sstore_cost(Revision::Istanbul, false, U256::from(1), U256::from(1), U256::from(1));
        assert_eq!(cost.gas_cost, WARM_STORAGE_READ_COST);
        assert_eq!(cost.gas_refund, 0);
    }

    #[test]
    fn sstore_cold_slot_pays_cold_sload_surcharge() {
        let cost = sstore_cost(Revision::Berlin, true, U256::zero(), U256::zero(), U256::from(1));
        assert_eq!(cost.gas_cost, COLD_SLOAD_COST + 20000);
    }

    #[test]
    fn sentry_check_only_applies_from_istanbul() {
        assert!(!sstore_sentry_violated(Revision::Byzantium, 100));
        assert!(sstore_sentry_violated(Revision::Istanbul, 100));
        assert!(!sstore_sentry_violated(Revision::Istanbul, 10000));
    }

    #[test]
    fn one_64th_rule_only_applies_from_tangerine() {
        assert_eq!(max_forwardable_gas(Revision::Frontier, 6400), 6400);
        assert_eq!(max_forwardable_gas(Revision::Tangerine, 6400), 6300);
    }

    #[test]
    fn push0_only_costs_gas_from_shanghai() {
        assert!(static_gas_cost(Revision::Paris, OpCode::PUSH0).is_none());
        assert_eq!(static_gas_cost(Revision::Shanghai, OpCode::PUSH0), Some(2));
    }

    #[test]
    fn super_instruction_static_cost_is_the_sum_of_its_parts() {
        assert_eq!(
            static_gas_cost(Revision::Cancun, OpCode::PUSH1_ADD),
            Some(3 + 3)
        );
    }

    #[test]
    fn fused_push_bounds_report_peak_growth_not_just_net_change() {
        let b = stack_bounds(OpCode::PUSH1_PUSH4_DUP3).unwrap();
        assert_eq!(b.peak_growth, 3);
    }
}

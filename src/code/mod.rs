//! Code conversion: lowering raw EVM bytecode into the wide instruction
//! stream the interpreter dispatches on, plus the cache that avoids
//! re-lowering the same contract code on every call.

pub mod cache;
pub mod converter;

pub use cache::{ConversionCache, ConversionOptions};
pub use converter::{convert, convert_with_pc_map, PcMap, MAX_CACHED_LOWERED_LEN, MAX_CODE_SIZE};

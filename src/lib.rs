#![doc = include_str!("../README.md")]

pub use common::{CallKind, CallParams, CallResult, FailureReason, Revision, Status};
pub use error::{ConfigError, HostError};
pub use hash_cache::HashCache;
pub use host::{AccessStatus, RunContext, StorageStatus, TxContext};
pub use instruction::Instruction;
pub use interpreter::run;
pub use opcode::OpCode;
pub use runner::{LoggingRunner, NoopRunner, Runner, StatisticsReport, StatisticsRunner};
pub use state::{Frame, Memory, Stack};

mod common;
pub mod code;
mod error;
mod gas;
mod hash_cache;
pub mod host;
mod instruction;
#[doc(hidden)]
pub mod instructions;
mod interpreter;
pub mod opcode;
mod runner;
mod state;

#[cfg(feature = "util")]
pub mod util;

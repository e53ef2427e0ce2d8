//! Test-only helpers: a raw-bytecode builder, an in-memory host, and a
//! fluent harness wiring the two together. Gated behind the `util` feature
//! so production consumers never pull in `HashMap`-backed mock state.

pub mod bytecode;
pub mod mocked_host;
pub mod tester;

pub use bytecode::{Bytecode, CallInstruction};
pub use mocked_host::MockedHost;
pub use tester::EvmTester;

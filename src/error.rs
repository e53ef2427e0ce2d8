//! Error types shared across the crate.

/// Failure surfaced by a [`crate::host::RunContext`] implementation.
///
/// These never appear inside a [`crate::common::CallResult`]: a host error
/// is translated by the interpreter into a plain `Failed` status, matching
/// how any other runtime failure inside a call frame is reported externally.
#[derive(Clone, Debug, thiserror::Error)]
pub enum HostError {
    #[error("host operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("host backend failure: {0}")]
    Backend(String),
}

/// Failure constructing a [`crate::code::cache::ConversionCache`] or
/// [`crate::hash_cache::HashCache`] from a caller-supplied configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cache byte budget {given} is too small to hold even one lowered word ({minimum} bytes required)")]
    CacheBudgetTooSmall { given: usize, minimum: usize },
}

//! RPC error types.

use thiserror::Error;

pub use crate::config::schema::BlockchainConfig;

/// Chain ID reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

/// Errors from JSON-RPC calls.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Every provider answered with an error (or some timed out and the rest errored).
    #[error("All RPC providers failed to {operation}")]
    AllProvidersFailed { operation: &'static str },

    /// Every provider timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Whether the same call may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AllProvidersFailed { .. } | Self::Timeout(_))
    }
}

pub type BlockchainResult<T> = Result<T, BlockchainError>;

//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! [blockchain] config (RPC URL, failovers, chain id)
//!     → client.rs (HTTP providers with per-call timeouts and failover)
//!     → ingestion::rpc (event log filters for the monitored contract)
//! ```
//!
//! # Constraints
//! - Read-only: the monitor never signs or sends transactions
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the chain is unreachable

pub mod client;
pub mod types;

pub use client::BlockchainClient;
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId};

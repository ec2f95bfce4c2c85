//! Ledger query interface consumed by the ingestion client.

use alloy::primitives::Address;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::events::EventCategory;

/// One undecoded-to-domain log entry as returned by the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogEntry {
    pub transaction_hash: Option<String>,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    /// Event arguments keyed by their ABI name, values rendered as strings.
    pub fields: BTreeMap<String, String>,
}

/// Errors from a single category query.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transport or RPC failure, including timeouts.
    #[error(transparent)]
    Rpc(#[from] BlockchainError),

    /// The batch could not be decoded as the requested event.
    #[error("failed to decode {category} logs: {reason}")]
    Decode {
        category: EventCategory,
        reason: String,
    },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Rpc(e) => e.is_transient(),
            LedgerError::Decode { .. } => false,
            LedgerError::Unavailable(_) => true,
        }
    }
}

/// Source of contract event logs.
pub trait LedgerSource: Send + Sync {
    /// Fetch every `category` event emitted by `contract` at or after `from_block`,
    /// in ledger order.
    fn get_events(
        &self,
        contract: Address,
        category: EventCategory,
        from_block: u64,
    ) -> impl Future<Output = Result<Vec<RawLogEntry>, LedgerError>> + Send;
}

//! Append-only, block-ordered event store for one category.

use arc_swap::ArcSwap;
use dashmap::DashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::events::types::{EventCategory, EventRecord};

/// Errors raised by [`EventStore::append`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record's block is behind the store's highest block (reorg or client bug).
    #[error("{category} event {tx_hash} at block {block_number} is behind stored block {max_block}")]
    OrderingViolation {
        category: EventCategory,
        tx_hash: String,
        block_number: u64,
        max_block: u64,
    },

    /// A record of another category was routed to this store.
    #[error("{actual} event {tx_hash} cannot be stored in the {expected} store")]
    CategoryMismatch {
        expected: EventCategory,
        actual: EventCategory,
        tx_hash: String,
    },
}

/// Ordered log of events for one category.
///
/// Writers publish a new snapshot per appended record, so a concurrent
/// [`EventStore::all`] sees the log either before or after an append.
pub struct EventStore {
    category: EventCategory,
    records: ArcSwap<Vec<EventRecord>>,
    seen: DashSet<String>,
}

impl EventStore {
    /// Create an empty store.
    pub fn new(category: EventCategory) -> Self {
        Self {
            category,
            records: ArcSwap::from_pointee(Vec::new()),
            seen: DashSet::new(),
        }
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Append a record.
    ///
    /// Returns `Ok(false)` when a record with the same transaction hash is
    /// already stored.
    pub fn append(&self, record: EventRecord) -> Result<bool, StoreError> {
        if record.category() != self.category {
            return Err(StoreError::CategoryMismatch {
                expected: self.category,
                actual: record.category(),
                tx_hash: record.transaction_hash().to_string(),
            });
        }

        if self.seen.contains(record.transaction_hash()) {
            return Ok(false);
        }

        let current = self.records.load_full();
        if let Some(max_block) = current.last().map(EventRecord::block_number) {
            if record.block_number() < max_block {
                return Err(StoreError::OrderingViolation {
                    category: self.category,
                    tx_hash: record.transaction_hash().to_string(),
                    block_number: record.block_number(),
                    max_block,
                });
            }
        }

        let tx_hash = record.transaction_hash().to_string();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(record);
        self.records.store(Arc::new(next));
        self.seen.insert(tx_hash);

        Ok(true)
    }

    /// Snapshot of every stored record in append order.
    pub fn all(&self) -> Arc<Vec<EventRecord>> {
        self.records.load_full()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.store(Arc::new(Vec::new()));
        self.seen.clear();
    }

    /// Highest stored block, if any.
    pub fn max_block(&self) -> Option<u64> {
        self.records.load().last().map(EventRecord::block_number)
    }

    /// Lower bound (inclusive) for the next ledger query.
    pub fn next_query_from(&self) -> u64 {
        self.max_block().map_or(0, |block| block + 1)
    }

    pub fn len(&self) -> usize {
        self.records.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("category", &self.category)
            .field("len", &self.len())
            .field("next_query_from", &self.next_query_from())
            .finish()
    }
}

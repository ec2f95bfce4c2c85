//! Typed contract event records.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three event streams tracked for a monitored contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// A position was liquidated.
    LiquidationCreated,
    /// A liquidation was disputed.
    LiquidationDisputed,
    /// A dispute was resolved by the oracle.
    DisputeSettled,
}

impl EventCategory {
    /// All categories, in refresh order.
    pub const ALL: [EventCategory; 3] = [
        EventCategory::LiquidationCreated,
        EventCategory::LiquidationDisputed,
        EventCategory::DisputeSettled,
    ];

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::LiquidationCreated => "liquidation_created",
            EventCategory::LiquidationDisputed => "liquidation_disputed",
            EventCategory::DisputeSettled => "dispute_settled",
        }
    }

    /// Name of the contract event on the ledger.
    pub fn event_name(&self) -> &'static str {
        match self {
            EventCategory::LiquidationCreated => "LiquidationCreated",
            EventCategory::LiquidationDisputed => "LiquidationDisputed",
            EventCategory::DisputeSettled => "DisputeSettled",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `LiquidationCreated` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    pub sponsor: Address,
    pub liquidator: Address,
    pub liquidation_id: U256,
    pub tokens_outstanding: U256,
    pub locked_collateral: U256,
    /// Absent on contracts that do not emit it.
    pub liquidated_collateral: Option<U256>,
}

/// A `LiquidationDisputed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeEvent {
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    pub sponsor: Address,
    pub liquidator: Address,
    pub disputer: Address,
    pub liquidation_id: U256,
    pub dispute_bond_amount: U256,
}

/// A `DisputeSettled` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeSettlementEvent {
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    pub caller: Address,
    pub sponsor: Address,
    pub liquidator: Address,
    pub disputer: Address,
    pub liquidation_id: U256,
    pub dispute_succeeded: bool,
}

/// One ingested event, tagged by category.
///
/// Identity is `(transaction_hash, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum EventRecord {
    LiquidationCreated(LiquidationEvent),
    LiquidationDisputed(DisputeEvent),
    DisputeSettled(DisputeSettlementEvent),
}

impl EventRecord {
    pub fn category(&self) -> EventCategory {
        match self {
            EventRecord::LiquidationCreated(_) => EventCategory::LiquidationCreated,
            EventRecord::LiquidationDisputed(_) => EventCategory::LiquidationDisputed,
            EventRecord::DisputeSettled(_) => EventCategory::DisputeSettled,
        }
    }

    pub fn transaction_hash(&self) -> &str {
        match self {
            EventRecord::LiquidationCreated(e) => &e.transaction_hash,
            EventRecord::LiquidationDisputed(e) => &e.transaction_hash,
            EventRecord::DisputeSettled(e) => &e.transaction_hash,
        }
    }

    pub fn block_number(&self) -> u64 {
        match self {
            EventRecord::LiquidationCreated(e) => e.block_number,
            EventRecord::LiquidationDisputed(e) => e.block_number,
            EventRecord::DisputeSettled(e) => e.block_number,
        }
    }

    pub fn block_timestamp(&self) -> Option<u64> {
        match self {
            EventRecord::LiquidationCreated(e) => e.block_timestamp,
            EventRecord::LiquidationDisputed(e) => e.block_timestamp,
            EventRecord::DisputeSettled(e) => e.block_timestamp,
        }
    }
}

//! Shared fakes for integration tests.

#![allow(dead_code)]

use alloy::primitives::Address;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use contract_monitor::events::EventCategory;
use contract_monitor::ingestion::{Clock, LedgerError, LedgerSource, RawLogEntry};
use contract_monitor::monitor::{AlertError, AlertMessage, AlertSink};
use contract_monitor::observability::{Observation, ObservabilitySink};

pub const SPONSOR: Address = Address::repeat_byte(0x11);
pub const LIQUIDATOR: Address = Address::repeat_byte(0x22);
pub const DISPUTER: Address = Address::repeat_byte(0x33);
pub const CALLER: Address = Address::repeat_byte(0x44);

/// A 32-byte transaction hash derived from `n`.
pub fn tx(n: u64) -> String {
    format!("0x{:064x}", n)
}

fn entry(tx_hash: &str, block: u64, fields: &[(&str, String)]) -> RawLogEntry {
    RawLogEntry {
        transaction_hash: Some(tx_hash.to_string()),
        block_number: Some(block),
        log_index: Some(0),
        block_timestamp: Some(1_600_000_000 + block),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

pub fn liquidation_entry(tx_hash: &str, block: u64, liquidation_id: u64, collateral: u64, tokens: u64) -> RawLogEntry {
    entry(
        tx_hash,
        block,
        &[
            ("sponsor", SPONSOR.to_string()),
            ("liquidator", LIQUIDATOR.to_string()),
            ("liquidationId", liquidation_id.to_string()),
            ("tokensOutstanding", tokens.to_string()),
            ("lockedCollateral", collateral.to_string()),
            ("liquidatedCollateral", collateral.to_string()),
        ],
    )
}

pub fn dispute_entry(tx_hash: &str, block: u64, liquidation_id: u64, bond: u64) -> RawLogEntry {
    entry(
        tx_hash,
        block,
        &[
            ("sponsor", SPONSOR.to_string()),
            ("liquidator", LIQUIDATOR.to_string()),
            ("disputer", DISPUTER.to_string()),
            ("liquidationId", liquidation_id.to_string()),
            ("disputeBondAmount", bond.to_string()),
        ],
    )
}

pub fn settlement_entry(tx_hash: &str, block: u64, liquidation_id: u64, succeeded: bool) -> RawLogEntry {
    entry(
        tx_hash,
        block,
        &[
            ("caller", CALLER.to_string()),
            ("sponsor", SPONSOR.to_string()),
            ("liquidator", LIQUIDATOR.to_string()),
            ("disputer", DISPUTER.to_string()),
            ("liquidationId", liquidation_id.to_string()),
            ("DisputeSucceeded", succeeded.to_string()),
        ],
    )
}

/// A query that blocks until released.
#[derive(Clone)]
struct Parked {
    category: EventCategory,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[derive(Default)]
struct LedgerState {
    chain: HashMap<EventCategory, Vec<RawLogEntry>>,
    failing: HashSet<EventCategory>,
    ignore_from_block: bool,
    parked: Option<Parked>,
    calls: Vec<(EventCategory, u64)>,
}

/// In-memory ledger. Returns every pushed entry at or after `from_block`.
#[derive(Clone, Default)]
pub struct FakeLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, category: EventCategory, entry: RawLogEntry) {
        self.state.lock().unwrap().chain.entry(category).or_default().push(entry);
    }

    /// Make every query for `category` fail until cleared.
    pub fn set_failing(&self, category: EventCategory, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(category);
        } else {
            state.failing.remove(&category);
        }
    }

    /// Return the whole history regardless of the requested block.
    pub fn set_ignore_from_block(&self, ignore: bool) {
        self.state.lock().unwrap().ignore_from_block = ignore;
    }

    /// Make queries for `category` hang after computing their result.
    ///
    /// Returns a notifier fired each time such a query starts waiting.
    pub fn park(&self, category: EventCategory) -> Arc<Notify> {
        let entered = Arc::new(Notify::new());
        self.state.lock().unwrap().parked = Some(Parked {
            category,
            entered: Arc::clone(&entered),
            release: Arc::new(Notify::new()),
        });
        entered
    }

    /// Every `(category, from_block)` queried so far.
    pub fn calls(&self) -> Vec<(EventCategory, u64)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, category: EventCategory) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, from)| from)
            .collect()
    }
}

impl LedgerSource for FakeLedger {
    async fn get_events(
        &self,
        _contract: Address,
        category: EventCategory,
        from_block: u64,
    ) -> Result<Vec<RawLogEntry>, LedgerError> {
        let (result, parked) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((category, from_block));

            let ignore = state.ignore_from_block;
            let result = if state.failing.contains(&category) {
                Err(LedgerError::Unavailable(format!("{} query refused", category)))
            } else {
                Ok(state
                    .chain
                    .get(&category)
                    .map(|entries| {
                        entries
                            .iter()
                            .filter(|e| ignore || e.block_number.unwrap_or(0) >= from_block)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default())
            };
            let parked = state.parked.clone().filter(|p| p.category == category);
            (result, parked)
        };

        if let Some(parked) = parked {
            parked.entered.notify_one();
            parked.release.notified().await;
        }
        result
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(start)) }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Keeps every observation for later assertions.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    observations: Arc<Mutex<Vec<Observation>>>,
}

impl RecordingObserver {
    pub fn observations(&self) -> Vec<Observation> {
        self.observations.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Observation) -> bool) -> usize {
        self.observations.lock().unwrap().iter().filter(|o| predicate(o)).count()
    }
}

impl ObservabilitySink for RecordingObserver {
    fn record(&self, observation: Observation) {
        self.observations.lock().unwrap().push(observation);
    }
}

/// Alert sink that records messages and rejects those mentioning a given text.
#[derive(Clone, Default)]
pub struct RecordingAlertSink {
    messages: Arc<Mutex<Vec<AlertMessage>>>,
    reject: Arc<Mutex<Option<String>>>,
}

impl RecordingAlertSink {
    pub fn messages(&self) -> Vec<AlertMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Reject every message whose body contains `needle`; `None` accepts all.
    pub fn reject_containing(&self, needle: Option<&str>) {
        *self.reject.lock().unwrap() = needle.map(str::to_string);
    }
}

impl AlertSink for RecordingAlertSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
        let rejected = self
            .reject
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|needle| message.mrkdwn.contains(needle));
        if rejected {
            return Err(AlertError::Unavailable("webhook down".to_string()));
        }

        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

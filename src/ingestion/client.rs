//! Incremental, rate-limited ingestion client.
//!
//! # Responsibilities
//! - Own one [`EventStore`] per category for a single contract
//! - Query only blocks past each store's watermark
//! - Bound the ledger query rate with an update threshold
//! - Isolate failures per category so one stream never starves the others

use alloy::primitives::Address;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::events::{EventCategory, EventRecord, EventSchema, EventStore, StoreError};
use crate::ingestion::ledger::{LedgerError, LedgerSource};
use crate::observability::sink::{Observation, ObservabilitySink};

/// Default minimum number of seconds between two ledger refreshes.
pub const DEFAULT_UPDATE_THRESHOLD_SECS: u64 = 60;

/// Wall-clock source, in seconds since the epoch.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// System time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Errors surfaced by ingestion operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A category's query failed; nothing was appended for it.
    #[error("ledger query for {category} events failed: {source}")]
    LedgerQuery {
        category: EventCategory,
        #[source]
        source: LedgerError,
    },

    /// A fetched record was rejected by the store, e.g. a block regression.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// One or more categories failed during a refresh.
    #[error("refresh incomplete: {} categories failed", .report.failures.len())]
    Incomplete { report: RefreshReport },
}

impl IngestError {
    /// Whether a later refresh may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            IngestError::LedgerQuery { source, .. } => source.is_transient(),
            IngestError::Store(_) => false,
            IngestError::Incomplete { report } => report.failures.iter().all(IngestError::is_transient),
        }
    }
}

/// Per-category result of a refresh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryReport {
    /// Records appended to the store.
    pub appended: usize,
    /// Records already present (same transaction hash).
    pub duplicates: usize,
    /// Records skipped because they failed normalization.
    pub malformed: usize,
}

/// Outcome of one pass over every category.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub categories: BTreeMap<EventCategory, CategoryReport>,
    pub failures: Vec<IngestError>,
}

impl RefreshReport {
    pub fn total_appended(&self) -> usize {
        self.categories.values().map(|c| c.appended).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a successful [`IngestionClient::update`].
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The threshold has not elapsed; the ledger was not queried.
    Skipped { remaining_secs: u64 },
    /// Every category was refreshed.
    Updated(RefreshReport),
}

/// One store per category.
#[derive(Debug)]
struct CategoryStores {
    liquidation_created: EventStore,
    liquidation_disputed: EventStore,
    dispute_settled: EventStore,
}

impl CategoryStores {
    fn new() -> Self {
        Self {
            liquidation_created: EventStore::new(EventCategory::LiquidationCreated),
            liquidation_disputed: EventStore::new(EventCategory::LiquidationDisputed),
            dispute_settled: EventStore::new(EventCategory::DisputeSettled),
        }
    }

    fn get(&self, category: EventCategory) -> &EventStore {
        match category {
            EventCategory::LiquidationCreated => &self.liquidation_created,
            EventCategory::LiquidationDisputed => &self.liquidation_disputed,
            EventCategory::DisputeSettled => &self.dispute_settled,
        }
    }
}

#[derive(Debug, Default)]
struct WatermarkState {
    last_update_timestamp: Option<u64>,
}

/// Event client for a single monitored contract.
pub struct IngestionClient<L> {
    ledger: L,
    contract: Address,
    stores: CategoryStores,
    update_threshold: u64,
    start_block: u64,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ObservabilitySink>,
    state: Mutex<WatermarkState>,
}

impl<L: LedgerSource> IngestionClient<L> {
    /// Create a client with the default threshold and the system clock.
    pub fn new(ledger: L, contract: Address, sink: Arc<dyn ObservabilitySink>) -> Self {
        Self {
            ledger,
            contract,
            stores: CategoryStores::new(),
            update_threshold: DEFAULT_UPDATE_THRESHOLD_SECS,
            start_block: 0,
            clock: Arc::new(SystemClock),
            sink,
            state: Mutex::new(WatermarkState::default()),
        }
    }

    /// Minimum seconds between two refreshes through [`Self::update`].
    pub fn with_update_threshold(mut self, secs: u64) -> Self {
        self.update_threshold = secs;
        self
    }

    /// Lowest block ever queried, for contracts deployed after genesis.
    pub fn with_start_block(mut self, block: u64) -> Self {
        self.start_block = block;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn update_threshold(&self) -> u64 {
        self.update_threshold
    }

    /// Timestamp of the last refresh, if any.
    pub async fn last_update_timestamp(&self) -> Option<u64> {
        self.state.lock().await.last_update_timestamp
    }

    /// Refresh unless the last refresh happened less than the threshold ago.
    pub async fn update(&self) -> Result<UpdateOutcome, IngestError> {
        let mut state = self.state.lock().await;
        let now = self.clock.now_secs();

        if let Some(last) = state.last_update_timestamp {
            let next_allowed = last.saturating_add(self.update_threshold);
            if now < next_allowed {
                let remaining_secs = next_allowed - now;
                self.sink.record(Observation::UpdateSkipped {
                    contract: self.contract,
                    current_time: now,
                    last_update_timestamp: last,
                    remaining_secs,
                });
                return Ok(UpdateOutcome::Skipped { remaining_secs });
            }
        }

        let report = self.refresh().await;
        state.last_update_timestamp = Some(now);
        self.sink.record(Observation::Updated {
            contract: self.contract,
            timestamp: now,
            forced: false,
            appended: report.total_appended(),
        });

        finish(report).map(UpdateOutcome::Updated)
    }

    /// Refresh regardless of the threshold.
    pub async fn force_update(&self) -> Result<RefreshReport, IngestError> {
        let mut state = self.state.lock().await;
        let now = self.clock.now_secs();

        let report = self.refresh().await;
        state.last_update_timestamp = Some(now);
        self.sink.record(Observation::Updated {
            contract: self.contract,
            timestamp: now,
            forced: true,
            appended: report.total_appended(),
        });

        finish(report)
    }

    /// Drop every ingested event. The next refresh re-reads from the start block.
    pub async fn clear_state(&self) {
        let _state = self.state.lock().await;
        for category in EventCategory::ALL {
            self.stores.get(category).clear();
        }
        self.sink.record(Observation::Cleared { contract: self.contract });
    }

    /// Snapshot of every event ingested for a category.
    pub fn get_events(&self, category: EventCategory) -> Arc<Vec<EventRecord>> {
        self.store(category).all()
    }

    pub fn store(&self, category: EventCategory) -> &EventStore {
        self.stores.get(category)
    }

    /// Inclusive lower bound of the next query for a category.
    pub fn next_query_from(&self, category: EventCategory) -> u64 {
        self.store(category).next_query_from().max(self.start_block)
    }

    /// One poll-loop iteration: [`Self::update`], with failures reported to
    /// the observability sink instead of returned.
    pub async fn poll_once(&self) -> Option<UpdateOutcome> {
        match self.update().await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                self.sink.record(Observation::PollingError {
                    contract: self.contract,
                    error: err.to_string(),
                });
                None
            }
        }
    }

    async fn refresh(&self) -> RefreshReport {
        let mut report = RefreshReport::default();

        for category in EventCategory::ALL {
            match self.refresh_category(category).await {
                Ok(summary) => {
                    report.categories.insert(category, summary);
                }
                Err(err) => {
                    self.sink.record(Observation::CategoryFailed {
                        contract: self.contract,
                        category,
                        error: err.to_string(),
                        transient: err.is_transient(),
                    });
                    report.failures.push(err);
                }
            }
        }

        report
    }

    async fn refresh_category(&self, category: EventCategory) -> Result<CategoryReport, IngestError> {
        let store = self.store(category);
        let from_block = self.next_query_from(category);

        let entries = self
            .ledger
            .get_events(self.contract, category, from_block)
            .await
            .map_err(|source| IngestError::LedgerQuery { category, source })?;

        let schema = EventSchema::for_category(category);
        let mut summary = CategoryReport::default();

        for entry in &entries {
            let record = match schema.normalize(entry) {
                Ok(record) => record,
                Err(err) => {
                    summary.malformed += 1;
                    self.sink.record(Observation::MalformedEvent {
                        category,
                        tx_hash: err.transaction_hash().map(str::to_string),
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            if store.append(record)? {
                summary.appended += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        self.sink.record(Observation::CategoryRefreshed {
            category,
            from_block,
            fetched: entries.len(),
            appended: summary.appended,
            next_query_from: store.next_query_from(),
        });

        Ok(summary)
    }
}

fn finish(report: RefreshReport) -> Result<RefreshReport, IngestError> {
    if report.is_complete() {
        Ok(report)
    } else {
        Err(IngestError::Incomplete { report })
    }
}

impl<L> std::fmt::Debug for IngestionClient<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionClient")
            .field("contract", &self.contract)
            .field("update_threshold", &self.update_threshold)
            .field("start_block", &self.start_block)
            .field("stores", &self.stores)
            .finish()
    }
}

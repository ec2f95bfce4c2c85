//! Contract event alerts.
//!
//! # Responsibilities
//! - Read event snapshots from an [`EventFeed`]
//! - Compute collateralization ratios with a caller-supplied price resolver
//! - Dispatch one alert per new record, remembering what was already sent

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::schema::{AlertRulesConfig, DedupeMode};
use crate::events::{
    DisputeEvent, DisputeSettlementEvent, EventCategory, EventRecord, EventStore, LiquidationEvent,
};
use crate::ingestion::client::{Clock, IngestionClient, SystemClock};
use crate::ingestion::ledger::LedgerSource;
use crate::monitor::format::{
    address_link, collateralization_ratio, format_amount, format_ratio, tx_link,
};
use crate::monitor::sink::{AlertError, AlertMessage, AlertSink, Severity};
use crate::observability::sink::{Observation, ObservabilitySink};

const SOURCE: &str = "ContractMonitor";

/// Price of one synthetic token in collateral units at a ledger timestamp.
type PriceFn<'a> = dyn Fn(u64) -> Decimal + Send + Sync + 'a;

/// Read access to ingested events.
pub trait EventFeed: Send + Sync {
    fn events(&self, category: EventCategory) -> Arc<Vec<EventRecord>>;
}

impl<L: LedgerSource> EventFeed for IngestionClient<L> {
    fn events(&self, category: EventCategory) -> Arc<Vec<EventRecord>> {
        self.get_events(category)
    }
}

/// A single store feeds only its own category.
impl EventFeed for EventStore {
    fn events(&self, category: EventCategory) -> Arc<Vec<EventRecord>> {
        if category == self.category() {
            self.all()
        } else {
            Arc::new(Vec::new())
        }
    }
}

/// Errors surfaced by monitor checks.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The sink rejected an alert; it will be retried on the next check.
    #[error("failed to dispatch {category} alert for {tx_hash}: {source}")]
    Dispatch {
        category: EventCategory,
        tx_hash: String,
        #[source]
        source: AlertError,
    },

    #[error("invalid monitored address '{0}'")]
    InvalidAddress(String),
}

/// Alert wording and deduplication settings.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub monitored_liquidators: HashSet<Address>,
    pub monitored_disputers: HashSet<Address>,
    pub dedupe: DedupeMode,
    pub explorer_url: String,
    pub collateral_symbol: String,
    pub synthetic_symbol: String,
    pub amount_decimals: u8,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        let rules = AlertRulesConfig::default();
        Self {
            monitored_liquidators: HashSet::new(),
            monitored_disputers: HashSet::new(),
            dedupe: rules.dedupe,
            explorer_url: rules.explorer_url,
            collateral_symbol: rules.collateral_symbol,
            synthetic_symbol: rules.synthetic_symbol,
            amount_decimals: rules.amount_decimals,
        }
    }
}

impl MonitorSettings {
    /// Build settings from configuration. Addresses match in any hex case.
    pub fn from_config(rules: &AlertRulesConfig) -> Result<Self, MonitorError> {
        let parse = |addresses: &[String]| {
            addresses
                .iter()
                .map(|a| Address::from_str(a.trim()).map_err(|_| MonitorError::InvalidAddress(a.clone())))
                .collect::<Result<HashSet<_>, _>>()
        };

        Ok(Self {
            monitored_liquidators: parse(&rules.monitored_liquidators)?,
            monitored_disputers: parse(&rules.monitored_disputers)?,
            dedupe: rules.dedupe,
            explorer_url: rules.explorer_url.clone(),
            collateral_symbol: rules.collateral_symbol.clone(),
            synthetic_symbol: rules.synthetic_symbol.clone(),
            amount_decimals: rules.amount_decimals,
        })
    }
}

/// Transaction hashes already alerted on, per category.
#[derive(Debug, Default)]
struct AlertCursors {
    liquidations: HashSet<String>,
    disputes: HashSet<String>,
    settlements: HashSet<String>,
}

impl AlertCursors {
    fn get(&self, category: EventCategory) -> &HashSet<String> {
        match category {
            EventCategory::LiquidationCreated => &self.liquidations,
            EventCategory::LiquidationDisputed => &self.disputes,
            EventCategory::DisputeSettled => &self.settlements,
        }
    }

    fn get_mut(&mut self, category: EventCategory) -> &mut HashSet<String> {
        match category {
            EventCategory::LiquidationCreated => &mut self.liquidations,
            EventCategory::LiquidationDisputed => &mut self.disputes,
            EventCategory::DisputeSettled => &mut self.settlements,
        }
    }
}

/// Turns ingested contract events into alerts.
pub struct ContractMonitor<F, S> {
    feed: Arc<F>,
    sink: S,
    observer: Arc<dyn ObservabilitySink>,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    cursors: AlertCursors,
}

impl<F: EventFeed, S: AlertSink> ContractMonitor<F, S> {
    pub fn new(feed: Arc<F>, sink: S, observer: Arc<dyn ObservabilitySink>, settings: MonitorSettings) -> Self {
        Self {
            feed,
            sink,
            observer,
            clock: Arc::new(SystemClock),
            settings,
            cursors: AlertCursors::default(),
        }
    }

    /// Clock used when a record carries no block timestamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Number of records of a category already alerted on.
    pub fn alerted_count(&self, category: EventCategory) -> usize {
        self.cursors.get(category).len()
    }

    /// Forget every alerted record; the next checks re-alert the whole feed.
    pub fn reset_cursors(&mut self) {
        self.cursors = AlertCursors::default();
    }

    /// Alert on liquidations not seen before. Returns the number dispatched.
    pub async fn check_for_new_liquidations<P>(&mut self, price: P) -> Result<usize, MonitorError>
    where
        P: Fn(u64) -> Decimal + Send + Sync,
    {
        self.dispatch_pending(EventCategory::LiquidationCreated, &price).await
    }

    /// Alert on disputes not seen before. Returns the number dispatched.
    pub async fn check_for_new_dispute_events<P>(&mut self, price: P) -> Result<usize, MonitorError>
    where
        P: Fn(u64) -> Decimal + Send + Sync,
    {
        self.dispatch_pending(EventCategory::LiquidationDisputed, &price).await
    }

    /// Alert on dispute settlements not seen before. Returns the number dispatched.
    pub async fn check_for_new_dispute_settlement_events<P>(&mut self, price: P) -> Result<usize, MonitorError>
    where
        P: Fn(u64) -> Decimal + Send + Sync,
    {
        self.dispatch_pending(EventCategory::DisputeSettled, &price).await
    }

    async fn dispatch_pending(
        &mut self,
        category: EventCategory,
        price: &PriceFn<'_>,
    ) -> Result<usize, MonitorError> {
        let snapshot = self.feed.events(category);
        let liquidations = match category {
            EventCategory::LiquidationCreated => Arc::clone(&snapshot),
            _ => self.feed.events(EventCategory::LiquidationCreated),
        };

        let dedupe = self.settings.dedupe == DedupeMode::On;
        let alerted = self.cursors.get(category);
        let pending: Vec<(String, AlertMessage)> = snapshot
            .iter()
            .filter(|record| !dedupe || !alerted.contains(record.transaction_hash()))
            .map(|record| {
                (
                    record.transaction_hash().to_string(),
                    self.render(record, &liquidations, price),
                )
            })
            .collect();

        let mut dispatched = 0;
        for (tx_hash, message) in pending {
            if let Err(source) = self.sink.send(&message).await {
                self.observer.record(Observation::AlertFailed {
                    category,
                    tx_hash: tx_hash.clone(),
                    error: source.to_string(),
                });
                return Err(MonitorError::Dispatch { category, tx_hash, source });
            }

            self.observer.record(Observation::AlertSent {
                category,
                tx_hash: tx_hash.clone(),
            });
            if dedupe {
                self.cursors.get_mut(category).insert(tx_hash);
            }
            dispatched += 1;
        }

        Ok(dispatched)
    }

    fn render(&self, record: &EventRecord, liquidations: &[EventRecord], price: &PriceFn<'_>) -> AlertMessage {
        match record {
            EventRecord::LiquidationCreated(event) => self.render_liquidation(event, price),
            EventRecord::LiquidationDisputed(event) => {
                let ratio = self.ratio_at_liquidation(liquidations, event.sponsor, event.liquidation_id, price);
                self.render_dispute(event, ratio)
            }
            EventRecord::DisputeSettled(event) => {
                let ratio = self.ratio_at_liquidation(liquidations, event.sponsor, event.liquidation_id, price);
                self.render_settlement(event, ratio)
            }
        }
    }

    fn event_time(&self, block_timestamp: Option<u64>) -> u64 {
        block_timestamp.unwrap_or_else(|| self.clock.now_secs())
    }

    fn liquidation_ratio(&self, event: &LiquidationEvent, price: &PriceFn<'_>) -> Option<Decimal> {
        let price = price(self.event_time(event.block_timestamp));
        collateralization_ratio(event.locked_collateral, event.tokens_outstanding, price)
    }

    /// Ratio of the liquidation a dispute refers to, when it has been ingested.
    fn ratio_at_liquidation(
        &self,
        liquidations: &[EventRecord],
        sponsor: Address,
        liquidation_id: U256,
        price: &PriceFn<'_>,
    ) -> Option<Decimal> {
        liquidations.iter().find_map(|record| match record {
            EventRecord::LiquidationCreated(l) if l.sponsor == sponsor && l.liquidation_id == liquidation_id => {
                self.liquidation_ratio(l, price)
            }
            _ => None,
        })
    }

    fn link(&self, address: &Address) -> String {
        address_link(&self.settings.explorer_url, address)
    }

    fn liquidator_tag(&self, address: &Address) -> &'static str {
        if self.settings.monitored_liquidators.contains(address) {
            " (monitored liquidator)"
        } else {
            ""
        }
    }

    fn disputer_tag(&self, address: &Address) -> &'static str {
        if self.settings.monitored_disputers.contains(address) {
            " (monitored disputer)"
        } else {
            ""
        }
    }

    fn render_liquidation(&self, event: &LiquidationEvent, price: &PriceFn<'_>) -> AlertMessage {
        let ratio = self.liquidation_ratio(event, price);
        let s = &self.settings;

        let mrkdwn = format!(
            "{}{} initiated liquidation for {} {} of sponsor {} collateral backing {} {} tokens. \
             Sponsor collateralization was {}. tx: {}",
            self.link(&event.liquidator),
            self.liquidator_tag(&event.liquidator),
            format_amount(event.locked_collateral, s.amount_decimals),
            s.collateral_symbol,
            self.link(&event.sponsor),
            format_amount(event.tokens_outstanding, s.amount_decimals),
            s.synthetic_symbol,
            format_ratio(ratio),
            tx_link(&s.explorer_url, &event.transaction_hash),
        );

        AlertMessage {
            severity: Severity::Info,
            source: SOURCE.to_string(),
            title: "Liquidation Alert 🧙‍♂️!".to_string(),
            mrkdwn,
        }
    }

    fn render_dispute(&self, event: &DisputeEvent, ratio: Option<Decimal>) -> AlertMessage {
        let s = &self.settings;
        let collateralization = ratio
            .map(|r| format!(" Sponsor collateralization at liquidation was {}.", format_ratio(Some(r))))
            .unwrap_or_default();

        let mrkdwn = format!(
            "{}{} initiated dispute against liquidator {}{} for sponsor {} (liquidation {}) \
             with a dispute bond of {} {}.{} tx: {}",
            self.link(&event.disputer),
            self.disputer_tag(&event.disputer),
            self.link(&event.liquidator),
            self.liquidator_tag(&event.liquidator),
            self.link(&event.sponsor),
            event.liquidation_id,
            format_amount(event.dispute_bond_amount, s.amount_decimals),
            s.collateral_symbol,
            collateralization,
            tx_link(&s.explorer_url, &event.transaction_hash),
        );

        AlertMessage {
            severity: Severity::Warning,
            source: SOURCE.to_string(),
            title: "Dispute Alert 👻!".to_string(),
            mrkdwn,
        }
    }

    fn render_settlement(&self, event: &DisputeSettlementEvent, ratio: Option<Decimal>) -> AlertMessage {
        let s = &self.settings;
        // A successful dispute means the liquidation was invalid.
        let (outcome, severity) = if event.dispute_succeeded {
            ("succeeded", Severity::Warning)
        } else {
            ("failed", Severity::Info)
        };
        let collateralization = ratio
            .map(|r| format!(" Sponsor collateralization at liquidation was {}.", format_ratio(Some(r))))
            .unwrap_or_default();

        let mrkdwn = format!(
            "Dispute between liquidator {}{} and disputer {}{} for sponsor {} (liquidation {}) \
             has resolved as {}.{} tx: {}",
            self.link(&event.liquidator),
            self.liquidator_tag(&event.liquidator),
            self.link(&event.disputer),
            self.disputer_tag(&event.disputer),
            self.link(&event.sponsor),
            event.liquidation_id,
            outcome,
            collateralization,
            tx_link(&s.explorer_url, &event.transaction_hash),
        );

        AlertMessage {
            severity,
            source: SOURCE.to_string(),
            title: "Dispute Settlement Alert 👮‍♂️!".to_string(),
            mrkdwn,
        }
    }
}

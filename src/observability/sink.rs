//! Injected observability sink.

use alloy::primitives::Address;

use crate::events::EventCategory;
use crate::observability::metrics;

/// Something worth reporting that happened inside the ingestion client or
/// the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// `update()` was called before the threshold elapsed.
    UpdateSkipped {
        contract: Address,
        current_time: u64,
        last_update_timestamp: u64,
        remaining_secs: u64,
    },
    /// A refresh finished (possibly with failed categories).
    Updated {
        contract: Address,
        timestamp: u64,
        forced: bool,
        appended: usize,
    },
    /// Every store was cleared.
    Cleared { contract: Address },
    /// One category was fetched and committed.
    CategoryRefreshed {
        category: EventCategory,
        from_block: u64,
        fetched: usize,
        appended: usize,
        next_query_from: u64,
    },
    /// One category could not be refreshed this cycle.
    CategoryFailed {
        contract: Address,
        category: EventCategory,
        error: String,
        /// The failure may clear up on a later refresh (RPC outage, timeout).
        transient: bool,
    },
    /// A single record failed normalization and was skipped.
    MalformedEvent {
        category: EventCategory,
        tx_hash: Option<String>,
        error: String,
    },
    /// The poll loop swallowed an update failure.
    PollingError { contract: Address, error: String },
    /// An alert was accepted by the sink.
    AlertSent { category: EventCategory, tx_hash: String },
    /// The alert sink rejected a message.
    AlertFailed {
        category: EventCategory,
        tx_hash: String,
        error: String,
    },
}

/// Receiver of [`Observation`]s.
pub trait ObservabilitySink: Send + Sync {
    fn record(&self, observation: Observation);
}

/// Default sink: structured tracing events plus Prometheus metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, observation: Observation) {
        match observation {
            Observation::UpdateSkipped {
                contract,
                current_time,
                last_update_timestamp,
                remaining_secs,
            } => {
                metrics::record_update_skipped();
                tracing::debug!(
                    %contract,
                    current_time,
                    last_update_timestamp,
                    time_remaining_until_update = remaining_secs,
                    "Contract event update skipped"
                );
            }
            Observation::Updated { contract, timestamp, forced, appended } => {
                tracing::debug!(
                    %contract,
                    last_update_timestamp = timestamp,
                    forced,
                    appended,
                    "Contract events updated"
                );
            }
            Observation::Cleared { contract } => {
                tracing::info!(%contract, "Contract event state cleared");
            }
            Observation::CategoryRefreshed {
                category,
                from_block,
                fetched,
                appended,
                next_query_from,
            } => {
                metrics::record_events_ingested(category, appended);
                metrics::record_next_block(category, next_query_from);
                tracing::trace!(
                    %category,
                    from_block,
                    fetched,
                    appended,
                    next_query_from,
                    "Category refreshed"
                );
            }
            Observation::CategoryFailed { contract, category, error, transient } => {
                metrics::record_ledger_failure(category);
                if transient {
                    tracing::warn!(%contract, %category, %error, "Category refresh failed, retrying next cycle");
                } else {
                    tracing::error!(%contract, %category, %error, "Category refresh failed");
                }
            }
            Observation::MalformedEvent { category, tx_hash, error } => {
                metrics::record_malformed_event(category);
                tracing::warn!(
                    %category,
                    tx_hash = tx_hash.as_deref().unwrap_or("unknown"),
                    %error,
                    "Skipping malformed event"
                );
            }
            Observation::PollingError { contract, error } => {
                tracing::error!(%contract, %error, "Client polling error");
            }
            Observation::AlertSent { category, tx_hash } => {
                metrics::record_alert_sent(category);
                tracing::info!(%category, %tx_hash, "Alert dispatched");
            }
            Observation::AlertFailed { category, tx_hash, error } => {
                metrics::record_alert_failure(category);
                tracing::error!(%category, %tx_hash, %error, "Alert dispatch failed");
            }
        }
    }
}

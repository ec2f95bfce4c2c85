//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_events_ingested_total` (counter): appended records by category
//! - `monitor_update_skipped_total` (counter): updates skipped by the threshold
//! - `monitor_ledger_failures_total` (counter): failed category queries
//! - `monitor_malformed_events_total` (counter): records rejected by normalization
//! - `monitor_store_next_block` (gauge): next query block by category
//! - `monitor_alerts_sent_total` / `monitor_alert_failures_total` (counters)

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::events::EventCategory;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_events_ingested(category: EventCategory, count: usize) {
    metrics::counter!("monitor_events_ingested_total", "category" => category.as_str())
        .increment(count as u64);
}

pub fn record_update_skipped() {
    metrics::counter!("monitor_update_skipped_total").increment(1);
}

pub fn record_ledger_failure(category: EventCategory) {
    metrics::counter!("monitor_ledger_failures_total", "category" => category.as_str()).increment(1);
}

pub fn record_malformed_event(category: EventCategory) {
    metrics::counter!("monitor_malformed_events_total", "category" => category.as_str()).increment(1);
}

pub fn record_next_block(category: EventCategory, block: u64) {
    metrics::gauge!("monitor_store_next_block", "category" => category.as_str()).set(block as f64);
}

pub fn record_alert_sent(category: EventCategory) {
    metrics::counter!("monitor_alerts_sent_total", "category" => category.as_str()).increment(1);
}

pub fn record_alert_failure(category: EventCategory) {
    metrics::counter!("monitor_alert_failures_total", "category" => category.as_str()).increment(1);
}

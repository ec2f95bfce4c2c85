//! Periodic monitor passes.

use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::monitor::contract_monitor::{ContractMonitor, EventFeed};
use crate::monitor::sink::AlertSink;

/// Run every category check once. Returns the number of alerts dispatched.
///
/// A failing category is logged and does not prevent the others from running.
pub async fn run_checks<F, S, P>(monitor: &mut ContractMonitor<F, S>, price: &P) -> usize
where
    F: EventFeed,
    S: AlertSink,
    P: Fn(u64) -> Decimal + Send + Sync,
{
    let mut dispatched = 0;

    match monitor.check_for_new_liquidations(price).await {
        Ok(n) => dispatched += n,
        Err(e) => tracing::error!(error = %e, "Liquidation check failed"),
    }
    match monitor.check_for_new_dispute_events(price).await {
        Ok(n) => dispatched += n,
        Err(e) => tracing::error!(error = %e, "Dispute check failed"),
    }
    match monitor.check_for_new_dispute_settlement_events(price).await {
        Ok(n) => dispatched += n,
        Err(e) => tracing::error!(error = %e, "Dispute settlement check failed"),
    }

    dispatched
}

/// Run [`run_checks`] every `interval` until shutdown is signalled.
pub async fn run_monitoring<F, S, P>(
    mut monitor: ContractMonitor<F, S>,
    price: P,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) where
    F: EventFeed,
    S: AlertSink,
    P: Fn(u64) -> Decimal + Send + Sync,
{
    tracing::info!(interval_secs = interval.as_secs(), "Contract monitor starting");

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let dispatched = run_checks(&mut monitor, &price).await;
                if dispatched > 0 {
                    tracing::debug!(dispatched, "Monitor pass complete");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Contract monitor received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

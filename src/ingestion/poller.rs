//! Background poll loop for an ingestion client.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::ingestion::client::IngestionClient;
use crate::ingestion::ledger::LedgerSource;

/// Run `update()` every `interval` until shutdown is signalled.
///
/// Update failures are reported through the client's observability sink and
/// never end the loop. Shutdown is observed while sleeping and while a ledger
/// query is in flight; appends are synchronous and are never interrupted.
pub async fn run_polling<L: LedgerSource>(
    client: Arc<IngestionClient<L>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(
        contract = %client.contract(),
        interval_secs = interval.as_secs(),
        update_threshold_secs = client.update_threshold(),
        "Event poller starting"
    );

    loop {
        tokio::select! {
            _ = client.poll_once() => {}
            _ = shutdown.recv() => break,
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.recv() => break,
        }
    }

    tracing::info!(contract = %client.contract(), "Event poller received shutdown signal, exiting loop");
}

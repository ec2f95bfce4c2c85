//! Contract event monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   get_logs    ┌──────────────────────────────┐
//!   │  JSON-RPC    │◀──────────────│ poller (update every N secs) │
//!   │  ledger      │──────────────▶│   IngestionClient            │
//!   └──────────────┘   raw logs    │   ├ liquidation store        │
//!                                  │   ├ dispute store            │
//!                                  │   └ settlement store         │
//!                                  └──────────────┬───────────────┘
//!                                                 │ snapshots
//!                                  ┌──────────────▼───────────────┐
//!                                  │ ContractMonitor (every M s)  │──▶ log / webhook
//!                                  └──────────────────────────────┘
//! ```

use alloy::primitives::Address;
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use contract_monitor::blockchain::BlockchainClient;
use contract_monitor::config::load_config;
use contract_monitor::ingestion::{run_polling, ContractLedger, IngestionClient};
use contract_monitor::lifecycle::{wait_for_signal, Shutdown};
use contract_monitor::monitor::{run_checks, run_monitoring, ConfiguredSink, ContractMonitor, MonitorSettings};
use contract_monitor::observability::logging::init_logging;
use contract_monitor::observability::metrics::init_metrics;
use contract_monitor::observability::{ObservabilitySink, TracingSink};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "contract-monitor")]
#[command(about = "Alerts on liquidations, disputes and dispute settlements of a contract", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "monitor.toml")]
    config: PathBuf,

    /// Refresh once, run one monitor pass, then exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_logging(&config.observability);
    tracing::info!(config = %cli.config.display(), "contract-monitor v0.1.0 starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let contract = Address::from_str(&config.contract.address)?;
    let static_price = Decimal::from_str(&config.monitor.price)?;
    let price = move |_timestamp: u64| static_price;

    let chain = BlockchainClient::new(config.blockchain.clone()).await?;
    let observer: Arc<dyn ObservabilitySink> = Arc::new(TracingSink);

    let client = Arc::new(
        IngestionClient::new(ContractLedger::new(chain), contract, Arc::clone(&observer))
            .with_update_threshold(config.contract.update_threshold_secs)
            .with_start_block(config.contract.from_block),
    );

    let settings = MonitorSettings::from_config(&config.monitor)?;
    let sink = ConfiguredSink::from_config(&config.alerts)?;
    let mut monitor = ContractMonitor::new(Arc::clone(&client), sink, observer, settings);

    tracing::info!(
        %contract,
        update_threshold_secs = config.contract.update_threshold_secs,
        polling_interval_secs = config.contract.polling_interval_secs,
        check_interval_secs = config.monitor.check_interval_secs,
        dedupe = ?config.monitor.dedupe,
        "Configuration loaded"
    );

    if cli.once {
        if let Err(e) = client.force_update().await {
            tracing::warn!(error = %e, "Refresh incomplete, alerting on what was ingested");
        }
        let dispatched = run_checks(&mut monitor, &price).await;
        tracing::info!(dispatched, "Single pass complete");
        return Ok(());
    }

    let mut shutdown = Shutdown::new();

    let polling_interval = Duration::from_secs(config.contract.polling_interval_secs);
    let poll_client = Arc::clone(&client);
    shutdown.spawn("poller", move |rx| run_polling(poll_client, polling_interval, rx));

    let check_interval = Duration::from_secs(config.monitor.check_interval_secs);
    shutdown.spawn("monitor", move |rx| run_monitoring(monitor, price, check_interval, rx));

    wait_for_signal().await;
    tracing::info!("Shutting down");

    let unclean = shutdown.shutdown(SHUTDOWN_GRACE).await;
    if unclean > 0 {
        tracing::warn!(unclean, "Some tasks did not stop cleanly");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

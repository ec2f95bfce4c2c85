//! Smart-contract event monitor.
//!
//! Incrementally ingests a single contract's liquidation, dispute and
//! dispute-settlement events from a JSON-RPC ledger and raises one alert per
//! new event.

pub mod blockchain;
pub mod config;
pub mod events;
pub mod ingestion;
pub mod lifecycle;
pub mod monitor;
pub mod observability;

pub use config::MonitorConfig;
pub use events::{EventCategory, EventRecord, EventStore};
pub use ingestion::IngestionClient;
pub use lifecycle::Shutdown;
pub use monitor::ContractMonitor;

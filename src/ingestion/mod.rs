//! Incremental event ingestion for one monitored contract.
//!
//! # Data Flow
//! ```text
//! poller.rs (interval loop, shutdown channel)
//!     → client.rs update()/force_update() (threshold, watermarks)
//!     → ledger.rs LedgerSource::get_events(category, from_block)
//!         (rpc.rs: alloy log filter + ABI decode)
//!     → events::schema normalize → events::store append
//! ```
//!
//! # Design Decisions
//! - Each category is fetched and committed independently
//! - The next query starts at the highest stored block + 1
//! - Only the refresh path mutates stores; it is serialized by a lock

pub mod client;
pub mod ledger;
pub mod poller;
pub mod rpc;

pub use client::{Clock, IngestError, IngestionClient, RefreshReport, SystemClock, UpdateOutcome};
pub use ledger::{LedgerError, LedgerSource, RawLogEntry};
pub use poller::run_polling;
pub use rpc::ContractLedger;

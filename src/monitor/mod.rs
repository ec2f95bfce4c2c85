//! Alerting layer.
//!
//! # Data Flow
//! ```text
//! EventFeed snapshot (per category)
//!     → contract_monitor.rs (skip already-alerted records, compute ratios)
//!     → format.rs (amounts, ratios, explorer links)
//!     → sink.rs AlertSink::send (log or webhook)
//! ```
//!
//! # Design Decisions
//! - Alert cursors advance per record, only after a successful send
//! - Price lookup is injected per call
//! - Monitored addresses change wording, never control flow

pub mod contract_monitor;
pub mod format;
pub mod runner;
pub mod sink;

pub use contract_monitor::{ContractMonitor, EventFeed, MonitorError, MonitorSettings};
pub use runner::{run_checks, run_monitoring};
pub use sink::{AlertError, AlertMessage, AlertSink, ConfiguredSink, LogSink, Severity, WebhookSink};

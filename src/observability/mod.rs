//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! IngestionClient / ContractMonitor
//!     → sink.rs (ObservabilitySink, injected at construction)
//!         TracingSink → tracing events + metrics.rs counters
//!
//! Binary startup:
//!     → logging.rs (tracing-subscriber init)
//!     → metrics.rs (Prometheus exporter)
//! ```
//!
//! # Design Decisions
//! - Library code never installs a global subscriber
//! - Components report typed observations, not log strings
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod sink;

pub use sink::{Observation, ObservabilitySink, TracingSink};

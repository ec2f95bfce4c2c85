//! Contract event model and per-category stores.
//!
//! # Data Flow
//! ```text
//! RawLogEntry (ledger)
//!     → schema.rs (declarative field mapping, validation)
//!     → types.rs (typed EventRecord per category)
//!     → store.rs (append-only, block-ordered EventStore)
//! ```
//!
//! # Invariants
//! - A store never holds two records with the same transaction hash
//! - Block numbers never decrease within a store
//! - Readers always observe whole records (copy-on-write snapshots)

pub mod schema;
pub mod store;
pub mod types;

pub use schema::{EventSchema, FieldKind, FieldSpec, NormalizeError};
pub use store::{EventStore, StoreError};
pub use types::{
    DisputeEvent, DisputeSettlementEvent, EventCategory, EventRecord, LiquidationEvent,
};

//! uplink-store: durable reading series for uplink.
//!
//! Backed by [redb](https://docs.rs/redb). Every reading lands in two
//! append-only series:
//!
//! - a per-device series, one table per device named
//!   `sensor-data-{device_id}`, created on first write;
//! - the global `all-sensor-data` series, whose entries point back at the
//!   device-series document through `docId` + `collection`.
//!
//! # Architecture
//!
//! ```text
//! DualWriter ──┐                  ┌── ReadingQuery::latest
//!              ▼                  ▼
//!        Arc<dyn SeriesStore>  (ReadingStore: redb)
//!                                 ▲
//!                                 └── ReadingQuery::list_devices ── roster::aggregate
//! ```
//!
//! Series keys are `(stored_at_micros, seq)`. `stored_at` is assigned by
//! the store inside the write transaction and never decreases, `seq` is
//! a store-wide counter, so a reverse table scan yields readings newest
//! first with no secondary index.
//!
//! `ReadingStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and is opened once at process start, then handed to each component.

pub mod dual_write;
pub mod error;
pub mod query;
pub mod roster;
pub mod series;
pub mod store;
pub mod tables;
pub mod types;

pub use dual_write::DualWriter;
pub use error::{StoreError, StoreResult};
pub use query::ReadingQuery;
pub use series::SeriesStore;
pub use store::ReadingStore;
pub use types::*;

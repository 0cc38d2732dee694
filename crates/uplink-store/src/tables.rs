//! redb table definitions for the reading store.
//!
//! Series tables use `(stored_at_micros, seq)` keys and JSON `&[u8]`
//! values. Per-device series tables are named at runtime, see
//! [`device_series`].

use redb::TableDefinition;

/// Composite series key: server timestamp in microseconds, then the
/// store-wide sequence number.
pub type SeriesKey = (u64, u64);

/// Global series spanning every device.
pub const GLOBAL_SERIES_NAME: &str = "all-sensor-data";

pub const GLOBAL_SERIES: TableDefinition<SeriesKey, &[u8]> =
    TableDefinition::new(GLOBAL_SERIES_NAME);

/// Store counters: last sequence number and last assigned timestamp.
pub const SERIES_META: TableDefinition<&str, u64> = TableDefinition::new("series-meta");

pub const META_SEQ: &str = "seq";
pub const META_CLOCK: &str = "clock_micros";

/// Liveness probe documents keyed by probe name.
pub const HEALTH_CHECK: TableDefinition<&str, &[u8]> = TableDefinition::new("health-check");

pub const HEALTH_CHECK_KEY: &str = "test";

/// Table definition for a per-device series (`sensor-data-{device_id}`).
pub fn device_series(collection: &str) -> TableDefinition<'_, SeriesKey, &'static [u8]> {
    TableDefinition::new(collection)
}

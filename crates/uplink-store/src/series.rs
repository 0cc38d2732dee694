//! The store seam used by the dual writer and the query façade.

use crate::error::StoreResult;
use crate::types::{GlobalEntry, HealthRecord, StoredReading};
use uplink_core::Reading;

/// Append-only series storage for readings.
///
/// Each append is atomic on its own. Only [`SeriesStore::append_both`]
/// spans the device and global series in one commit.
pub trait SeriesStore: Send + Sync {
    /// Append to the reading's device series, creating it if needed.
    fn append_device(&self, reading: &Reading) -> StoreResult<StoredReading>;

    /// Append the global counterpart of an already stored device reading.
    fn append_global(&self, stored: &StoredReading) -> StoreResult<GlobalEntry>;

    /// Append to both series in a single transaction.
    fn append_both(&self, reading: &Reading) -> StoreResult<(StoredReading, GlobalEntry)>;

    /// Up to `limit` readings for one device, newest `stored_at` first.
    /// An unknown device yields an empty list.
    fn latest(&self, device_id: &str, limit: usize) -> StoreResult<Vec<StoredReading>>;

    /// Every global entry, newest `stored_at` first.
    fn scan_global(&self) -> StoreResult<Vec<GlobalEntry>>;

    /// Write and read back a probe document.
    fn ping(&self) -> StoreResult<HealthRecord>;
}

//! Query façade: read-only views over the reading store.

use std::sync::Arc;

use tracing::debug;

use crate::error::StoreResult;
use crate::roster;
use crate::series::SeriesStore;
use crate::types::{DeviceRosterEntry, StoredReading};

/// Derived reads. Safe to retry and to run alongside ingestion; each call
/// sees whatever snapshot the store returns at call time.
#[derive(Clone)]
pub struct ReadingQuery {
    store: Arc<dyn SeriesStore>,
}

impl ReadingQuery {
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self { store }
    }

    /// Up to `limit` most recent readings for one device, newest first.
    pub fn latest(&self, device_id: &str, limit: usize) -> StoreResult<Vec<StoredReading>> {
        let readings = self.store.latest(device_id, limit)?;
        debug!(%device_id, limit, count = readings.len(), "latest readings");
        Ok(readings)
    }

    /// Every known device with its last-seen summary.
    pub fn list_devices(&self) -> StoreResult<Vec<DeviceRosterEntry>> {
        let entries = self.store.scan_global()?;
        let scanned = entries.len();
        let devices = roster::aggregate(entries);
        debug!(scanned, devices = devices.len(), "device roster rebuilt");
        Ok(devices)
    }
}

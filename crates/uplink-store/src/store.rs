//! ReadingStore: redb-backed series persistence for uplink.
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing). redb serializes write transactions, which is what makes each
//! append atomic and keeps the `(stored_at, seq)` counters monotonic under
//! concurrent ingestion.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, WriteTransaction};
use tracing::debug;
use ulid::Ulid;
use uplink_core::Reading;

use crate::error::{StoreError, StoreResult};
use crate::series::SeriesStore;
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe reading store backed by redb.
#[derive(Clone)]
pub struct ReadingStore {
    db: Arc<Database>,
}

impl ReadingStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "reading store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory reading store opened");
        Ok(store)
    }

    /// Create the fixed tables if they don't exist yet. Device series are
    /// created lazily on first append.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(GLOBAL_SERIES).map_err(map_err!(Table))?;
        txn.open_table(SERIES_META).map_err(map_err!(Table))?;
        txn.open_table(HEALTH_CHECK).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

// ── Write path ─────────────────────────────────────────────────────

/// Bump and return the store-wide sequence number.
fn next_seq(meta: &mut Table<'_, &'static str, u64>) -> StoreResult<u64> {
    let last = meta
        .get(META_SEQ)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let seq = last + 1;
    meta.insert(META_SEQ, seq).map_err(map_err!(Write))?;
    Ok(seq)
}

/// Assign a server timestamp that never goes backwards, even if the
/// wall clock does.
fn next_clock(meta: &mut Table<'_, &'static str, u64>) -> StoreResult<u64> {
    let last = meta
        .get(META_CLOCK)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let now = u64::try_from(Utc::now().timestamp_micros())
        .map_err(|_| StoreError::Clock("system clock is before the unix epoch".to_string()))?;
    let micros = now.max(last);
    meta.insert(META_CLOCK, micros).map_err(map_err!(Write))?;
    Ok(micros)
}

fn to_datetime(micros: u64) -> StoreResult<DateTime<Utc>> {
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .ok_or_else(|| StoreError::Clock(format!("timestamp out of range: {micros}")))
}

fn to_micros(at: DateTime<Utc>) -> StoreResult<u64> {
    u64::try_from(at.timestamp_micros())
        .map_err(|_| StoreError::Clock(format!("timestamp before the unix epoch: {at}")))
}

fn insert_device(txn: &WriteTransaction, reading: &Reading) -> StoreResult<StoredReading> {
    let key: SeriesKey = {
        let mut meta = txn.open_table(SERIES_META).map_err(map_err!(Table))?;
        let micros = next_clock(&mut meta)?;
        (micros, next_seq(&mut meta)?)
    };
    let stored = StoredReading {
        id: Ulid::new().to_string(),
        stored_at: to_datetime(key.0)?,
        reading: reading.clone(),
    };
    let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
    let collection = reading.collection_name();
    {
        let mut table = txn
            .open_table(device_series(&collection))
            .map_err(map_err!(Table))?;
        table.insert(key, value.as_slice()).map_err(map_err!(Write))?;
    }
    Ok(stored)
}

fn insert_global(txn: &WriteTransaction, stored: &StoredReading) -> StoreResult<GlobalEntry> {
    let seq = {
        let mut meta = txn.open_table(SERIES_META).map_err(map_err!(Table))?;
        next_seq(&mut meta)?
    };
    // Keyed by the device reading's timestamp so the global scan orders by
    // `stored_at` even when two-step writes interleave.
    let key: SeriesKey = (to_micros(stored.stored_at)?, seq);
    let entry = GlobalEntry::referencing(Ulid::new().to_string(), stored);
    let value = serde_json::to_vec(&entry).map_err(map_err!(Serialize))?;
    {
        let mut table = txn.open_table(GLOBAL_SERIES).map_err(map_err!(Table))?;
        table.insert(key, value.as_slice()).map_err(map_err!(Write))?;
    }
    Ok(entry)
}

impl SeriesStore for ReadingStore {
    fn append_device(&self, reading: &Reading) -> StoreResult<StoredReading> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let stored = insert_device(&txn, reading)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(device_id = %reading.device_id, doc_id = %stored.id, "device series append");
        Ok(stored)
    }

    fn append_global(&self, stored: &StoredReading) -> StoreResult<GlobalEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let entry = insert_global(&txn, stored)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(doc_id = %entry.doc_id, id = %entry.id, "global series append");
        Ok(entry)
    }

    fn append_both(&self, reading: &Reading) -> StoreResult<(StoredReading, GlobalEntry)> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let stored = insert_device(&txn, reading)?;
        let entry = insert_global(&txn, &stored)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            device_id = %reading.device_id,
            doc_id = %stored.id,
            "device and global series append"
        );
        Ok((stored, entry))
    }

    // ── Read path ──────────────────────────────────────────────────

    fn latest(&self, device_id: &str, limit: usize) -> StoreResult<Vec<StoredReading>> {
        let collection = uplink_core::device_collection(device_id);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = match txn.open_table(device_series(&collection)) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Table(e.to_string())),
        };
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))?.rev().take(limit) {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let stored: StoredReading =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(stored);
        }
        Ok(results)
    }

    fn scan_global(&self) -> StoreResult<Vec<GlobalEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(GLOBAL_SERIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))?.rev() {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let global: GlobalEntry =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(global);
        }
        Ok(results)
    }

    // ── Health ─────────────────────────────────────────────────────

    fn ping(&self) -> StoreResult<HealthRecord> {
        let record = HealthRecord {
            timestamp: Utc::now(),
            status: "healthy".to_string(),
        };
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HEALTH_CHECK).map_err(map_err!(Table))?;
            table
                .insert(HEALTH_CHECK_KEY, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;

        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HEALTH_CHECK).map_err(map_err!(Table))?;
        match table.get(HEALTH_CHECK_KEY).map_err(map_err!(Read))? {
            Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize)),
            None => Err(StoreError::Read("health probe document missing after commit".to_string())),
        }
    }
}

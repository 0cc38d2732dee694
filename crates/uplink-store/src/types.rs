//! Persisted and derived types for the reading store.
//!
//! Field names serialize in camelCase to match the JSON served by the
//! HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplink_core::{Reading, SensorData};

/// Generated document identifier (a ULID string).
pub type DocId = String;

// ── Device series ─────────────────────────────────────────────────

/// A reading as stored in its device series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredReading {
    pub id: DocId,
    /// Server-assigned write time; the only trustworthy ordering field.
    pub stored_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: Reading,
}

// ── Global series ─────────────────────────────────────────────────

/// A reading as stored in the global series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEntry {
    pub id: DocId,
    /// Id of the matching document in the device series.
    pub doc_id: DocId,
    /// Name of the device series holding `doc_id`.
    pub collection: String,
    pub stored_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: Reading,
}

impl GlobalEntry {
    /// Build the global counterpart of a device-series reading.
    pub fn referencing(id: DocId, stored: &StoredReading) -> Self {
        Self {
            id,
            doc_id: stored.id.clone(),
            collection: stored.reading.collection_name(),
            stored_at: stored.stored_at,
            reading: stored.reading.clone(),
        }
    }
}

// ── Results ───────────────────────────────────────────────────────

/// Outcome of a successful dual write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub device_doc_id: DocId,
    pub collection_name: String,
    pub stored_at: DateTime<Utc>,
}

/// One device in the roster, recomputed on every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRosterEntry {
    pub device_id: String,
    pub application_id: String,
    pub collection: String,
    pub last_seen: DateTime<Utc>,
    pub total_messages: u64,
    pub latest_sensor_data: SensorData,
}

/// Document written by the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthRecord {
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

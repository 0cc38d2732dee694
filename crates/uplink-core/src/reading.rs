//! Reading extraction: projects a validated envelope into a `Reading`.
//!
//! Radio metadata is copied through untyped. A field that is missing or
//! `null` upstream becomes `None` (serialized as `null`), never `0` or
//! `""`, so "unknown" stays distinguishable from "measured as zero".

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::{DECODED_PAYLOAD_POINTER, ValidatedUplink};

/// Application id recorded when the envelope does not carry one.
pub const UNKNOWN_APPLICATION: &str = "unknown-app";

/// Open-ended sensor payload: sensor name → dynamically typed value.
/// Insertion order is preserved.
pub type SensorData = Map<String, Value>;

/// A normalized sensor reading, immutable once written.
///
/// The store adds the server-assigned `storedAt` and a document id when
/// the reading is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub device_id: String,
    pub application_id: String,
    /// Client-supplied receipt time. Untrusted: may be skewed.
    pub received_at: String,
    pub rssi: Option<Value>,
    pub snr: Option<Value>,
    pub gateway_id: Option<Value>,
    pub frequency: Option<Value>,
    pub data_rate: Option<Value>,
    pub sensor_data: SensorData,
    /// The complete envelope exactly as received.
    pub raw_envelope: Value,
}

impl Reading {
    /// Name of the per-device series this reading is appended to.
    pub fn collection_name(&self) -> String {
        device_collection(&self.device_id)
    }
}

/// Per-device series name: `sensor-data-{device_id}`.
pub fn device_collection(device_id: &str) -> String {
    format!("sensor-data-{device_id}")
}

/// Extract a reading, defaulting `receivedAt` to the current time.
pub fn extract(uplink: ValidatedUplink) -> Reading {
    extract_at(uplink, Utc::now())
}

/// Extract a reading with an explicit fallback receipt time.
pub fn extract_at(uplink: ValidatedUplink, now: DateTime<Utc>) -> Reading {
    let device_id = uplink.device_id().to_string();
    let envelope = uplink.into_envelope();

    let application_id = match envelope.pointer("/end_device_ids/application_ids/application_id") {
        Some(Value::String(app)) => app.clone(),
        _ => UNKNOWN_APPLICATION.to_string(),
    };

    let received_at = match envelope.get("received_at") {
        Some(Value::String(ts)) => ts.clone(),
        _ => now.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let sensor_data = match envelope.pointer(DECODED_PAYLOAD_POINTER) {
        Some(Value::Object(map)) => map.clone(),
        // Unreachable for a validated envelope.
        _ => SensorData::new(),
    };

    Reading {
        device_id,
        application_id,
        received_at,
        rssi: present(&envelope, "/uplink_message/rx_metadata/0/rssi"),
        snr: present(&envelope, "/uplink_message/rx_metadata/0/snr"),
        gateway_id: present(&envelope, "/uplink_message/rx_metadata/0/gateway_ids/gateway_id"),
        frequency: present(&envelope, "/uplink_message/settings/frequency"),
        data_rate: present(&envelope, "/uplink_message/settings/data_rate"),
        sensor_data,
        raw_envelope: envelope,
    }
}

fn present(envelope: &Value, pointer: &str) -> Option<Value> {
    envelope.pointer(pointer).filter(|v| !v.is_null()).cloned()
}

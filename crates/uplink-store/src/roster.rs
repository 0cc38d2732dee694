//! Device roster aggregation over the global series.
//!
//! The roster is never stored. Each query folds the whole global series,
//! so cost grows linearly with the number of readings ever ingested and
//! there is no pagination. An incrementally maintained summary table
//! updated in the same transaction as `append_both` would remove the scan.

use std::collections::HashMap;

use crate::types::{DeviceRosterEntry, GlobalEntry};

/// Fold global entries, given newest first, into one entry per device.
///
/// The first entry seen for a device supplies its latest payload and
/// `last_seen`; later ones only bump `total_messages`. The result is
/// ordered by `last_seen`, most recent device first.
pub fn aggregate<I>(entries: I) -> Vec<DeviceRosterEntry>
where
    I: IntoIterator<Item = GlobalEntry>,
{
    let mut roster: Vec<DeviceRosterEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        match index.get(&entry.reading.device_id) {
            Some(&slot) => roster[slot].total_messages += 1,
            None => {
                index.insert(entry.reading.device_id.clone(), roster.len());
                roster.push(DeviceRosterEntry {
                    device_id: entry.reading.device_id,
                    application_id: entry.reading.application_id,
                    collection: entry.collection,
                    last_seen: entry.stored_at,
                    total_messages: 1,
                    latest_sensor_data: entry.reading.sensor_data,
                });
            }
        }
    }

    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use serde_json::{Value, json};
    use uplink_core::{extract, validate};

    fn entry(device_id: &str, payload: Value, stored_at: DateTime<Utc>) -> GlobalEntry {
        let body = json!({
            "end_device_ids": {
                "device_id": device_id,
                "application_ids": { "application_id": format!("app-{device_id}") }
            },
            "uplink_message": { "decoded_payload": payload }
        });
        let reading = extract(validate(body).unwrap());
        GlobalEntry {
            id: format!("g-{device_id}-{}", stored_at.timestamp_micros()),
            doc_id: format!("d-{device_id}-{}", stored_at.timestamp_micros()),
            collection: reading.collection_name(),
            stored_at,
            reading,
        }
    }

    #[test]
    fn empty_series_gives_empty_roster() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn folds_by_device_keeping_newest() {
        let t0 = Utc::now();
        // Newest first, as scanned from the store.
        let entries = vec![
            entry("d1", json!({ "battery": 3 }), t0 + Duration::seconds(4)),
            entry("d2", json!({ "battery": 9 }), t0 + Duration::seconds(3)),
            entry("d1", json!({ "battery": 2 }), t0 + Duration::seconds(2)),
            entry("d1", json!({ "battery": 1 }), t0 + Duration::seconds(1)),
        ];

        let roster = aggregate(entries);
        assert_eq!(roster.len(), 2);

        let d1 = &roster[0];
        assert_eq!(d1.device_id, "d1");
        assert_eq!(d1.total_messages, 3);
        assert_eq!(Value::Object(d1.latest_sensor_data.clone()), json!({ "battery": 3 }));
        assert_eq!(d1.last_seen, t0 + Duration::seconds(4));
        assert_eq!(d1.application_id, "app-d1");
        assert_eq!(d1.collection, "sensor-data-d1");

        let d2 = &roster[1];
        assert_eq!(d2.device_id, "d2");
        assert_eq!(d2.total_messages, 1);
    }

    #[test]
    fn roster_entry_json_shape() {
        let roster = aggregate(vec![entry("d1", json!({ "tilt": "normal" }), Utc::now())]);
        let json = serde_json::to_value(&roster[0]).unwrap();

        assert_eq!(json["deviceId"], "d1");
        assert_eq!(json["totalMessages"], 1);
        assert_eq!(json["latestSensorData"], json!({ "tilt": "normal" }));
        assert!(json["lastSeen"].is_string());
    }
}

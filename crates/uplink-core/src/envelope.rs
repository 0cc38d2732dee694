//! Payload validation for TTN-style uplink envelopes.
//!
//! The envelope is kept as an untyped `serde_json::Value`: upstream
//! device types vary their decoded payloads freely and the full body is
//! stored verbatim, so only the two paths every reading depends on are
//! checked here.

use serde_json::Value;

use crate::error::ValidationError;

/// JSON pointer to the device identifier.
pub const DEVICE_ID_POINTER: &str = "/end_device_ids/device_id";

/// JSON pointer to the decoded sensor payload.
pub const DECODED_PAYLOAD_POINTER: &str = "/uplink_message/decoded_payload";

/// An envelope that passed [`validate`].
///
/// Holds the original JSON unchanged; the device id is cached because
/// every downstream step keys on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUplink {
    device_id: String,
    envelope: Value,
}

impl ValidatedUplink {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn envelope(&self) -> &Value {
        &self.envelope
    }

    pub fn into_envelope(self) -> Value {
        self.envelope
    }
}

/// Check an inbound envelope for the minimum shape needed to build a reading.
///
/// A device id must be a non-empty string and the decoded payload must be
/// a JSON object. Nothing else is inspected.
pub fn validate(envelope: Value) -> Result<ValidatedUplink, ValidationError> {
    let device_id = match envelope.pointer(DEVICE_ID_POINTER) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return Err(ValidationError::MissingDeviceId),
    };

    if !matches!(envelope.pointer(DECODED_PAYLOAD_POINTER), Some(Value::Object(_))) {
        return Err(ValidationError::MissingPayload);
    }

    Ok(ValidatedUplink {
        device_id,
        envelope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_envelope() {
        let body = json!({
            "end_device_ids": { "device_id": "bin-sensor-001" },
            "uplink_message": { "decoded_payload": { "battery": 92 } }
        });

        let uplink = validate(body.clone()).unwrap();
        assert_eq!(uplink.device_id(), "bin-sensor-001");
        assert_eq!(uplink.envelope(), &body);
    }

    #[test]
    fn missing_end_device_ids() {
        let body = json!({ "uplink_message": { "decoded_payload": { "battery": 1 } } });
        assert_eq!(validate(body), Err(ValidationError::MissingDeviceId));
    }

    #[test]
    fn empty_or_non_string_device_id() {
        for id in [json!(""), json!(null), json!(42)] {
            let body = json!({
                "end_device_ids": { "device_id": id },
                "uplink_message": { "decoded_payload": { "battery": 1 } }
            });
            assert_eq!(validate(body), Err(ValidationError::MissingDeviceId));
        }
    }

    #[test]
    fn device_id_checked_before_payload() {
        let body = json!({ "received_at": "2025-01-01T00:00:00Z" });
        assert_eq!(validate(body), Err(ValidationError::MissingDeviceId));
    }

    #[test]
    fn missing_decoded_payload() {
        let body = json!({
            "end_device_ids": { "device_id": "d1" },
            "uplink_message": { "f_port": 1 }
        });
        assert_eq!(validate(body), Err(ValidationError::MissingPayload));

        let body = json!({ "end_device_ids": { "device_id": "d1" } });
        assert_eq!(validate(body), Err(ValidationError::MissingPayload));
    }

    #[test]
    fn non_object_payload_is_missing() {
        let body = json!({
            "end_device_ids": { "device_id": "d1" },
            "uplink_message": { "decoded_payload": null }
        });
        assert_eq!(validate(body), Err(ValidationError::MissingPayload));
    }

    #[test]
    fn empty_payload_object_is_accepted() {
        let body = json!({
            "end_device_ids": { "device_id": "d1" },
            "uplink_message": { "decoded_payload": {} }
        });
        assert!(validate(body).is_ok());
    }

    #[test]
    fn error_labels_and_messages() {
        assert_eq!(ValidationError::MissingDeviceId.label(), "Missing device_id");
        assert_eq!(
            ValidationError::MissingPayload.to_string(),
            "uplink_message.decoded_payload is required"
        );
    }
}

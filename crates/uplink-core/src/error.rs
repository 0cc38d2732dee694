//! Validation errors for inbound uplink envelopes.

use thiserror::Error;

/// The only two reasons an envelope is refused before persistence.
///
/// `Display` yields the caller-facing message; [`ValidationError::label`]
/// yields the short error name used in the 400 response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("end_device_ids.device_id is required")]
    MissingDeviceId,

    #[error("uplink_message.decoded_payload is required")]
    MissingPayload,
}

impl ValidationError {
    /// Short machine-readable label for the error.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingDeviceId => "Missing device_id",
            Self::MissingPayload => "Missing decoded_payload",
        }
    }
}

//! HTTP handlers.
//!
//! Each handler calls into the dual writer or the query façade and maps
//! the outcome onto the JSON bodies the network server and dashboards
//! expect.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use uplink_core::{ValidationError, extract, validate};
use uplink_store::{DeviceRosterEntry, SeriesStore, StoredReading};

use crate::ApiState;

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of a rejected envelope (400).
#[derive(Serialize)]
struct ValidationBody {
    error: &'static str,
    message: String,
}

fn validation_error(err: ValidationError) -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationBody {
            error: err.label(),
            message: err.to_string(),
        }),
    )
}

/// Body of a failed store call (500).
#[derive(Serialize)]
struct FailureBody {
    success: bool,
    error: &'static str,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

fn store_failure(error: &'static str, details: String, timestamp: Option<String>) -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureBody {
            success: false,
            error,
            details,
            timestamp,
        }),
    )
}

// ── Ingestion ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub device_id: String,
    pub collection: String,
    pub doc_id: String,
    /// The reading's `receivedAt`.
    pub timestamp: String,
}

/// POST /ttn
pub async fn ingest_uplink(State(state): State<ApiState>, Json(body): Json<Value>) -> impl IntoResponse {
    let uplink = match validate(body) {
        Ok(uplink) => uplink,
        Err(e) => {
            warn!(error = %e, "uplink rejected");
            return validation_error(e).into_response();
        }
    };

    let reading = extract(uplink);
    debug!(
        device_id = %reading.device_id,
        application_id = %reading.application_id,
        sensor_fields = reading.sensor_data.len(),
        "uplink received"
    );

    match state.writer.write(&reading) {
        Ok(result) => {
            info!(
                device_id = %reading.device_id,
                collection = %result.collection_name,
                doc_id = %result.device_doc_id,
                "reading stored"
            );
            Json(IngestResponse {
                success: true,
                message: "Data stored successfully".to_string(),
                device_id: reading.device_id,
                collection: result.collection_name,
                doc_id: result.device_doc_id,
                timestamp: reading.received_at,
            })
            .into_response()
        }
        Err(e) => {
            error!(device_id = %reading.device_id, error = %e, "failed to store reading");
            store_failure("Failed to process webhook data", e.to_string(), Some(now_rfc3339()))
                .into_response()
        }
    }
}

// ── Device history ─────────────────────────────────────────────

/// Query string for the latest-readings endpoint. `limit` stays a raw
/// string so non-numeric values fall back to the default instead of
/// failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct LatestParams {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub success: bool,
    pub device_id: String,
    pub count: usize,
    pub data: Vec<StoredReading>,
}

/// GET /device/{device_id}/latest
pub async fn latest_readings(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    Query(params): Query<LatestParams>,
) -> impl IntoResponse {
    let limit = state.limits.resolve_limit(params.limit.as_deref());

    match state.query.latest(&device_id, limit) {
        Ok(data) => Json(LatestResponse {
            success: true,
            count: data.len(),
            device_id,
            data,
        })
        .into_response(),
        Err(e) => {
            error!(%device_id, error = %e, "failed to fetch device data");
            store_failure("Failed to fetch device data", e.to_string(), None).into_response()
        }
    }
}

// ── Roster ─────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesResponse {
    pub success: bool,
    pub devices: Vec<DeviceRosterEntry>,
    pub total_devices: usize,
}

/// GET /devices
pub async fn list_devices(State(state): State<ApiState>) -> impl IntoResponse {
    match state.query.list_devices() {
        Ok(devices) => Json(DevicesResponse {
            success: true,
            total_devices: devices.len(),
            devices,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "failed to fetch devices");
            store_failure("Failed to fetch devices", e.to_string(), None).into_response()
        }
    }
}

// ── Health / discovery ─────────────────────────────────────────

/// GET /health
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.ping() {
        Ok(_) => Json(json!({
            "status": "healthy",
            "store": "connected",
            "timestamp": now_rfc3339(),
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                    "timestamp": now_rfc3339(),
                })),
            )
                .into_response()
        }
    }
}

/// GET /
pub async fn discovery() -> impl IntoResponse {
    Json(json!({
        "service": "uplink LoRaWAN webhook sink",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "webhook": "POST /ttn",
            "health": "GET /health",
            "latestData": "GET /device/:deviceId/latest",
            "allDevices": "GET /devices",
        },
        "timestamp": now_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::response::Response;
    use uplink_core::UplinkConfig;
    use uplink_store::ReadingStore;

    fn test_state() -> ApiState {
        let store: Arc<dyn SeriesStore> = Arc::new(ReadingStore::open_in_memory().unwrap());
        ApiState::new(store, &UplinkConfig::default())
    }

    fn envelope(device_id: &str, payload: Value) -> Value {
        json!({
            "end_device_ids": { "device_id": device_id },
            "received_at": "2025-06-01T12:00:00Z",
            "uplink_message": { "decoded_payload": payload }
        })
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ingest_valid_envelope() {
        let state = test_state();
        let resp = ingest_uplink(State(state.clone()), Json(envelope("d1", json!({ "battery": 84 }))))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["deviceId"], "d1");
        assert_eq!(body["collection"], "sensor-data-d1");
        assert_eq!(body["timestamp"], "2025-06-01T12:00:00Z");
        assert!(body["docId"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn ingest_missing_device_id() {
        let state = test_state();
        let body = json!({ "uplink_message": { "decoded_payload": { "battery": 1 } } });
        let resp = ingest_uplink(State(state.clone()), Json(body)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["error"], "Missing device_id");
        assert_eq!(body["message"], "end_device_ids.device_id is required");
        assert!(state.store.scan_global().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ingest_missing_payload() {
        let state = test_state();
        let body = json!({ "end_device_ids": { "device_id": "d1" } });
        let resp = ingest_uplink(State(state.clone()), Json(body)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["error"], "Missing decoded_payload");
        assert!(state.store.latest("d1", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_defaults_and_limits() {
        let state = test_state();
        for n in 0..12 {
            ingest_uplink(State(state.clone()), Json(envelope("d1", json!({ "n": n })))).await;
        }

        let resp = latest_readings(
            State(state.clone()),
            Path("d1".to_string()),
            Query(LatestParams::default()),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["count"], 10);

        let resp = latest_readings(
            State(state.clone()),
            Path("d1".to_string()),
            Query(LatestParams {
                limit: Some("nope".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(body_json(resp).await["count"], 10);

        let resp = latest_readings(
            State(state),
            Path("d1".to_string()),
            Query(LatestParams {
                limit: Some("2".to_string()),
            }),
        )
        .await
        .into_response();
        let body = body_json(resp).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["sensorData"]["n"], 11);
    }

    #[tokio::test]
    async fn latest_unknown_device_is_empty() {
        let state = test_state();
        let resp = latest_readings(
            State(state),
            Path("ghost".to_string()),
            Query(LatestParams::default()),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["deviceId"], "ghost");
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn devices_empty() {
        let state = test_state();
        let resp = list_devices(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["totalDevices"], 0);
        assert_eq!(body["devices"], json!([]));
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let state = test_state();
        let resp = health(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");
    }

    #[tokio::test]
    async fn discovery_lists_endpoints() {
        let resp = discovery().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["endpoints"]["webhook"], "POST /ttn");
    }
}

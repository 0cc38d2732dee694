//! uplink-api: HTTP surface for uplink.
//!
//! Wires the ingestion pipeline (validate → extract → dual write) and the
//! query façade to axum routes.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/ttn` | Ingest one uplink envelope |
//! | GET | `/device/{device_id}/latest?limit=N` | Latest readings for a device |
//! | GET | `/devices` | Device roster |
//! | GET | `/health` | Store round-trip probe |
//! | GET | `/` | Capability listing |

pub mod cors;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use uplink_core::UplinkConfig;
use uplink_core::config::QueryConfig;
use uplink_store::{DualWriter, ReadingQuery, SeriesStore};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub writer: DualWriter,
    pub query: ReadingQuery,
    pub store: Arc<dyn SeriesStore>,
    pub limits: QueryConfig,
}

impl ApiState {
    pub fn new(store: Arc<dyn SeriesStore>, config: &UplinkConfig) -> Self {
        Self {
            writer: DualWriter::new(store.clone(), config.store.write_mode),
            query: ReadingQuery::new(store.clone()),
            store,
            limits: config.query.clone(),
        }
    }
}

/// Build the complete API router.
pub fn build_router(store: Arc<dyn SeriesStore>, config: &UplinkConfig) -> Router {
    let state = ApiState::new(store, config);

    Router::new()
        .route("/", get(handlers::discovery))
        .route("/health", get(handlers::health))
        .route("/ttn", post(handlers::ingest_uplink))
        .route("/device/{device_id}/latest", get(handlers::latest_readings))
        .route("/devices", get(handlers::list_devices))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(cors::build_cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! CORS layer construction from `[cors]` configuration.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};
use uplink_core::config::CorsConfig;

/// Build the CORS layer. `["*"]` allows any origin, an explicit list is
/// matched exactly, an empty list adds no CORS headers.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(config.max_age_seconds));

    if config.allowed_origins.is_empty() {
        return cors;
    }

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        if config.allowed_origins.len() > 1 {
            error!(
                origins = ?config.allowed_origins,
                "'*' must be the only allowed origin; ignoring CORS config"
            );
            return cors;
        }
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                error!(%origin, "invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        warn!("all configured CORS origins were invalid; disabling CORS");
        cors
    } else {
        info!(origins = ?config.allowed_origins, "CORS configured");
        cors.allow_origin(AllowOrigin::list(allowed))
    }
}

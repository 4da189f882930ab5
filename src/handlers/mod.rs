//! HTTP request handlers for the happymap API.
//!
//! This module contains all the endpoint handlers for the web server.

pub mod country;
pub mod heartbeat;
pub mod markers;
pub mod metrics;
pub mod table;
pub mod years;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::HappyMapError;
use crate::logging::create_http_trace_layer;
use crate::state::AppState;

pub use country::{countries_handler, country_location_handler, country_locations_handler};
pub use heartbeat::heartbeat_handler;
pub use markers::markers_handler;
pub use metrics::metrics_handler;
pub use table::table_handler;
pub use years::years_handler;

/// Build the API router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/years", get(years_handler))
        .route("/api/country", get(countries_handler))
        .route("/api/country/location", get(country_locations_handler))
        .route("/api/country/:country/location", get(country_location_handler))
        .route("/api/table/year/:year", get(table_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/api/markers", get(markers_handler))
        .route("/heartbeat", get(heartbeat_handler))
        .layer(create_http_trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP status for an error surfaced by a handler
pub fn status_for(error: &HappyMapError) -> StatusCode {
    match error {
        HappyMapError::UnknownMetric { .. } | HappyMapError::InvalidParameter { .. } => {
            StatusCode::BAD_REQUEST
        }
        HappyMapError::MissingCoordinate { .. } | HappyMapError::DataNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        HappyMapError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body `{"error": ..., "request_id": ...}`
pub fn error_response(error: &HappyMapError, request_id: &str) -> Response {
    (
        status_for(error),
        Json(serde_json::json!({
            "error": error.to_string(),
            "request_id": request_id
        })),
    )
        .into_response()
}

//! Country list and location endpoint handlers.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::error_response;
use crate::logging::{generate_request_id, log_request_error};
use crate::models::CoordinateTable;
use crate::state::AppState;

/// Handle GET /api/country requests
pub async fn countries_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.dataset.countries())
}

/// Handle GET /api/country/location requests
pub async fn country_locations_handler(
    State(state): State<Arc<AppState>>,
) -> Json<CoordinateTable> {
    Json(state.dataset.coordinates.clone())
}

/// Handle GET /api/country/:country/location requests
pub async fn country_location_handler(
    State(state): State<Arc<AppState>>,
    Path(country): Path<String>,
) -> Response {
    let request_id = generate_request_id();

    match state.dataset.location(&country) {
        Ok(location) => {
            debug!(
                endpoint = "/api/country/:country/location",
                request_id = %request_id,
                country = %country,
                "Location request successful"
            );
            Json(location).into_response()
        }
        Err(error) => {
            log_request_error(
                &error,
                "/api/country/:country/location",
                &request_id,
                Some(&country),
            );
            error_response(&error, &request_id)
        }
    }
}

//! Per-year table endpoint handler.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::error_response;
use crate::error::HappyMapError;
use crate::logging::{generate_request_id, log_request_error};
use crate::state::AppState;

/// Handle GET /api/table/year/:year requests.
///
/// A year without observations yields an empty list.
pub async fn table_handler(
    State(state): State<Arc<AppState>>,
    year: std::result::Result<Path<i32>, PathRejection>,
) -> Response {
    let request_id = generate_request_id();
    let year = match year {
        Ok(Path(year)) => year,
        Err(rejection) => {
            let error = HappyMapError::InvalidParameter {
                param: "year".to_string(),
                message: rejection.body_text(),
            };
            log_request_error(&error, "/api/table/year/:year", &request_id, None);
            return error_response(&error, &request_id);
        }
    };
    let rows = state.dataset.rows_for_year(year);

    debug!(
        endpoint = "/api/table/year/:year",
        request_id = %request_id,
        year = year,
        row_count = rows.len(),
        "Table request successful"
    );

    Json(rows).into_response()
}

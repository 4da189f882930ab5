//! Years endpoint handler.
//!
//! Returns the sorted list of years present in the happiness table.

use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::debug;

use crate::logging::generate_request_id;
use crate::state::AppState;

/// Handle GET /api/years requests
pub async fn years_handler(State(state): State<Arc<AppState>>) -> Json<Vec<i32>> {
    let request_id = generate_request_id();
    let years = state.dataset.years();

    debug!(
        endpoint = "/api/years",
        request_id = %request_id,
        year_count = years.len(),
        "Years request successful"
    );

    Json(years)
}

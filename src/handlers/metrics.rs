//! Metric registry endpoint handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::metrics::MetricDefinition;
use crate::state::AppState;

/// Handle GET /api/metrics requests
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<Vec<MetricDefinition>> {
    Json(state.registry.definitions().to_vec())
}

//! Marker set endpoint handler.
//!
//! Runs one render pass on the server and returns the colored markers for a
//! (year, metric) view, so thin clients only have to draw them.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::error_response;
use crate::colors::ColorStrategy;
use crate::error::{HappyMapError, Result};
use crate::logging::{generate_request_id, log_request_error};
use crate::metrics::MetricId;
use crate::render::{render_markers, RecordingSurface, RenderSummary, RenderableMarker};
use crate::state::AppState;

/// Query parameters for the markers endpoint
#[derive(Debug, Deserialize)]
pub struct MarkersQuery {
    /// Survey year
    pub year: i32,
    /// Metric id (defaults to the configured metric)
    pub metric: Option<String>,
    /// Color policy: gradient or banded (defaults to the configured policy)
    pub policy: Option<String>,
}

/// Response for a marker query
#[derive(Debug, Serialize)]
pub struct MarkersResponse {
    pub year: i32,
    pub metric: MetricId,
    pub policy: ColorStrategy,
    pub summary: RenderSummary,
    pub markers: Vec<RenderableMarker>,
}

/// Handle GET /api/markers requests
pub async fn markers_handler(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<MarkersQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            let error = HappyMapError::InvalidParameter {
                param: "query".to_string(),
                message: rejection.body_text(),
            };
            log_request_error(&error, "/api/markers", &request_id, None);
            return error_response(&error, &request_id);
        }
    };

    debug!(
        endpoint = "/api/markers",
        request_id = %request_id,
        year = params.year,
        metric = ?params.metric,
        policy = ?params.policy,
        "Processing markers request"
    );

    match build_response(&state, &params) {
        Ok(response) => {
            info!(
                endpoint = "/api/markers",
                request_id = %request_id,
                year = response.year,
                metric = %response.metric,
                policy = %response.policy,
                drawn = response.summary.drawn,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Markers request successful"
            );
            Json(response).into_response()
        }
        Err(error) => {
            log_request_error(
                &error,
                "/api/markers",
                &request_id,
                Some(&format!("{:?}", params)),
            );
            error_response(&error, &request_id)
        }
    }
}

fn build_response(state: &AppState, params: &MarkersQuery) -> Result<MarkersResponse> {
    let metric_id = match &params.metric {
        Some(id) => id.parse::<MetricId>()?,
        None => state.config.default_metric()?,
    };
    let strategy = match &params.policy {
        Some(name) => name.parse::<ColorStrategy>()?,
        None => state.default_strategy(),
    };

    let metric = state.registry.get(metric_id);
    let rows = state.dataset.rows_for_year(params.year);
    let mut surface = RecordingSurface::new();
    let summary = render_markers(
        &rows,
        &state.dataset.coordinates,
        metric,
        metric.policy(strategy),
        params.year,
        &mut surface,
    )?;

    Ok(MarkersResponse {
        year: params.year,
        metric: metric_id,
        policy: strategy,
        summary,
        markers: surface.into_markers(),
    })
}

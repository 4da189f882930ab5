//! Heartbeat endpoint handler.
//!
//! Returns server status information, including uptime and a summary of the
//! loaded dataset.

use axum::{extract::State, Json};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::state::AppState;

/// Unique id of this server process
static SERVER_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Server start time
static START_TIME: Lazy<SystemTime> = Lazy::new(SystemTime::now);

/// Heartbeat response structure
#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    /// Server ID (unique per instance)
    pub server_id: String,
    /// Current timestamp (ISO 8601 format)
    pub timestamp: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Process resident memory in bytes, where the platform reports it
    pub memory_usage_bytes: Option<u64>,
    /// Dataset information
    pub dataset: DatasetInfo,
    /// Server status
    pub status: String,
}

/// Dataset information structure
#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub table_path: String,
    pub row_count: usize,
    pub years: Vec<i32>,
    pub country_count: usize,
    pub metric_count: usize,
    pub default_policy: String,
}

/// Record the start time; call once at startup so uptime counts from there
pub fn mark_started() {
    Lazy::force(&START_TIME);
}

/// Handle GET /heartbeat requests
pub async fn heartbeat_handler(State(state): State<Arc<AppState>>) -> Json<HeartbeatResponse> {
    Json(build_heartbeat(&state))
}

fn build_heartbeat(state: &AppState) -> HeartbeatResponse {
    let now = SystemTime::now();
    let timestamp = chrono::DateTime::<chrono::Utc>::from(now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let uptime = now
        .duration_since(*START_TIME)
        .unwrap_or(Duration::from_secs(0));

    HeartbeatResponse {
        server_id: SERVER_ID.clone(),
        timestamp,
        uptime_seconds: uptime.as_secs(),
        memory_usage_bytes: get_memory_usage(),
        dataset: DatasetInfo {
            table_path: state.config.data.table_path.display().to_string(),
            row_count: state.dataset.rows.len(),
            years: state.dataset.years(),
            country_count: state.dataset.coordinates.len(),
            metric_count: state.registry.definitions().len(),
            default_policy: state.default_strategy().to_string(),
        },
        status: "healthy".to_string(),
    }
}

/// Resident set size of this process (Linux only)
fn get_memory_usage() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        // Second field of /proc/self/statm is RSS in pages
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages = statm.split_whitespace().nth(1)?.parse::<u64>().ok()?;
        Some(pages * 4096)
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

//! # happymap
//!
//! World happiness map data server and value-to-color rendering engine.
//!
//! The library serves per-country, per-year survey metrics over a small REST
//! API and turns metric values into marker or polygon colors for a map front
//! end.
//!
//! ## Architecture
//!
//! - **Metric registry** ([`metrics`]): the closed set of survey metrics with
//!   their source fields, polarity, and color control points
//! - **Color engine** ([`colors`]): continuous gradient and discrete band
//!   policies behind one [`colors::ColorPolicy`] trait
//! - **Rendering** ([`render`]): clear-then-repopulate passes over an abstract
//!   drawing surface
//! - **Viewer** ([`viewer`], [`animation`]): explicit map state with
//!   last-selection-wins updates and year auto-advance
//! - **API layer** ([`handlers`]): axum endpoints over the loaded dataset

pub mod animation;
pub mod colors;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod render;
pub mod state;
pub mod viewer;

pub use colors::{ColorPolicy, ColorStrategy, ControlPoint, Polarity, RgbColor};
pub use config::Config;
pub use error::{HappyMapError, Result};
pub use logging::{
    create_http_trace_layer, generate_request_id, init_tracing, log_data_load_stats, log_error,
    log_operation_end, log_operation_start, log_request_error, log_timed_operation,
};
pub use metrics::{MetricDefinition, MetricId, MetricRegistry};
pub use models::{Coordinate, CoordinateTable, DataRow};
pub use state::{AppState, Dataset};

//! Error types for the happymap application.
//!
//! Runtime failures (fetches, missing rows) are recoverable and are handled by
//! skipping the affected unit of work. Configuration failures (unknown metric,
//! malformed control points) are bugs in static tables and surface loudly.

use thiserror::Error;

/// The main error type for happymap operations.
#[derive(Error, Debug)]
pub enum HappyMapError {
    /// Metric id not present in the registry
    #[error("Unknown metric: {id}")]
    UnknownMetric { id: String },

    /// Control points that cannot form a color scale
    #[error("Degenerate color range: {message}")]
    DegenerateRange { message: String },

    /// Malformed hex color string
    #[error("Invalid color: {input}")]
    InvalidColor { input: String },

    /// Network or decode failure while fetching remote data
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Country absent from the coordinate table
    #[error("No coordinates for country: {country}")]
    MissingCoordinate { country: String },

    /// Metric field absent on a data row
    #[error("Missing value for {country}: {field}")]
    MissingValue { country: String, field: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Data not found errors
    #[error("Data not found: {message}")]
    DataNotFound { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server errors
    #[error("Server error: {message}")]
    Server { message: String },
}

impl HappyMapError {
    /// Whether the error is expected at runtime and can be recovered from by
    /// skipping one row or one fetch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HappyMapError::Fetch { .. }
                | HappyMapError::MissingCoordinate { .. }
                | HappyMapError::MissingValue { .. }
        )
    }
}

/// Convenience type alias for Results with HappyMapError
pub type Result<T> = std::result::Result<T, HappyMapError>;

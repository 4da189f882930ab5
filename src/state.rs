//! Application state management for happymap.
//!
//! This module defines the shared state that is passed to all handlers,
//! containing the loaded happiness table, the coordinate table, and the
//! metric registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::colors::ColorStrategy;
use crate::config::Config;
use crate::error::{HappyMapError, Result};
use crate::metrics::MetricRegistry;
use crate::models::{Coordinate, CoordinateTable, CountryLocation, DataRow};

/// In-memory happiness table plus country coordinates
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// One row per (country, year)
    pub rows: Vec<DataRow>,
    /// Marker position per country
    pub coordinates: CoordinateTable,
}

impl Dataset {
    pub fn new(rows: Vec<DataRow>, coordinates: CoordinateTable) -> Self {
        Self { rows, coordinates }
    }

    /// Distinct years, ascending
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|row| row.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows observed in `year`
    pub fn rows_for_year(&self, year: i32) -> Vec<DataRow> {
        self.rows
            .iter()
            .filter(|row| row.year == year)
            .cloned()
            .collect()
    }

    /// Countries with known coordinates, sorted
    pub fn countries(&self) -> Vec<String> {
        self.coordinates.keys().cloned().collect()
    }

    /// Coordinates of one country
    pub fn coordinate(&self, country: &str) -> Option<Coordinate> {
        self.coordinates.get(country).copied()
    }

    /// Location response for one country
    pub fn location(&self, country: &str) -> Result<CountryLocation> {
        self.coordinate(country)
            .map(|c| CountryLocation {
                country: country.to_string(),
                latitude: c.latitude,
                longitude: c.longitude,
            })
            .ok_or_else(|| HappyMapError::MissingCoordinate {
                country: country.to_string(),
            })
    }

    /// Countries in the table that have no coordinates
    pub fn countries_without_coordinates(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.country.as_str())
            .filter(|country| !self.coordinates.contains_key(*country))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// The main application state shared across all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Loaded table and coordinates
    pub dataset: Dataset,
    /// Metric definitions
    pub registry: MetricRegistry,
}

impl AppState {
    /// Create a new AppState, building the metric registry
    pub fn new(config: Config, dataset: Dataset) -> Result<Self> {
        Ok(Self {
            config,
            dataset,
            registry: MetricRegistry::builtin()?,
        })
    }

    /// Create a new AppState wrapped in an Arc for shared ownership
    pub fn new_shared(config: Config, dataset: Dataset) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::new(config, dataset)?))
    }

    /// Color policy used when a request does not name one
    pub fn default_strategy(&self) -> ColorStrategy {
        self.config.color_strategy().unwrap_or_default()
    }

    /// Validate that the application state is consistent and ready for use
    pub fn validate(&self) -> Result<()> {
        if self.dataset.rows.is_empty() {
            return Err(HappyMapError::DataNotFound {
                message: "Happiness table has no rows".to_string(),
            });
        }
        if self.dataset.coordinates.is_empty() {
            return Err(HappyMapError::DataNotFound {
                message: "Coordinate table has no countries".to_string(),
            });
        }
        Ok(())
    }
}

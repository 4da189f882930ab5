//! Data fetch contract.
//!
//! The viewer reads years, coordinates, per-year rows and boundary polygons
//! through [`DataSource`]. [`HttpDataSource`] talks to the happymap REST API;
//! [`StaticDataSource`] serves an in-memory [`Dataset`].

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{HappyMapError, Result};
use crate::models::{CoordinateTable, DataRow, FeatureCollection};
use crate::state::Dataset;

/// Default timeout for remote requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Asynchronous source of map data.
///
/// Every method fails with [`HappyMapError::Fetch`] on transport errors,
/// non-2xx responses, or malformed JSON.
pub trait DataSource: Send + Sync {
    /// Years with data, ascending
    fn fetch_years(&self) -> BoxFuture<'_, Result<Vec<i32>>>;

    /// Country name to marker position
    fn fetch_country_coordinates(&self) -> BoxFuture<'_, Result<CoordinateTable>>;

    /// Rows observed in `year`
    fn fetch_table_for_year(&self, year: i32) -> BoxFuture<'_, Result<Vec<DataRow>>>;

    /// Country boundary polygons
    fn fetch_boundaries(&self) -> BoxFuture<'_, Result<FeatureCollection>>;
}

/// Client for the happymap REST API
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    base_url: String,
    boundaries_url: Option<String>,
    client: reqwest::Client,
}

impl HttpDataSource {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("happymap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HappyMapError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            boundaries_url: None,
            client,
        })
    }

    /// Fetch boundary polygons from a GeoJSON URL
    pub fn with_boundaries_url(mut self, url: impl Into<String>) -> Self {
        self.boundaries_url = Some(url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!(url = %url, "Fetching");
        let fetch_error = |message: String| HappyMapError::Fetch {
            url: url.clone(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("unexpected status {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| fetch_error(format!("malformed JSON: {}", e)))
    }
}

impl DataSource for HttpDataSource {
    fn fetch_years(&self) -> BoxFuture<'_, Result<Vec<i32>>> {
        async move {
            let mut years: Vec<i32> = self.get_json(self.endpoint_url("years")).await?;
            years.sort_unstable();
            years.dedup();
            Ok(years)
        }
        .boxed()
    }

    fn fetch_country_coordinates(&self) -> BoxFuture<'_, Result<CoordinateTable>> {
        self.get_json(self.endpoint_url("country/location")).boxed()
    }

    fn fetch_table_for_year(&self, year: i32) -> BoxFuture<'_, Result<Vec<DataRow>>> {
        self.get_json(self.endpoint_url(&format!("table/year/{}", year)))
            .boxed()
    }

    fn fetch_boundaries(&self) -> BoxFuture<'_, Result<FeatureCollection>> {
        async move {
            let url = self
                .boundaries_url
                .clone()
                .ok_or_else(|| HappyMapError::Config {
                    message: "No boundaries URL configured".to_string(),
                })?;
            self.get_json(url).await
        }
        .boxed()
    }
}

/// In-memory source backed by a loaded dataset
#[derive(Debug, Clone)]
pub struct StaticDataSource {
    dataset: Arc<Dataset>,
    boundaries: Option<FeatureCollection>,
}

impl StaticDataSource {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            boundaries: None,
        }
    }

    pub fn with_boundaries(mut self, boundaries: FeatureCollection) -> Self {
        self.boundaries = Some(boundaries);
        self
    }
}

impl DataSource for StaticDataSource {
    fn fetch_years(&self) -> BoxFuture<'_, Result<Vec<i32>>> {
        futures::future::ready(Ok(self.dataset.years())).boxed()
    }

    fn fetch_country_coordinates(&self) -> BoxFuture<'_, Result<CoordinateTable>> {
        futures::future::ready(Ok(self.dataset.coordinates.clone())).boxed()
    }

    fn fetch_table_for_year(&self, year: i32) -> BoxFuture<'_, Result<Vec<DataRow>>> {
        futures::future::ready(Ok(self.dataset.rows_for_year(year))).boxed()
    }

    fn fetch_boundaries(&self) -> BoxFuture<'_, Result<FeatureCollection>> {
        let result = self.boundaries.clone().ok_or_else(|| HappyMapError::DataNotFound {
            message: "No boundaries loaded".to_string(),
        });
        futures::future::ready(result).boxed()
    }
}

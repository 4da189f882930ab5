//! Data rows, coordinates, and boundary features.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Column holding the country name in the happiness table
pub const COUNTRY_FIELD: &str = "Country name";

/// Column holding the survey year in the happiness table
pub const YEAR_FIELD: &str = "year";

/// One (country, year) observation.
///
/// Metric fields map to `None` when the source cell was empty, null or not a
/// number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct DataRow {
    #[serde(rename = "Country name")]
    pub country: String,
    pub year: i32,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<f64>>,
}

impl DataRow {
    pub fn new(country: impl Into<String>, year: i32) -> Self {
        Self {
            country: country.into(),
            year,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter for a present value
    pub fn with_value(mut self, field: impl Into<String>, value: f64) -> Self {
        self.fields.insert(field.into(), Some(value));
        self
    }

    /// Builder-style setter for an explicitly absent value
    pub fn with_absent(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), None);
        self
    }

    /// Value under `field`, or `None` when missing, null or non-finite
    pub fn value(&self, field: &str) -> Option<f64> {
        self.fields
            .get(field)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

impl TryFrom<Map<String, Value>> for DataRow {
    type Error = String;

    fn try_from(mut raw: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let country = match raw.remove(COUNTRY_FIELD) {
            Some(Value::String(name)) => name,
            Some(other) => return Err(format!("\"{}\" is not a string: {}", COUNTRY_FIELD, other)),
            None => return Err(format!("missing field \"{}\"", COUNTRY_FIELD)),
        };
        let year = match raw.remove(YEAR_FIELD) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| format!("invalid year: {}", n))?,
            Some(Value::String(s)) => s
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid year: {}", s))?,
            Some(other) => return Err(format!("invalid year: {}", other)),
            None => return Err(format!("missing field \"{}\"", YEAR_FIELD)),
        };

        let fields = raw
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, value)| {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                (key, number)
            })
            .collect();

        Ok(Self {
            country,
            year,
            fields,
        })
    }
}

/// Geographic position of a country marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(c: Coordinate) -> Self {
        (c.latitude, c.longitude)
    }
}

/// Country name to marker position
pub type CoordinateTable = BTreeMap<String, Coordinate>;

/// Single-country location response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryLocation {
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// GeoJSON feature collection with country boundaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

/// One boundary feature; only `properties.name` is interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub properties: FeatureProperties,
    #[serde(default)]
    pub geometry: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub name: Option<String>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

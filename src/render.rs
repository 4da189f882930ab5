//! Render passes over an abstract drawing surface.
//!
//! A pass builds every shape for one (year, metric) view first, then clears
//! the surface once and draws them all. A pass that fails leaves the surface
//! untouched.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::colors::{ColorPolicy, RgbColor};
use crate::error::{HappyMapError, Result};
use crate::metrics::MetricDefinition;
use crate::models::{Coordinate, CoordinateTable, DataRow, FeatureCollection};

/// A colored marker for one country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableMarker {
    pub country: String,
    pub coordinate: Coordinate,
    pub color: RgbColor,
    pub tooltip: String,
}

/// A colored boundary polygon for one country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderablePolygon {
    pub country: String,
    pub geometry: serde_json::Value,
    pub color: RgbColor,
    pub tooltip: String,
}

/// Drawing capability provided by the map front end
pub trait RenderSurface: Send {
    /// Remove every shape drawn by the previous pass
    fn clear_markers(&mut self);

    fn add_marker(&mut self, marker: RenderableMarker);

    fn add_polygon(&mut self, polygon: RenderablePolygon);
}

/// What a render pass drew and what it skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderSummary {
    pub drawn: usize,
    /// Countries skipped for lack of coordinates or boundaries
    pub missing_coordinates: Vec<String>,
    /// Countries skipped for lack of a metric value
    pub missing_values: Vec<String>,
}

/// Tooltip text for a marker
pub fn marker_tooltip(metric: &MetricDefinition, country: &str, year: i32, value: f64) -> String {
    format!(
        "<b>{}</b><br>Year: {}<br>{}: {}",
        country, year, metric.label, value
    )
}

/// Tooltip text for a polygon
pub fn polygon_tooltip(country: &str, value: f64) -> String {
    format!("{}: {:.2}", country, value)
}

/// Build markers for the rows of `year` without touching any surface
pub fn build_markers(
    rows: &[DataRow],
    coordinates: &CoordinateTable,
    metric: &MetricDefinition,
    policy: &dyn ColorPolicy,
    year: i32,
) -> Result<(Vec<RenderableMarker>, RenderSummary)> {
    let mut markers = Vec::new();
    let mut summary = RenderSummary::default();

    for row in rows.iter().filter(|row| row.year == year) {
        let Some(&coordinate) = coordinates.get(&row.country) else {
            let skipped = HappyMapError::MissingCoordinate {
                country: row.country.clone(),
            };
            warn!(error = %skipped, "Skipping row");
            summary.missing_coordinates.push(row.country.clone());
            continue;
        };
        let Some(value) = metric.extract(row) else {
            let skipped = HappyMapError::MissingValue {
                country: row.country.clone(),
                field: metric.field_name.to_string(),
            };
            debug!(error = %skipped, "Skipping row");
            summary.missing_values.push(row.country.clone());
            continue;
        };

        markers.push(RenderableMarker {
            country: row.country.clone(),
            coordinate,
            color: policy.color_for(value)?,
            tooltip: marker_tooltip(metric, &row.country, year, value),
        });
    }

    summary.drawn = markers.len();
    Ok((markers, summary))
}

/// Replace the surface contents with the markers for one view
pub fn render_markers<S: RenderSurface + ?Sized>(
    rows: &[DataRow],
    coordinates: &CoordinateTable,
    metric: &MetricDefinition,
    policy: &dyn ColorPolicy,
    year: i32,
    surface: &mut S,
) -> Result<RenderSummary> {
    let (markers, summary) = build_markers(rows, coordinates, metric, policy, year)?;

    surface.clear_markers();
    for marker in markers {
        surface.add_marker(marker);
    }

    info!(
        operation = "render_markers",
        metric = %metric.id,
        policy = policy.name(),
        year = year,
        drawn = summary.drawn,
        missing_coordinates = summary.missing_coordinates.len(),
        missing_values = summary.missing_values.len(),
        "Render pass complete"
    );
    Ok(summary)
}

/// Mean metric value per country; duplicate rows are averaged and absent
/// values ignored
fn country_means(rows: &[DataRow], metric: &MetricDefinition, year: i32) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.year == year) {
        if let Some(value) = metric.extract(row) {
            let entry = sums.entry(row.country.as_str()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(country, (sum, count))| (country.to_string(), sum / count as f64))
        .collect()
}

/// Replace the surface contents with colored country boundaries
pub fn render_polygons<S: RenderSurface + ?Sized>(
    boundaries: &FeatureCollection,
    rows: &[DataRow],
    metric: &MetricDefinition,
    policy: &dyn ColorPolicy,
    year: i32,
    surface: &mut S,
) -> Result<RenderSummary> {
    let means = country_means(rows, metric, year);
    let mut polygons = Vec::new();
    let mut summary = RenderSummary::default();

    for feature in &boundaries.features {
        let Some(country) = feature.properties.name.as_deref() else {
            continue;
        };
        let Some(&value) = means.get(country) else {
            summary.missing_values.push(country.to_string());
            continue;
        };
        polygons.push(RenderablePolygon {
            country: country.to_string(),
            geometry: feature.geometry.clone(),
            color: policy.color_for(value)?,
            tooltip: polygon_tooltip(country, value),
        });
    }

    let drawn: std::collections::BTreeSet<&str> =
        polygons.iter().map(|p| p.country.as_str()).collect();
    summary.missing_coordinates = means
        .keys()
        .filter(|country| !drawn.contains(country.as_str()))
        .cloned()
        .collect();
    summary.drawn = polygons.len();

    surface.clear_markers();
    for polygon in polygons {
        surface.add_polygon(polygon);
    }

    info!(
        operation = "render_polygons",
        metric = %metric.id,
        policy = policy.name(),
        year = year,
        drawn = summary.drawn,
        "Render pass complete"
    );
    Ok(summary)
}

/// Surface that keeps every shape in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    markers: Vec<RenderableMarker>,
    polygons: Vec<RenderablePolygon>,
    clear_count: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[RenderableMarker] {
        &self.markers
    }

    pub fn polygons(&self) -> &[RenderablePolygon] {
        &self.polygons
    }

    /// How many times the surface has been cleared
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }

    pub fn into_markers(self) -> Vec<RenderableMarker> {
        self.markers
    }
}

impl RenderSurface for RecordingSurface {
    fn clear_markers(&mut self) {
        self.markers.clear();
        self.polygons.clear();
        self.clear_count += 1;
    }

    fn add_marker(&mut self, marker: RenderableMarker) {
        self.markers.push(marker);
    }

    fn add_polygon(&mut self, polygon: RenderablePolygon) {
        self.polygons.push(polygon);
    }
}

/// Surface that emits every shape as a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSurface;

impl RenderSurface for LogSurface {
    fn clear_markers(&mut self) {
        debug!("Clearing map layer");
    }

    fn add_marker(&mut self, marker: RenderableMarker) {
        info!(
            country = %marker.country,
            lat = marker.coordinate.latitude,
            lon = marker.coordinate.longitude,
            color = %marker.color,
            "Marker"
        );
    }

    fn add_polygon(&mut self, polygon: RenderablePolygon) {
        info!(
            country = %polygon.country,
            color = %polygon.color,
            tooltip = %polygon.tooltip,
            "Polygon"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{lerp_color, ColorStrategy};
    use crate::metrics::{MetricId, MetricRegistry, GREEN, ORANGE, RED};
    use crate::models::{Feature, FeatureProperties};
    use pretty_assertions::assert_eq;

    fn coordinates() -> CoordinateTable {
        let mut table = CoordinateTable::new();
        table.insert("Finland".to_string(), Coordinate::new(61.92, 25.75));
        table.insert("Chad".to_string(), Coordinate::new(15.45, 18.73));
        table
    }

    fn rows() -> Vec<DataRow> {
        vec![
            DataRow::new("Finland", 2020).with_value("Life Ladder", 7.8),
            DataRow::new("Chad", 2020).with_value("Life Ladder", 2.1),
        ]
    }

    #[test]
    fn test_render_two_markers() {
        let registry = MetricRegistry::builtin().unwrap();
        let metric = registry.lookup("happiness").unwrap();
        let mut surface = RecordingSurface::new();

        let summary = render_markers(
            &rows(),
            &coordinates(),
            metric,
            metric.policy(ColorStrategy::Banded),
            2020,
            &mut surface,
        )
        .unwrap();

        assert_eq!(summary.drawn, 2);
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(surface.markers().len(), 2);
        assert_eq!(surface.markers()[0].country, "Finland");
        assert_eq!(surface.markers()[0].color, GREEN);
        assert_eq!(surface.markers()[1].country, "Chad");
        assert_eq!(surface.markers()[1].color, RED);
        assert_eq!(
            surface.markers()[0].tooltip,
            "<b>Finland</b><br>Year: 2020<br>Happiness Score: 7.8"
        );
    }

    #[test]
    fn test_gradient_markers_interpolate() {
        let registry = MetricRegistry::builtin().unwrap();
        let metric = registry.get(MetricId::Happiness);
        let mut surface = RecordingSurface::new();

        render_markers(
            &rows(),
            &coordinates(),
            metric,
            metric.policy(ColorStrategy::Gradient),
            2020,
            &mut surface,
        )
        .unwrap();

        // 7.8 clamps to the top point; 2.1 sits 70% of the way from 0 to 3
        assert_eq!(surface.markers()[0].color, GREEN);
        assert_eq!(surface.markers()[1].color, lerp_color(RED, ORANGE, 0.7));
    }

    #[test]
    fn test_rows_skipped_for_missing_data() {
        let registry = MetricRegistry::builtin().unwrap();
        let metric = registry.get(MetricId::Corruption);
        let rows = vec![
            DataRow::new("Finland", 2020).with_value("Perceptions of corruption", 0.19),
            DataRow::new("Chad", 2020).with_value("Life Ladder", 2.1),
            DataRow::new("Atlantis", 2020).with_value("Perceptions of corruption", 0.5),
            DataRow::new("Finland", 2019).with_value("Perceptions of corruption", 0.2),
        ];
        let mut surface = RecordingSurface::new();

        let summary = render_markers(
            &rows,
            &coordinates(),
            metric,
            metric.policy(ColorStrategy::Banded),
            2020,
            &mut surface,
        )
        .unwrap();

        assert_eq!(summary.drawn, 1);
        assert_eq!(summary.missing_values, vec!["Chad".to_string()]);
        assert_eq!(summary.missing_coordinates, vec!["Atlantis".to_string()]);
        assert_eq!(surface.markers()[0].color, GREEN);
    }

    #[test]
    fn test_second_pass_replaces_markers() {
        let registry = MetricRegistry::builtin().unwrap();
        let happiness = registry.get(MetricId::Happiness);
        let corruption = registry.get(MetricId::Corruption);
        let rows = vec![DataRow::new("Finland", 2020)
            .with_value("Life Ladder", 0.8)
            .with_value("Perceptions of corruption", 0.8)];
        let mut surface = RecordingSurface::new();

        render_markers(
            &rows,
            &coordinates(),
            happiness,
            happiness.gradient(),
            2020,
            &mut surface,
        )
        .unwrap();
        assert_eq!(surface.markers()[0].color, lerp_red_orange(0.8));

        render_markers(
            &rows,
            &coordinates(),
            corruption,
            corruption.gradient(),
            2020,
            &mut surface,
        )
        .unwrap();
        assert_eq!(surface.clear_count(), 2);
        assert_eq!(surface.markers().len(), 1);
        assert_eq!(surface.markers()[0].color, RED);
    }

    fn lerp_red_orange(value: f64) -> RgbColor {
        lerp_color(RED, ORANGE, value / 3.0)
    }

    #[test]
    fn test_render_polygons_averages_duplicates() {
        let registry = MetricRegistry::builtin().unwrap();
        let metric = registry.get(MetricId::Happiness);
        let rows = vec![
            DataRow::new("Chad", 2020).with_value("Life Ladder", 2.0),
            DataRow::new("Chad", 2020).with_value("Life Ladder", 4.0),
            DataRow::new("Chad", 2020).with_absent("Life Ladder"),
            DataRow::new("Finland", 2020).with_value("Life Ladder", 7.8),
        ];
        let boundaries = FeatureCollection {
            kind: "FeatureCollection".to_string(),
            features: vec![
                Feature {
                    kind: "Feature".to_string(),
                    properties: FeatureProperties {
                        name: Some("Chad".to_string()),
                    },
                    geometry: serde_json::json!({"type": "Polygon", "coordinates": []}),
                },
                Feature {
                    kind: "Feature".to_string(),
                    properties: FeatureProperties {
                        name: Some("Peru".to_string()),
                    },
                    geometry: serde_json::Value::Null,
                },
            ],
        };
        let mut surface = RecordingSurface::new();

        let summary = render_polygons(
            &boundaries,
            &rows,
            metric,
            metric.policy(ColorStrategy::Gradient),
            2020,
            &mut surface,
        )
        .unwrap();

        assert_eq!(summary.drawn, 1);
        assert_eq!(summary.missing_values, vec!["Peru".to_string()]);
        assert_eq!(summary.missing_coordinates, vec!["Finland".to_string()]);
        assert_eq!(surface.clear_count(), 1);
        let chad = &surface.polygons()[0];
        assert_eq!(chad.tooltip, "Chad: 3.00");
        assert_eq!(chad.color, ORANGE);
    }
}

//! Dataset loading.
//!
//! Reads the happiness table (CSV, or a JSON array export of the same rows)
//! and the country coordinates CSV into memory.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{HappyMapError, Result};
use crate::logging::{
    log_data_load_stats, log_operation_end, log_operation_start, log_timed_operation,
};
use crate::models::{Coordinate, CoordinateTable, DataRow, COUNTRY_FIELD, YEAR_FIELD};
use crate::state::{AppState, Dataset};

const LATITUDE_FIELD: &str = "latitude";
const LONGITUDE_FIELD: &str = "longitude";

/// Load both tables named in the configuration and build the application state
pub fn load_dataset(config: Config) -> Result<AppState> {
    let start = Instant::now();
    let table_path = config.data.table_path.clone();
    log_operation_start("data_load", Some(&table_path.display().to_string()));

    let rows = load_table(&table_path)?;
    let coordinates = load_coordinates(&config.data.coordinates_path)?;
    let dataset = Dataset::new(rows, coordinates);

    let years = dataset.years();
    let orphans = dataset.countries_without_coordinates();
    if !orphans.is_empty() {
        warn!(
            count = orphans.len(),
            countries = %orphans.join(", "),
            "Countries in the table have no coordinates and will not be drawn"
        );
    }
    let country_count = dataset
        .rows
        .iter()
        .map(|r| r.country.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    log_data_load_stats(
        &table_path.display().to_string(),
        dataset.rows.len(),
        &years,
        country_count,
        dataset.coordinates.len(),
    );

    let state = AppState::new(config, dataset)?;
    log_operation_end("data_load", start, orphans.is_empty());
    Ok(state)
}

/// Load the happiness table, choosing the format by file extension
pub fn load_table(path: &Path) -> Result<Vec<DataRow>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let file = File::open(path).map_err(|e| HappyMapError::DataNotFound {
        message: format!("Cannot open table {}: {}", path.display(), e),
    })?;
    let reader = BufReader::new(file);

    log_timed_operation("parse_table", || -> Result<Vec<DataRow>> {
        if is_json {
            let rows: Vec<DataRow> = serde_json::from_reader(reader)?;
            Ok(rows)
        } else {
            read_table_csv(reader)
        }
    })
}

/// Parse the happiness table from CSV.
///
/// `year` must be an integer; every other column except the country name is
/// a metric field whose empty or non-numeric cells become absent values.
pub fn read_table_csv<R: Read>(reader: R) -> Result<Vec<DataRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| strip_bom(h).to_string())
        .collect();
    let country_idx = column_index(&headers, COUNTRY_FIELD)?;
    let year_idx = column_index(&headers, YEAR_FIELD)?;

    let mut rows = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record?;
        let country = record.get(country_idx).unwrap_or_default();
        if country.is_empty() {
            warn!(line = line + 2, "Skipping table row without a country name");
            continue;
        }
        let Some(year) = record.get(year_idx).and_then(parse_year) else {
            warn!(line = line + 2, country = country, "Skipping table row with invalid year");
            continue;
        };

        let mut row = DataRow::new(country, year);
        for (i, header) in headers.iter().enumerate() {
            if i == country_idx || i == year_idx {
                continue;
            }
            let value = record.get(i).and_then(|cell| cell.parse::<f64>().ok());
            row.fields.insert(header.clone(), value);
        }
        rows.push(row);
    }

    debug!(row_count = rows.len(), "Parsed happiness table");
    Ok(rows)
}

/// Load the coordinates CSV
pub fn load_coordinates(path: &Path) -> Result<CoordinateTable> {
    let file = File::open(path).map_err(|e| HappyMapError::DataNotFound {
        message: format!("Cannot open coordinates {}: {}", path.display(), e),
    })?;
    read_coordinates_csv(BufReader::new(file))
}

/// Parse `Country name, latitude, longitude` rows. Rows with unparsable
/// coordinates are skipped.
pub fn read_coordinates_csv<R: Read>(reader: R) -> Result<CoordinateTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| strip_bom(h).to_string())
        .collect();
    let country_idx = column_index(&headers, COUNTRY_FIELD)?;
    let lat_idx = column_index(&headers, LATITUDE_FIELD)?;
    let lon_idx = column_index(&headers, LONGITUDE_FIELD)?;

    let mut table = CoordinateTable::new();
    for record in csv_reader.records() {
        let record = record?;
        let country = record.get(country_idx).unwrap_or_default();
        let lat = record.get(lat_idx).and_then(|s| s.parse::<f64>().ok());
        let lon = record.get(lon_idx).and_then(|s| s.parse::<f64>().ok());
        match (country.is_empty(), lat, lon) {
            (false, Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                table.insert(country.to_string(), Coordinate::new(lat, lon));
            }
            _ => warn!(country = country, "Skipping coordinate row with invalid position"),
        }
    }
    Ok(table)
}

fn strip_bom(header: &str) -> &str {
    header.trim_start_matches('\u{feff}')
}

fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| HappyMapError::DataNotFound {
            message: format!("Missing column \"{}\"", name),
        })
}

fn parse_year(cell: &str) -> Option<i32> {
    cell.parse::<i32>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
            .map(|y| y as i32)
    })
}

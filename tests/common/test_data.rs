//! Test data generation utilities.
//!
//! Writes small happiness tables and coordinate files with known values.

use std::io;
use std::path::{Path, PathBuf};

/// Happiness table covering two years; Chad has no corruption value and
/// Atlantis has no coordinates.
pub const TABLE_CSV: &str = "Country name,year,Life Ladder,Log GDP per capita,Perceptions of corruption\n\
Finland,2020,7.8,10.8,0.19\n\
Chad,2020,2.1,7.4,\n\
Atlantis,2020,6.0,9.0,0.5\n\
Finland,2021,7.7,10.9,0.18\n\
Chad,2021,4.3,7.3,0.8\n";

/// Coordinates for Finland and Chad
pub const COORDINATES_CSV: &str = "Country name,latitude,longitude\n\
Finland,61.92411,25.748151\n\
Chad,15.454166,18.732207\n";

/// Write the fixture files into `dir`, returning (table, coordinates) paths.
pub fn write_fixtures(dir: &Path) -> io::Result<(PathBuf, PathBuf)> {
    let table = dir.join("world-happiness-table.csv");
    let coordinates = dir.join("country-coordinates.csv");
    std::fs::write(&table, TABLE_CSV)?;
    std::fs::write(&coordinates, COORDINATES_CSV)?;
    Ok((table, coordinates))
}

/// Build a configuration that points at the fixture files
pub fn fixture_config(dir: &Path) -> io::Result<happymap::Config> {
    let (table, coordinates) = write_fixtures(dir)?;
    let mut config = happymap::Config::default();
    config.data.table_path = table;
    config.data.coordinates_path = coordinates;
    Ok(config)
}

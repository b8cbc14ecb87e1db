//! File-backed district registry and weight record source.

use std::fs;
use std::path::Path;

use kipper_core::model::{DistrictName, WeightRecord};
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
/// Failure while loading one of the data files.
pub enum DataError {
    /// Reading the district registry failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The district registry is not a JSON array of names.
    #[error("Malformed district registry: {0}")]
    Districts(#[from] serde_json::Error),
    /// The bin data CSV could not be read or parsed.
    #[error("Malformed weight records: {0}")]
    Records(#[from] csv::Error),
}

/// Load the ordered district registry from a JSON array of names.
///
/// # Errors
///
/// Returns a [`DataError`] when the file is unreadable or not a JSON array
/// of strings.
pub fn load_districts(path: &Path) -> Result<Vec<DistrictName>, DataError> {
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let names: Vec<String> = serde_json::from_str(&raw)?;
    Ok(names.into_iter().map(DistrictName).collect())
}

/// One row of the bin data CSV, headers as produced by the weighbridge export.
#[derive(Debug, Deserialize)]
struct BinDataRow {
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Weight (kg)")]
    weight: String,
}

/// Load weight records wholesale.
///
/// An empty or unparseable weight cell survives loading as a missing value;
/// the aggregator decides whether that is fatal (it is, for records on the
/// selected date).
///
/// # Errors
///
/// Returns a [`DataError`] when the file is unreadable or rows do not match
/// the expected headers.
pub fn load_weight_records(path: &Path) -> Result<Vec<WeightRecord>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for row in reader.deserialize::<BinDataRow>() {
        let row = row?;
        let weight_kg = row.weight.trim().parse::<f64>().ok();
        records.push(WeightRecord {
            district: DistrictName(row.location),
            timestamp: row.timestamp,
            weight_kg,
        });
    }

    Ok(records)
}

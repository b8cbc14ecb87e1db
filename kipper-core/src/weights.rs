//! Weight aggregation for bin records on a selected date.

use std::collections::BTreeMap;

use crate::model::{DistrictName, WeightRecord};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Data-quality failure while aggregating weight records.
pub enum WeightError {
    /// A record that matched the selected date carries no usable weight value.
    #[error("Record for {district} at {timestamp} has a missing or malformed weight")]
    MalformedWeight {
        /// District the offending record belongs to.
        district: String,
        /// Timestamp of the offending record.
        timestamp: String,
    },
}

/// Sum recorded weights per district of interest for the selected date.
///
/// A record counts when its timestamp string starts with `selected_date`;
/// callers must pass the date in the same format the timestamp field uses
/// (e.g. `2024-01-01` against `2024-01-01T10:00`). Districts with no
/// matching record map to `0.0`. Records for districts outside the set of
/// interest are ignored.
///
/// # Errors
///
/// Returns [`WeightError::MalformedWeight`] when an included record has no
/// usable weight value. The whole aggregation fails rather than producing a
/// silently wrong sum.
pub fn aggregate_weights(
    records: &[WeightRecord],
    districts: &[DistrictName],
    selected_date: &str,
) -> Result<BTreeMap<DistrictName, f64>, WeightError> {
    let mut totals: BTreeMap<DistrictName, f64> = districts
        .iter()
        .map(|district| (district.clone(), 0.0))
        .collect();

    for record in records {
        if !record.timestamp.starts_with(selected_date) {
            continue;
        }
        let Some(total) = totals.get_mut(&record.district) else {
            continue;
        };
        let weight = record.weight_kg.ok_or_else(|| WeightError::MalformedWeight {
            district: record.district.to_string(),
            timestamp: record.timestamp.clone(),
        })?;
        *total += weight;
    }

    Ok(totals)
}

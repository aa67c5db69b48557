//! CSV ingestion of market price series.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::info;

use crate::error::SimError;

use super::series::PriceSeries;

/// Accepted timestamp layouts in price CSVs.
const TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Deserialize)]
struct PriceRow {
    time: String,
    price_eur_mwh: f32,
}

/// Loads a `time,price_eur_mwh` CSV into a sorted [`PriceSeries`].
///
/// # Errors
///
/// Returns a `SimError` when the file cannot be read, a row fails to parse,
/// or the file contains no rows.
pub fn load_price_series(path: &Path) -> Result<PriceSeries, SimError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for (i, row) in reader.deserialize::<PriceRow>().enumerate() {
        let row = row?;
        let time = parse_time(&row.time).ok_or_else(|| {
            SimError::MarketData(format!(
                "{}: row {}: \"{}\" is not a valid timestamp",
                path.display(),
                i + 1,
                row.time
            ))
        })?;
        points.push((time, row.price_eur_mwh));
    }
    if points.is_empty() {
        return Err(SimError::MarketData(format!(
            "{}: no price rows",
            path.display()
        )));
    }
    info!(path = %path.display(), rows = points.len(), "loaded price series");
    Ok(PriceSeries::new(points))
}

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

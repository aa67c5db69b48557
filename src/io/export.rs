//! CSV and JSON export of the baseline and optimized result tables.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SimError;
use crate::sim::types::{BaselineSlot, SlotAllocation};

/// Column header for the optimized 15-minute table.
const OPTIMIZED_HEADER: &str = "time,price_dam,price_idm_15,price_idm_60,price_idm_best,\
                                total_kw,dam_kw,idm_15_kw,idm_60_kw,\
                                vehicles_total,vehicles_dam,vehicles_idm,\
                                cost_dam_eur,cost_idm_15_eur,cost_idm_60_eur";

/// Column header for the baseline hourly table.
const BASELINE_HEADER: &str = "time,price_dam,total_kw,vehicles,cost_eur";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Output serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parses a `--format` argument value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Writes `baseline_results` and `optimized_results` files into `dir`.
///
/// The directory is created if missing. Returns the two written paths.
///
/// # Errors
///
/// Returns a `SimError` when the directory or either file cannot be written.
pub fn export_results(
    dir: &Path,
    format: ExportFormat,
    optimized: &[SlotAllocation],
    baseline: &[BaselineSlot],
) -> Result<(PathBuf, PathBuf), SimError> {
    fs::create_dir_all(dir)?;

    let baseline_path = dir.join(format!("baseline_results.{}", format.extension()));
    let optimized_path = dir.join(format!("optimized_results.{}", format.extension()));

    match format {
        ExportFormat::Csv => {
            write_baseline_csv(baseline, io::BufWriter::new(File::create(&baseline_path)?))?;
            write_optimized_csv(optimized, io::BufWriter::new(File::create(&optimized_path)?))?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(
                io::BufWriter::new(File::create(&baseline_path)?),
                baseline,
            )?;
            serde_json::to_writer_pretty(
                io::BufWriter::new(File::create(&optimized_path)?),
                optimized,
            )?;
        }
    }

    info!(
        baseline = %baseline_path.display(),
        optimized = %optimized_path.display(),
        "exported result tables"
    );
    Ok((baseline_path, optimized_path))
}

/// Writes the optimized table as CSV to any writer.
pub fn write_optimized_csv(rows: &[SlotAllocation], writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(OPTIMIZED_HEADER.split(',').map(str::trim))?;
    for r in rows {
        wtr.write_record(&[
            r.time.format(TIME_FORMAT).to_string(),
            format!("{:.2}", r.price_dam),
            format!("{:.2}", r.price_idm_15),
            format!("{:.2}", r.price_idm_60),
            format!("{:.2}", r.price_idm_best),
            format!("{:.4}", r.total_kw),
            format!("{:.4}", r.dam_kw),
            format!("{:.4}", r.idm_15_kw),
            format!("{:.4}", r.idm_60_kw),
            r.vehicles_total.to_string(),
            r.vehicles_dam.to_string(),
            r.vehicles_idm.to_string(),
            format!("{:.4}", r.cost_dam_eur),
            format!("{:.4}", r.cost_idm_15_eur),
            format!("{:.4}", r.cost_idm_60_eur),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the baseline table as CSV to any writer.
pub fn write_baseline_csv(rows: &[BaselineSlot], writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(BASELINE_HEADER.split(',').map(str::trim))?;
    for r in rows {
        wtr.write_record(&[
            r.time.format(TIME_FORMAT).to_string(),
            format!("{:.2}", r.price_dam),
            format!("{:.4}", r.total_kw),
            r.vehicles.to_string(),
            format!("{:.4}", r.cost_eur),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

//! Result-table export.

pub mod export;

pub use export::{ExportFormat, export_results};

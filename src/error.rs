//! Error taxonomy: configuration errors abort a run, everything else is
//! recovered locally and surfaced through summary counters.

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"fleet.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top-level simulator error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Missing or malformed market data file. Per-timestamp gaps inside a
    /// loaded series are not errors; they resolve to fallback prices.
    #[error("market data: {0}")]
    MarketData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("json export: {0}")]
    Json(#[from] serde_json::Error),
}

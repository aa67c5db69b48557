//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::ConfigError;

/// Accepted datetime layouts for `simulation.start`.
const START_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the reference scenario (30-vehicle
/// fleet, one week starting 2024-08-19, 5% DAM pre-allocation). Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::default_scenario`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation horizon and allocation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Fleet size and per-vehicle parameters.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Market data sources and trading constraints.
    #[serde(default)]
    pub market: MarketConfig,
}

/// Simulation horizon and allocation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Horizon start, ISO-8601 local datetime string.
    pub start: String,
    /// Number of days to simulate (must be > 0).
    pub days: u32,
    /// Master random seed.
    pub seed: u64,
    /// Fraction of slot demand nominally reserved for DAM (0.0-1.0).
    pub dam_allocation: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: "2024-08-19T00:00:00".to_string(),
            days: 7,
            seed: 42,
            dam_allocation: 0.05,
        }
    }
}

/// Fleet size and per-vehicle parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of vehicles in the fleet (must be > 0).
    pub size: u32,
    /// Battery capacity per vehicle (kWh).
    pub capacity_kwh: f32,
    /// Minimum charging power per vehicle (kW).
    pub min_charge_kw: f32,
    /// Maximum charging power per vehicle (kW).
    pub max_charge_kw: f32,
    /// State of charge every vehicle must reach before departure (0.0-1.0).
    pub target_soc: f32,
    /// Restrict vehicle movement to Monday-Friday.
    pub workdays_only: bool,
    /// Arrival/departure/SOC distributions: `"commuter"` or `"uniform"`.
    pub pmf: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            size: 30,
            capacity_kwh: 47.0,
            min_charge_kw: 1.5,
            max_charge_kw: 11.0,
            target_soc: 0.9,
            workdays_only: true,
            pmf: "commuter".to_string(),
        }
    }
}

/// Market data sources and trading constraints.
///
/// When the CSV paths are unset, seeded synthetic price curves covering the
/// simulation horizon are generated instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// DAM hourly price series CSV (`time,price_eur_mwh`).
    pub dam_csv: Option<String>,
    /// IDM 15-minute price series CSV.
    pub idm_15_csv: Option<String>,
    /// IDM 60-minute price series CSV.
    pub idm_60_csv: Option<String>,
    /// Price used when a lookup finds no data at all (EUR/MWh).
    pub fallback_price_eur_mwh: f32,
    /// IDM minimum block / step size (kW).
    pub idm_step_kw: f32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            dam_csv: None,
            idm_15_csv: None,
            idm_60_csv: None,
            fallback_price_eur_mwh: 50.0,
            idm_step_kw: 100.0,
        }
    }
}

impl ScenarioConfig {
    /// Returns the reference scenario (original study defaults).
    pub fn default_scenario() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            fleet: FleetConfig::default(),
            market: MarketConfig::default(),
        }
    }

    /// Returns the single-day smoke-test preset: small fleet, uniform PMFs,
    /// no weekday restriction.
    pub fn single_day() -> Self {
        Self {
            simulation: SimulationConfig {
                days: 1,
                ..SimulationConfig::default()
            },
            fleet: FleetConfig {
                size: 10,
                workdays_only: false,
                pmf: "uniform".to_string(),
                ..FleetConfig::default()
            },
            market: MarketConfig::default(),
        }
    }

    /// Returns the large-fleet preset: enough aggregate demand that the
    /// 100 kW IDM step is regularly exceeded.
    pub fn large_fleet() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            fleet: FleetConfig {
                size: 120,
                ..FleetConfig::default()
            },
            market: MarketConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "single_day", "large_fleet"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default_scenario()),
            "single_day" => Ok(Self::single_day()),
            "large_fleet" => Ok(Self::large_fleet()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                "scenario",
                format!("cannot read \"{}\": {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Parses `simulation.start` into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the string matches none of the accepted
    /// layouts.
    pub fn start_time(&self) -> Result<NaiveDateTime, ConfigError> {
        parse_start(&self.simulation.start)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if parse_start(&s.start).is_err() {
            errors.push(ConfigError::new(
                "simulation.start",
                format!("\"{}\" is not a valid datetime", s.start),
            ));
        }
        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&s.dam_allocation) {
            errors.push(ConfigError::new(
                "simulation.dam_allocation",
                "must be in [0.0, 1.0]",
            ));
        }

        let f = &self.fleet;
        if f.size == 0 {
            errors.push(ConfigError::new("fleet.size", "must be > 0"));
        }
        if f.capacity_kwh <= 0.0 {
            errors.push(ConfigError::new("fleet.capacity_kwh", "must be > 0"));
        }
        if f.min_charge_kw < 0.0 || f.max_charge_kw <= 0.0 || f.min_charge_kw > f.max_charge_kw {
            errors.push(ConfigError::new(
                "fleet.min_charge_kw",
                "requires 0 <= min_charge_kw <= max_charge_kw and max_charge_kw > 0",
            ));
        }
        if !(f.target_soc > 0.0 && f.target_soc <= 1.0) {
            errors.push(ConfigError::new("fleet.target_soc", "must be in (0.0, 1.0]"));
        }
        if f.pmf != "commuter" && f.pmf != "uniform" {
            errors.push(ConfigError::new(
                "fleet.pmf",
                format!("must be \"commuter\" or \"uniform\", got \"{}\"", f.pmf),
            ));
        }

        let m = &self.market;
        if m.idm_step_kw <= 0.0 {
            errors.push(ConfigError::new("market.idm_step_kw", "must be > 0"));
        }
        if m.fallback_price_eur_mwh < 0.0 {
            errors.push(ConfigError::new(
                "market.fallback_price_eur_mwh",
                "must be >= 0",
            ));
        }

        errors
    }
}

fn parse_start(s: &str) -> Result<NaiveDateTime, ConfigError> {
    for fmt in START_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    Err(ConfigError::new(
        "simulation.start",
        format!("\"{s}\" is not a valid datetime"),
    ))
}

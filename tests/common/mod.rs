//! Shared test fixtures for integration tests.

use fleetsim::config::ScenarioConfig;
use fleetsim::runner::{RunResult, run_scenario};

/// Loads a built-in preset, validates it, and runs both strategies.
pub fn run_preset(name: &str) -> RunResult {
    let cfg = ScenarioConfig::from_preset(name).expect("known preset");
    assert!(cfg.validate().is_empty(), "preset {name} should validate");
    run_scenario(&cfg).expect("scenario should run")
}

//! Integration tests across the built-in presets and strategy isolation.

mod common;

use chrono::NaiveDate;
use fleetsim::config::ScenarioConfig;
use fleetsim::fleet::FleetGenerator;
use fleetsim::market::{MarketData, synthetic};
use fleetsim::sim::{SimConfig, run_baseline, run_optimized};

#[test]
fn every_preset_runs() {
    for name in ScenarioConfig::PRESETS {
        let result = common::run_preset(name);
        assert!(
            !result.optimized.fleet.vehicles.is_empty(),
            "preset {name} generated an empty fleet"
        );
        assert!(result.summary.baseline_cost_eur > 0.0);
        assert!(result.summary.optimized_cost_eur > 0.0);
    }
}

#[test]
fn single_day_covers_one_day() {
    let result = common::run_preset("single_day");
    assert_eq!(result.optimized.rows.len(), 96);
    assert_eq!(result.baseline.rows.len(), 24);
}

#[test]
fn large_fleet_trades_on_idm() {
    let result = common::run_preset("large_fleet");
    let s = &result.summary;
    let idm_energy = s.idm_15.energy_kwh + s.idm_60.energy_kwh;
    assert!(
        idm_energy > 0.0,
        "120 vehicles should exceed the 100 kW block at least once"
    );
    assert!(s.slots_on_idm_15 + s.slots_on_idm_60 > 0);
}

#[test]
fn strategy_order_does_not_matter() {
    let cfg = ScenarioConfig::single_day();
    let start = NaiveDate::from_ymd_opt(2024, 8, 19)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid datetime");
    let sim_config = SimConfig {
        start,
        days: 1,
        dam_allocation: cfg.simulation.dam_allocation,
        idm_step_kw: cfg.market.idm_step_kw,
    };
    let market = MarketData {
        dam: synthetic::dam_series(start, 1, 42),
        idm_15: synthetic::idm_15_series(start, 1, 42),
        idm_60: synthetic::idm_60_series(start, 1, 42),
        fallback_price_eur_mwh: 50.0,
    };
    let mut generator = FleetGenerator::from_config(&cfg.fleet, 42).expect("generator");
    let fleet = generator.generate(start, 1);

    let baseline_first = run_baseline(fleet.clone(), &sim_config, &market);
    let _optimized = run_optimized(fleet.clone(), &sim_config, &market);
    let baseline_second = run_baseline(fleet, &sim_config, &market);

    let cost = |rows: &[fleetsim::sim::BaselineSlot]| {
        rows.iter().map(|r| r.cost_eur).sum::<f32>()
    };
    assert_eq!(cost(&baseline_first.rows), cost(&baseline_second.rows));
    for (a, b) in baseline_first
        .fleet
        .vehicles
        .iter()
        .zip(&baseline_second.fleet.vehicles)
    {
        assert_eq!(a.current_soc, b.current_soc);
        assert_eq!(a.charging_schedule.len(), b.charging_schedule.len());
    }
}

#[test]
fn seed_override_changes_outcome() {
    let mut cfg = ScenarioConfig::single_day();
    let a = fleetsim::runner::run_scenario(&cfg).expect("run a");
    cfg.simulation.seed = 1234;
    let b = fleetsim::runner::run_scenario(&cfg).expect("run b");
    assert_ne!(
        a.summary.baseline_cost_eur,
        b.summary.baseline_cost_eur
    );
}

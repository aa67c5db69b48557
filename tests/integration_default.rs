//! Integration tests for the default scenario (30 vehicles, one week).

mod common;

use fleetsim::io::export::{write_baseline_csv, write_optimized_csv};

#[test]
fn full_run_produces_correct_row_counts() {
    let result = common::run_preset("default");
    // 7 days of 96 quarter-hour slots and 24 hours.
    assert_eq!(result.optimized.rows.len(), 7 * 96);
    assert_eq!(result.baseline.rows.len(), 7 * 24);
}

#[test]
fn energy_conservation_every_slot() {
    let result = common::run_preset("default");
    for row in &result.optimized.rows {
        let allocated = row.dam_kw + row.idm_15_kw + row.idm_60_kw;
        assert!(
            (allocated - row.total_kw).abs() < 1e-2,
            "slot {} allocates {} of {} kW",
            row.time,
            allocated,
            row.total_kw
        );
    }
}

#[test]
fn idm_power_is_whole_blocks_every_slot() {
    let result = common::run_preset("default");
    for row in &result.optimized.rows {
        for idm in [row.idm_15_kw, row.idm_60_kw] {
            if idm > 0.0 {
                let remainder = idm % 100.0;
                assert!(
                    remainder < 1e-2 || remainder > 100.0 - 1e-2,
                    "slot {} has off-block IDM power {idm}",
                    row.time
                );
            }
        }
    }
}

#[test]
fn schedules_stay_inside_stay_windows() {
    let result = common::run_preset("default");
    for fleet in [&result.optimized.fleet, &result.baseline.fleet] {
        for v in &fleet.vehicles {
            for t in v.charging_schedule.keys() {
                assert!(
                    *t >= v.arrival_time && *t < v.departure_time,
                    "vehicle {} scheduled at {} outside [{}, {})",
                    v.id,
                    t,
                    v.arrival_time,
                    v.departure_time
                );
            }
        }
    }
}

#[test]
fn soc_bounded_by_target() {
    let result = common::run_preset("default");
    for v in &result.optimized.fleet.vehicles {
        assert!(v.current_soc >= v.return_soc - 1e-4);
        assert!(
            v.current_soc <= v.target_soc + 1e-3,
            "vehicle {} overshot target: {} > {}",
            v.id,
            v.current_soc,
            v.target_soc
        );
    }
}

#[test]
fn determinism_two_identical_runs_produce_identical_exports() {
    let a = common::run_preset("default");
    let b = common::run_preset("default");

    let mut opt_a = Vec::new();
    let mut opt_b = Vec::new();
    write_optimized_csv(&a.optimized.rows, &mut opt_a).expect("export a");
    write_optimized_csv(&b.optimized.rows, &mut opt_b).expect("export b");
    assert_eq!(opt_a, opt_b);

    let mut base_a = Vec::new();
    let mut base_b = Vec::new();
    write_baseline_csv(&a.baseline.rows, &mut base_a).expect("export a");
    write_baseline_csv(&b.baseline.rows, &mut base_b).expect("export b");
    assert_eq!(base_a, base_b);
}

#[test]
fn summary_is_internally_consistent() {
    let result = common::run_preset("default");
    let s = &result.summary;
    assert!(
        (s.savings_eur - (s.baseline_cost_eur - s.optimized_cost_eur)).abs() < 1e-3
    );
    let per_source = s.dam.cost_eur + s.idm_15.cost_eur + s.idm_60.cost_eur;
    assert!((per_source - s.optimized_cost_eur).abs() < 1e-2);
    assert!(s.optimized_avg_price.is_finite());
    assert!(s.baseline_avg_price.is_finite());
    assert!(s.avg_departure_soc > 0.0 && s.avg_departure_soc <= 1.0);
    assert_eq!(s.vehicles as usize, result.optimized.fleet.vehicles.len());
    // Both strategies procure the same total energy for the same fleet.
    assert!((s.optimized_energy_kwh - s.baseline_energy_kwh).abs() < 1.0);
}

#[test]
fn default_scenario_generates_no_weekend_days() {
    // The default scenario starts Monday 2024-08-19 with workdays_only set,
    // so day indices 5 and 6 (the weekend) must be empty.
    let result = common::run_preset("default");
    for v in &result.optimized.fleet.vehicles {
        if let Some(day) = v.day {
            assert!(day < 5, "vehicle {} generated on weekend day {day}", v.id);
        }
    }
}

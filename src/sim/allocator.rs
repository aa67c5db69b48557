//! Two-phase fleet-level market allocation.
//!
//! Per slot: reserve a DAM fraction of the aggregate demand, round the IDM
//! remainder down to whole tradable blocks, return the rounding remainder to
//! DAM, then redistribute both shares to vehicles proportionally to their
//! projected demand. Rounding happens once at fleet level, so no energy is
//! lost to per-vehicle block truncation.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::fleet::{ChargeRecord, Fleet, IdmMarket};
use crate::market::{MarketData, SlotPrices};

use super::cost::slot_cost;
use super::demand;
use super::types::{SLOT_HOURS, SimConfig, SlotAllocation};

const KW_EPSILON: f32 = 1e-6;

/// Output of one optimized-strategy pass.
#[derive(Debug, Clone)]
pub struct OptimizedResult {
    /// One row per 15-minute slot, zero-demand slots included.
    pub rows: Vec<SlotAllocation>,
    /// Fleet state after the pass (final SOC, filled schedules).
    pub fleet: Fleet,
    /// Slots where at least one price lookup was degraded.
    pub degraded_slots: u32,
}

/// Runs the optimized DAM/IDM strategy over the whole horizon.
///
/// Takes ownership of a fleet snapshot and returns it with final state, so
/// callers can never leak mutated state between strategy runs.
pub fn run_optimized(mut fleet: Fleet, cfg: &SimConfig, market: &MarketData) -> OptimizedResult {
    fleet.reset_states();

    let grid: Vec<(NaiveDateTime, SlotPrices)> = cfg
        .slots()
        .into_iter()
        .map(|t| (t, market.slot_prices(t)))
        .collect();
    let degraded_slots = grid.iter().filter(|(_, p)| p.degraded).count() as u32;

    let slot_demand = demand::project(&fleet, &grid);
    debug!(
        slots = grid.len(),
        active_slots = slot_demand.len(),
        "demand projection complete"
    );

    let mut rows = Vec::with_capacity(grid.len());
    for (slot, prices) in grid {
        let Some(demand) = slot_demand.get(&slot).filter(|d| d.total_kw > 0.0) else {
            rows.push(zero_row(slot, &prices));
            continue;
        };
        let total_kw = demand.total_kw;

        let dam_target = total_kw * cfg.dam_allocation;
        let idm_target = total_kw - dam_target;
        // Whole blocks only; the remainder goes back to DAM so the slot's
        // energy is conserved exactly.
        let idm_kw = (idm_target / cfg.idm_step_kw).floor() * cfg.idm_step_kw;
        let dam_kw = total_kw - idm_kw;

        let (idm_price, idm_market) = prices.best_idm();

        let mut vehicles_dam = 0;
        let mut vehicles_idm = 0;
        for &(idx, kw) in &demand.entries {
            let share = kw / total_kw;
            let v_dam = dam_kw * share;
            let v_idm = idm_kw * share;
            let record = if v_idm <= KW_EPSILON {
                ChargeRecord::DamOnly { kw: v_dam }
            } else if v_dam <= KW_EPSILON {
                ChargeRecord::IdmOnly {
                    kw: v_idm,
                    market: idm_market,
                }
            } else {
                ChargeRecord::Mixed {
                    kw_dam: v_dam,
                    kw_idm: v_idm,
                    market: idm_market,
                }
            };
            if v_dam > KW_EPSILON {
                vehicles_dam += 1;
            }
            if v_idm > KW_EPSILON {
                vehicles_idm += 1;
            }

            let vehicle = &mut fleet.vehicles[idx];
            vehicle.charging_schedule.insert(slot, record);
            vehicle.current_soc += (v_dam + v_idm) * SLOT_HOURS / vehicle.capacity_kwh;
        }

        let (idm_15_kw, idm_60_kw) = match idm_market {
            IdmMarket::Min15 => (idm_kw, 0.0),
            IdmMarket::Min60 => (0.0, idm_kw),
        };
        rows.push(SlotAllocation {
            time: slot,
            price_dam: prices.dam,
            price_idm_15: prices.idm_15,
            price_idm_60: prices.idm_60,
            price_idm_best: idm_price,
            total_kw,
            dam_kw,
            idm_15_kw,
            idm_60_kw,
            vehicles_total: demand.entries.len() as u32,
            vehicles_dam,
            vehicles_idm,
            cost_dam_eur: slot_cost(dam_kw, prices.dam, SLOT_HOURS),
            cost_idm_15_eur: slot_cost(idm_15_kw, idm_price, SLOT_HOURS),
            cost_idm_60_eur: slot_cost(idm_60_kw, idm_price, SLOT_HOURS),
        });
    }

    let total_cost: f32 = rows.iter().map(SlotAllocation::cost_eur).sum();
    info!(
        degraded_slots,
        total_cost_eur = total_cost,
        "optimized strategy pass complete"
    );

    OptimizedResult {
        rows,
        fleet,
        degraded_slots,
    }
}

fn zero_row(time: NaiveDateTime, prices: &SlotPrices) -> SlotAllocation {
    SlotAllocation {
        time,
        price_dam: prices.dam,
        price_idm_15: prices.idm_15,
        price_idm_60: prices.idm_60,
        price_idm_best: prices.best_idm().0,
        total_kw: 0.0,
        dam_kw: 0.0,
        idm_15_kw: 0.0,
        idm_60_kw: 0.0,
        vehicles_total: 0,
        vehicles_dam: 0,
        vehicles_idm: 0,
        cost_dam_eur: 0.0,
        cost_idm_15_eur: 0.0,
        cost_idm_60_eur: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::vehicle::test_vehicle;
    use crate::market::PriceSeries;
    use chrono::{Duration, NaiveDate};

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 19)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid test datetime")
    }

    fn flat_market(dam: f32, idm_15: f32, idm_60: f32) -> MarketData {
        let hours: Vec<_> = (0..24).map(|h| (dt(h, 0), dam)).collect();
        let quarters: Vec<_> = (0..96)
            .map(|i| (dt(0, 0) + Duration::minutes(15 * i), idm_15))
            .collect();
        MarketData {
            dam: PriceSeries::new(hours.clone()),
            idm_15: PriceSeries::new(quarters),
            idm_60: PriceSeries::new(hours.into_iter().map(|(t, _)| (t, idm_60)).collect()),
            fallback_price_eur_mwh: 50.0,
        }
    }

    fn config(dam_allocation: f32) -> SimConfig {
        SimConfig {
            start: dt(0, 0),
            days: 1,
            dam_allocation,
            idm_step_kw: 100.0,
        }
    }

    /// One slot of demand: vehicle windows span exactly [10:00, 10:15).
    fn single_slot_fleet(kws: &[f32]) -> Fleet {
        Fleet::new(
            kws.iter()
                .enumerate()
                .map(|(i, &kw)| {
                    // Need exceeds one slot's energy so the full kW is projected.
                    test_vehicle(
                        &format!("v{i}"),
                        dt(10, 0),
                        dt(10, 15),
                        0.0,
                        0.9,
                        1000.0,
                        kw,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn sub_block_demand_goes_entirely_to_dam() {
        // 110 kW at 50% DAM reserve: idm_target 55 rounds down to 0.
        let result = run_optimized(
            single_slot_fleet(&[50.0, 60.0]),
            &config(0.5),
            &flat_market(80.0, 70.0, 75.0),
        );
        let row = result
            .rows
            .iter()
            .find(|r| r.time == dt(10, 0))
            .expect("slot row");
        assert!((row.total_kw - 110.0).abs() < 1e-3);
        assert!((row.dam_kw - 110.0).abs() < 1e-3);
        assert_eq!(row.idm_15_kw, 0.0);
        assert_eq!(row.idm_60_kw, 0.0);
        for v in &result.fleet.vehicles {
            assert!(matches!(
                v.charging_schedule.get(&dt(10, 0)),
                Some(ChargeRecord::DamOnly { .. })
            ));
        }
    }

    #[test]
    fn block_rounding_returns_remainder_to_dam() {
        // 250 kW at 50% DAM reserve: idm_target 125 rounds to 100, DAM 150.
        let result = run_optimized(
            single_slot_fleet(&[50.0, 60.0, 140.0]),
            &config(0.5),
            &flat_market(80.0, 70.0, 75.0),
        );
        let row = result
            .rows
            .iter()
            .find(|r| r.time == dt(10, 0))
            .expect("slot row");
        assert!((row.dam_kw - 150.0).abs() < 1e-3);
        assert!((row.idm_15_kw - 100.0).abs() < 1e-3);

        // Proportional split: 50/250 share gets dam 30 / idm 20, 60/250 gets 36 / 24.
        let v0 = &result.fleet.vehicles[0].charging_schedule[&dt(10, 0)];
        match *v0 {
            ChargeRecord::Mixed { kw_dam, kw_idm, .. } => {
                assert!((kw_dam - 30.0).abs() < 1e-3);
                assert!((kw_idm - 20.0).abs() < 1e-3);
            }
            ref other => panic!("expected mixed record, got {other:?}"),
        }
        let v1 = &result.fleet.vehicles[1].charging_schedule[&dt(10, 0)];
        match *v1 {
            ChargeRecord::Mixed { kw_dam, kw_idm, .. } => {
                assert!((kw_dam - 36.0).abs() < 1e-3);
                assert!((kw_idm - 24.0).abs() < 1e-3);
            }
            ref other => panic!("expected mixed record, got {other:?}"),
        }
    }

    #[test]
    fn energy_conserved_per_slot() {
        let result = run_optimized(
            single_slot_fleet(&[50.0, 60.0, 140.0]),
            &config(0.05),
            &flat_market(80.0, 70.0, 75.0),
        );
        for row in &result.rows {
            let allocated = row.dam_kw + row.idm_15_kw + row.idm_60_kw;
            assert!(
                (allocated - row.total_kw).abs() < 1e-3,
                "slot {} leaks energy",
                row.time
            );
        }
    }

    #[test]
    fn idm_power_is_whole_blocks() {
        let result = run_optimized(
            single_slot_fleet(&[130.0, 145.0, 95.0]),
            &config(0.05),
            &flat_market(80.0, 70.0, 75.0),
        );
        for row in &result.rows {
            for idm in [row.idm_15_kw, row.idm_60_kw] {
                if idm > 0.0 {
                    assert!((idm % 100.0).abs() < 1e-3, "slot {} off-block", row.time);
                }
            }
        }
    }

    #[test]
    fn cheaper_idm_market_wins_tie_to_quarter_hour() {
        let result = run_optimized(
            single_slot_fleet(&[200.0]),
            &config(0.05),
            &flat_market(80.0, 75.0, 70.0),
        );
        let row = result
            .rows
            .iter()
            .find(|r| r.total_kw > 0.0)
            .expect("active slot");
        assert_eq!(row.idm_15_kw, 0.0);
        assert!(row.idm_60_kw > 0.0);

        let tie = run_optimized(
            single_slot_fleet(&[200.0]),
            &config(0.05),
            &flat_market(80.0, 70.0, 70.0),
        );
        let row = tie
            .rows
            .iter()
            .find(|r| r.total_kw > 0.0)
            .expect("active slot");
        assert!(row.idm_15_kw > 0.0);
        assert_eq!(row.idm_60_kw, 0.0);
    }

    #[test]
    fn soc_never_exceeds_target() {
        let fleet = Fleet::new(vec![test_vehicle(
            "a",
            dt(8, 0),
            dt(20, 0),
            0.2,
            0.9,
            47.0,
            11.0,
        )]);
        let result = run_optimized(fleet, &config(0.05), &flat_market(80.0, 70.0, 75.0));
        let v = &result.fleet.vehicles[0];
        assert!(v.current_soc <= v.target_soc + 1e-4);
        assert!(v.reached_target());
    }

    #[test]
    fn no_schedule_outside_stay_window() {
        let fleet = single_slot_fleet(&[50.0, 60.0]);
        let result = run_optimized(fleet, &config(0.05), &flat_market(80.0, 70.0, 75.0));
        for v in &result.fleet.vehicles {
            for t in v.charging_schedule.keys() {
                assert!(*t >= v.arrival_time && *t < v.departure_time);
            }
        }
    }

    #[test]
    fn zero_demand_slots_emit_zero_rows() {
        let result = run_optimized(
            single_slot_fleet(&[50.0]),
            &config(0.05),
            &flat_market(80.0, 70.0, 75.0),
        );
        assert_eq!(result.rows.len(), 96);
        let idle = result
            .rows
            .iter()
            .find(|r| r.time == dt(0, 0))
            .expect("idle slot");
        assert_eq!(idle.total_kw, 0.0);
        assert_eq!(idle.cost_eur(), 0.0);
    }

    #[test]
    fn allocation_fraction_approached_at_scale() {
        // 10 MW demand dwarfs the 100 kW step, so idm/total approaches 95%.
        let result = run_optimized(
            single_slot_fleet(&[10_000.0]),
            &config(0.05),
            &flat_market(80.0, 70.0, 75.0),
        );
        let row = result
            .rows
            .iter()
            .find(|r| r.total_kw > 0.0)
            .expect("active slot");
        let idm_fraction = row.idm_kw() / row.total_kw;
        assert!((idm_fraction - 0.95).abs() < 0.01);
    }
}

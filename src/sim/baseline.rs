//! DAM-only baseline strategy on an hourly grid.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::info;

use crate::fleet::{ChargeRecord, Fleet};
use crate::market::MarketData;

use super::cost::slot_cost;
use super::types::{BaselineSlot, SimConfig};

const HOUR_HOURS: f32 = 1.0;

/// Output of one baseline pass.
#[derive(Debug, Clone)]
pub struct BaselineResult {
    /// One row per hour, idle hours included.
    pub rows: Vec<BaselineSlot>,
    /// Fleet state after the pass.
    pub fleet: Fleet,
    /// Hours where the DAM lookup was degraded.
    pub degraded_hours: u32,
}

/// Runs the hourly DAM-only baseline over the whole horizon.
///
/// Each vehicle greedily fills its cheapest in-window hours with
/// `min(max_charge_kw, remaining)` kWh (one-hour slots, so kW equals kWh).
/// The pass owns its fleet snapshot; it never observes optimized-run state.
pub fn run_baseline(mut fleet: Fleet, cfg: &SimConfig, market: &MarketData) -> BaselineResult {
    fleet.reset_states();

    let grid: Vec<(NaiveDateTime, f32, bool)> = cfg
        .hours()
        .into_iter()
        .map(|t| {
            let (price, degraded) = market.dam_price(t);
            (t, price, degraded)
        })
        .collect();
    let degraded_hours = grid.iter().filter(|&&(_, _, d)| d).count() as u32;

    let mut hourly: BTreeMap<NaiveDateTime, (f32, u32)> = BTreeMap::new();
    for vehicle in &mut fleet.vehicles {
        let mut remaining = vehicle.energy_needed_kwh();
        if remaining <= 0.0 {
            continue;
        }

        let mut valid: Vec<(NaiveDateTime, f32)> = grid
            .iter()
            .filter(|(t, _, _)| *t >= vehicle.arrival_time && *t < vehicle.departure_time)
            .map(|&(t, p, _)| (t, p))
            .collect();
        valid.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (hour, _) in valid {
            if remaining <= 0.0 {
                break;
            }
            let kw = vehicle.max_charge_kw.min(remaining);
            vehicle
                .charging_schedule
                .insert(hour, ChargeRecord::DamOnly { kw });
            vehicle.current_soc += kw * HOUR_HOURS / vehicle.capacity_kwh;
            let entry = hourly.entry(hour).or_default();
            entry.0 += kw;
            entry.1 += 1;
            remaining -= kw * HOUR_HOURS;
        }
    }

    let rows: Vec<BaselineSlot> = grid
        .iter()
        .map(|&(time, price_dam, _)| {
            let (total_kw, vehicles) = hourly.get(&time).copied().unwrap_or_default();
            BaselineSlot {
                time,
                price_dam,
                total_kw,
                vehicles,
                cost_eur: slot_cost(total_kw, price_dam, HOUR_HOURS),
            }
        })
        .collect();

    let total_cost: f32 = rows.iter().map(|r| r.cost_eur).sum();
    info!(
        degraded_hours,
        total_cost_eur = total_cost,
        "baseline pass complete"
    );

    BaselineResult {
        rows,
        fleet,
        degraded_hours,
    }
}

//! Post-hoc comparison of the two strategy passes.

use std::fmt;

use chrono::NaiveDateTime;

use crate::fleet::IdmMarket;

use super::allocator::OptimizedResult;
use super::baseline::BaselineResult;
use super::cost::{CostTotals, average_price};
use super::types::{SLOT_HOURS, SLOTS_PER_HOUR, SimConfig, SlotAllocation};

/// Hourly aggregate of the 15-minute optimized table.
///
/// Powers, prices, and vehicle counts are hourly means; costs are sums. The
/// hourly grid makes the optimized table directly comparable to the baseline.
#[derive(Debug, Clone, Copy)]
pub struct HourlyAllocation {
    pub time: NaiveDateTime,
    pub price_dam: f32,
    pub price_idm_best: f32,
    pub total_kw: f32,
    pub dam_kw: f32,
    pub idm_kw: f32,
    pub vehicles: f32,
    pub cost_eur: f32,
}

/// Collapses the 15-minute rows into hourly aggregates.
pub fn aggregate_hourly(rows: &[SlotAllocation]) -> Vec<HourlyAllocation> {
    rows.chunks(SLOTS_PER_HOUR)
        .map(|chunk| {
            let n = chunk.len() as f32;
            HourlyAllocation {
                time: chunk[0].time,
                price_dam: chunk.iter().map(|r| r.price_dam).sum::<f32>() / n,
                price_idm_best: chunk.iter().map(|r| r.price_idm_best).sum::<f32>() / n,
                total_kw: chunk.iter().map(|r| r.total_kw).sum::<f32>() / n,
                dam_kw: chunk.iter().map(|r| r.dam_kw).sum::<f32>() / n,
                idm_kw: chunk.iter().map(|r| r.idm_kw()).sum::<f32>() / n,
                vehicles: chunk.iter().map(|r| r.vehicles_total as f32).sum::<f32>() / n,
                cost_eur: chunk.iter().map(SlotAllocation::cost_eur).sum(),
            }
        })
        .collect()
}

/// Aggregate comparison of one baseline and one optimized pass.
#[derive(Debug, Clone)]
pub struct ComparisonSummary {
    pub days: u32,
    pub vehicles: u32,

    pub baseline_cost_eur: f32,
    pub baseline_energy_kwh: f32,
    pub baseline_avg_price: f32,
    pub baseline_peak_kw: f32,

    pub optimized_cost_eur: f32,
    pub optimized_energy_kwh: f32,
    pub optimized_avg_price: f32,
    /// Peak of the hourly-mean optimized power (kW).
    pub optimized_peak_kw: f32,

    pub savings_eur: f32,
    pub savings_pct: f32,
    pub cost_per_day_eur: f32,
    pub cost_per_vehicle_day_eur: f32,

    /// Optimized per-source totals.
    pub dam: CostTotals,
    pub idm_15: CostTotals,
    pub idm_60: CostTotals,

    pub avg_departure_soc: f32,
    pub min_departure_soc: f32,
    pub vehicles_below_target: u32,

    pub degraded_slots: u32,
    pub degraded_hours: u32,

    pub slots_on_idm_15: u32,
    pub slots_on_idm_60: u32,
    pub vehicles_idm_15_only: u32,
    pub vehicles_idm_60_only: u32,
    pub vehicles_both_idm: u32,
    pub vehicles_dam_only: u32,
}

impl ComparisonSummary {
    /// Computes the full comparison from the two strategy outputs.
    pub fn from_results(
        optimized: &OptimizedResult,
        baseline: &BaselineResult,
        cfg: &SimConfig,
    ) -> Self {
        let mut dam = CostTotals::default();
        let mut idm_15 = CostTotals::default();
        let mut idm_60 = CostTotals::default();
        let mut slots_on_idm_15 = 0;
        let mut slots_on_idm_60 = 0;
        for row in &optimized.rows {
            dam.add(row.dam_kw, row.price_dam, SLOT_HOURS);
            idm_15.add(row.idm_15_kw, row.price_idm_15, SLOT_HOURS);
            idm_60.add(row.idm_60_kw, row.price_idm_60, SLOT_HOURS);
            if row.idm_15_kw > 0.0 {
                slots_on_idm_15 += 1;
            }
            if row.idm_60_kw > 0.0 {
                slots_on_idm_60 += 1;
            }
        }

        let optimized_cost_eur = dam.cost_eur + idm_15.cost_eur + idm_60.cost_eur;
        let optimized_energy_kwh = dam.energy_kwh + idm_15.energy_kwh + idm_60.energy_kwh;

        let baseline_cost_eur: f32 = baseline.rows.iter().map(|r| r.cost_eur).sum();
        let baseline_energy_kwh: f32 = baseline.rows.iter().map(|r| r.total_kw).sum();
        let baseline_peak_kw = baseline
            .rows
            .iter()
            .map(|r| r.total_kw)
            .fold(0.0_f32, f32::max);
        let optimized_peak_kw = aggregate_hourly(&optimized.rows)
            .iter()
            .map(|h| h.total_kw)
            .fold(0.0_f32, f32::max);

        let savings_eur = baseline_cost_eur - optimized_cost_eur;
        let savings_pct = if baseline_cost_eur > 0.0 {
            100.0 * savings_eur / baseline_cost_eur
        } else {
            0.0
        };

        let fleet = &optimized.fleet;
        let vehicles = fleet.vehicles.len() as u32;
        let avg_departure_soc = if fleet.vehicles.is_empty() {
            0.0
        } else {
            fleet.vehicles.iter().map(|v| v.current_soc).sum::<f32>() / vehicles as f32
        };
        let min_departure_soc = fleet
            .vehicles
            .iter()
            .map(|v| v.current_soc)
            .fold(f32::INFINITY, f32::min)
            .min(1.0);
        let vehicles_below_target = fleet
            .vehicles
            .iter()
            .filter(|v| !v.reached_target())
            .count() as u32;

        let mut vehicles_idm_15_only = 0;
        let mut vehicles_idm_60_only = 0;
        let mut vehicles_both_idm = 0;
        let mut vehicles_dam_only = 0;
        for v in &fleet.vehicles {
            let uses_15 = v
                .charging_schedule
                .values()
                .any(|r| r.idm_market() == Some(IdmMarket::Min15));
            let uses_60 = v
                .charging_schedule
                .values()
                .any(|r| r.idm_market() == Some(IdmMarket::Min60));
            match (uses_15, uses_60) {
                (true, true) => vehicles_both_idm += 1,
                (true, false) => vehicles_idm_15_only += 1,
                (false, true) => vehicles_idm_60_only += 1,
                (false, false) => vehicles_dam_only += 1,
            }
        }

        let days = cfg.days.max(1);
        let cost_per_day_eur = optimized_cost_eur / days as f32;
        let cost_per_vehicle_day_eur = if vehicles > 0 {
            cost_per_day_eur / vehicles as f32
        } else {
            0.0
        };

        Self {
            days: cfg.days,
            vehicles,
            baseline_cost_eur,
            baseline_energy_kwh,
            baseline_avg_price: average_price(baseline_cost_eur, baseline_energy_kwh),
            baseline_peak_kw,
            optimized_cost_eur,
            optimized_energy_kwh,
            optimized_avg_price: average_price(optimized_cost_eur, optimized_energy_kwh),
            optimized_peak_kw,
            savings_eur,
            savings_pct,
            cost_per_day_eur,
            cost_per_vehicle_day_eur,
            dam,
            idm_15,
            idm_60,
            avg_departure_soc,
            min_departure_soc,
            vehicles_below_target,
            degraded_slots: optimized.degraded_slots,
            degraded_hours: baseline.degraded_hours,
            slots_on_idm_15,
            slots_on_idm_60,
            vehicles_idm_15_only,
            vehicles_idm_60_only,
            vehicles_both_idm,
            vehicles_dam_only,
        }
    }
}

impl fmt::Display for ComparisonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Procurement Comparison ---")?;
        writeln!(
            f,
            "Horizon:                 {} day(s), {} vehicle(s)",
            self.days, self.vehicles
        )?;
        writeln!(
            f,
            "Baseline (DAM hourly):   {:.2} EUR, {:.1} kWh (avg {:.2} EUR/MWh, peak {:.1} kW)",
            self.baseline_cost_eur,
            self.baseline_energy_kwh,
            self.baseline_avg_price,
            self.baseline_peak_kw
        )?;
        writeln!(
            f,
            "Optimized (DAM+IDM):     {:.2} EUR, {:.1} kWh (avg {:.2} EUR/MWh, peak {:.1} kW)",
            self.optimized_cost_eur,
            self.optimized_energy_kwh,
            self.optimized_avg_price,
            self.optimized_peak_kw
        )?;
        writeln!(
            f,
            "Savings:                 {:.2} EUR ({:.2}%)",
            self.savings_eur, self.savings_pct
        )?;
        writeln!(
            f,
            "Cost per day:            {:.2} EUR ({:.2} EUR per vehicle-day)",
            self.cost_per_day_eur, self.cost_per_vehicle_day_eur
        )?;
        writeln!(
            f,
            "  DAM:                   {:.1} kWh at {:.2} EUR/MWh",
            self.dam.energy_kwh,
            self.dam.average_price()
        )?;
        writeln!(
            f,
            "  IDM 15min:             {:.1} kWh at {:.2} EUR/MWh ({} slots)",
            self.idm_15.energy_kwh,
            self.idm_15.average_price(),
            self.slots_on_idm_15
        )?;
        writeln!(
            f,
            "  IDM 60min:             {:.1} kWh at {:.2} EUR/MWh ({} slots)",
            self.idm_60.energy_kwh,
            self.idm_60.average_price(),
            self.slots_on_idm_60
        )?;
        writeln!(
            f,
            "Departure SOC:           avg {:.1}%, min {:.1}%, {} vehicle(s) below target",
            100.0 * self.avg_departure_soc,
            100.0 * self.min_departure_soc,
            self.vehicles_below_target
        )?;
        writeln!(
            f,
            "IDM usage by vehicle:    {} on 15min, {} on 60min, {} on both, {} DAM-only",
            self.vehicles_idm_15_only,
            self.vehicles_idm_60_only,
            self.vehicles_both_idm,
            self.vehicles_dam_only
        )?;
        write!(
            f,
            "Degraded price lookups:  {} slot(s), {} baseline hour(s)",
            self.degraded_slots, self.degraded_hours
        )
    }
}

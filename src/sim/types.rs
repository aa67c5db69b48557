//! Simulation parameters and result-table row types.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Hours covered by one optimized-strategy slot.
pub const SLOT_HOURS: f32 = 0.25;
/// Optimized-strategy slots per hour.
pub const SLOTS_PER_HOUR: usize = 4;

/// Resolved simulation parameters for one run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimConfig {
    /// Horizon start.
    pub start: NaiveDateTime,
    /// Horizon length in days.
    pub days: u32,
    /// Fraction of slot demand nominally reserved for DAM.
    pub dam_allocation: f32,
    /// IDM minimum block / step size (kW).
    pub idm_step_kw: f32,
}

impl SimConfig {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::days(i64::from(self.days))
    }

    /// 15-minute slot starts covering the horizon, in chronological order.
    pub fn slots(&self) -> Vec<NaiveDateTime> {
        let count = self.days as i64 * 24 * SLOTS_PER_HOUR as i64;
        (0..count)
            .map(|i| self.start + Duration::minutes(15 * i))
            .collect()
    }

    /// Hourly slot starts covering the horizon, in chronological order.
    pub fn hours(&self) -> Vec<NaiveDateTime> {
        let count = self.days as i64 * 24;
        (0..count).map(|i| self.start + Duration::hours(i)).collect()
    }
}

/// One 15-minute row of the optimized result table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SlotAllocation {
    pub time: NaiveDateTime,
    pub price_dam: f32,
    pub price_idm_15: f32,
    pub price_idm_60: f32,
    /// The cheaper of the two IDM prices for this slot.
    pub price_idm_best: f32,
    pub total_kw: f32,
    pub dam_kw: f32,
    pub idm_15_kw: f32,
    pub idm_60_kw: f32,
    pub vehicles_total: u32,
    pub vehicles_dam: u32,
    pub vehicles_idm: u32,
    pub cost_dam_eur: f32,
    pub cost_idm_15_eur: f32,
    pub cost_idm_60_eur: f32,
}

impl SlotAllocation {
    /// Total IDM power of the slot (kW).
    pub fn idm_kw(&self) -> f32 {
        self.idm_15_kw + self.idm_60_kw
    }

    /// Total procurement cost of the slot (EUR).
    pub fn cost_eur(&self) -> f32 {
        self.cost_dam_eur + self.cost_idm_15_eur + self.cost_idm_60_eur
    }
}

/// One hourly row of the baseline result table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BaselineSlot {
    pub time: NaiveDateTime,
    pub price_dam: f32,
    pub total_kw: f32,
    pub vehicles: u32,
    pub cost_eur: f32,
}

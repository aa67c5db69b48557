//! Vehicle state and per-slot charging attribution records.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Which intraday sub-market a block was traded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdmMarket {
    /// 15-minute quoted products.
    Min15,
    /// 60-minute quoted products.
    Min60,
}

impl IdmMarket {
    /// Short label used in reports and exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Min15 => "15min",
            Self::Min60 => "60min",
        }
    }
}

/// Charging-source attribution for one vehicle in one time slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ChargeRecord {
    /// Entire slot power bought day-ahead.
    DamOnly { kw: f32 },
    /// Entire slot power bought intraday.
    IdmOnly { kw: f32, market: IdmMarket },
    /// Slot power split across both markets.
    Mixed {
        kw_dam: f32,
        kw_idm: f32,
        market: IdmMarket,
    },
}

impl ChargeRecord {
    /// Total power of the record in kW.
    pub fn total_kw(&self) -> f32 {
        match *self {
            Self::DamOnly { kw } | Self::IdmOnly { kw, .. } => kw,
            Self::Mixed { kw_dam, kw_idm, .. } => kw_dam + kw_idm,
        }
    }

    /// The IDM sub-market involved, if any.
    pub fn idm_market(&self) -> Option<IdmMarket> {
        match *self {
            Self::DamOnly { .. } => None,
            Self::IdmOnly { market, .. } | Self::Mixed { market, .. } => Some(market),
        }
    }
}

/// One EV's single stay at the depot.
///
/// `current_soc` and `charging_schedule` are the only mutable parts; both are
/// owned by exactly one strategy pass at a time and restored with [`reset`].
///
/// [`reset`]: Vehicle::reset
#[derive(Debug, Clone)]
pub struct Vehicle {
    /// Unique identifier within the fleet.
    pub id: String,
    /// Origination day index, `None` for vehicles connected before the horizon.
    pub day: Option<u32>,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
    /// Battery capacity (kWh, > 0).
    pub capacity_kwh: f32,
    /// State of charge at arrival (0.0-1.0).
    pub return_soc: f32,
    /// State of charge required at departure (0.0-1.0).
    pub target_soc: f32,
    /// Current state of charge, starts equal to `return_soc`.
    pub current_soc: f32,
    /// Minimum charging power (kW); carried for completeness, the allocator
    /// only caps against `max_charge_kw`.
    pub min_charge_kw: f32,
    /// Maximum charging power (kW).
    pub max_charge_kw: f32,
    /// Per-slot charging attribution, filled by a strategy pass.
    pub charging_schedule: BTreeMap<NaiveDateTime, ChargeRecord>,
}

impl Vehicle {
    /// Total energy required to move from `return_soc` to `target_soc`.
    /// Only positive values require scheduling.
    pub fn energy_needed_kwh(&self) -> f32 {
        (self.target_soc - self.return_soc) * self.capacity_kwh
    }

    /// Energy still missing from the current state (kWh, >= 0).
    pub fn remaining_deficit_kwh(&self) -> f32 {
        ((self.target_soc - self.current_soc) * self.capacity_kwh).max(0.0)
    }

    /// Whether the vehicle reached its target SOC (within tolerance).
    pub fn reached_target(&self) -> bool {
        self.current_soc >= self.target_soc - 1e-4
    }

    /// Restores initial SOC and clears the charging schedule.
    pub fn reset(&mut self) {
        self.current_soc = self.return_soc;
        self.charging_schedule.clear();
    }
}

/// The vehicle population for one simulation run, sorted by arrival time.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    pub vehicles: Vec<Vehicle>,
}

impl Fleet {
    pub fn new(mut vehicles: Vec<Vehicle>) -> Self {
        vehicles.sort_by_key(|v| v.arrival_time);
        Self { vehicles }
    }

    /// Indices of vehicles whose stay window overlaps `[start, end)`.
    pub fn eligible(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<usize> {
        self.vehicles
            .iter()
            .enumerate()
            .filter(|(_, v)| v.departure_time > start && v.arrival_time < end)
            .map(|(i, _)| i)
            .collect()
    }

    /// Resets every vehicle to its initial state.
    pub fn reset_states(&mut self) {
        for v in &mut self.vehicles {
            v.reset();
        }
    }

    /// Sum of positive per-vehicle energy needs (kWh).
    pub fn total_energy_needed_kwh(&self) -> f32 {
        self.vehicles
            .iter()
            .map(|v| v.energy_needed_kwh().max(0.0))
            .sum()
    }
}

#[cfg(test)]
pub(crate) fn test_vehicle(
    id: &str,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    return_soc: f32,
    target_soc: f32,
    capacity_kwh: f32,
    max_charge_kw: f32,
) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        day: Some(0),
        arrival_time: arrival,
        departure_time: departure,
        capacity_kwh,
        return_soc,
        target_soc,
        current_soc: return_soc,
        min_charge_kw: 0.0,
        max_charge_kw,
        charging_schedule: BTreeMap::new(),
    }
}

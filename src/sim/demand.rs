//! Per-slot demand projection.
//!
//! Projects each vehicle's remaining energy need onto its cheapest in-window
//! slots before any market split happens. The projection fixes *when* and
//! *how much* each vehicle wants to draw; the allocator decides *where* the
//! energy is bought.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::fleet::Fleet;
use crate::market::SlotPrices;

use super::types::SLOT_HOURS;

/// Aggregated demand of one 15-minute slot.
#[derive(Debug, Clone, Default)]
pub struct SlotDemand {
    /// `(vehicle index, kW)` contributions.
    pub entries: Vec<(usize, f32)>,
    pub total_kw: f32,
}

/// Projects fleet demand onto the slot grid.
///
/// Each vehicle greedily fills its cheapest valid slots (ranked by DAM price,
/// ties staying chronological) with `min(max_charge_kw * 0.25 h, remaining)`
/// energy until its need is met. Vehicles without a positive need or without
/// any valid slot contribute nothing.
pub fn project(
    fleet: &Fleet,
    grid: &[(NaiveDateTime, SlotPrices)],
) -> BTreeMap<NaiveDateTime, SlotDemand> {
    let mut demand: BTreeMap<NaiveDateTime, SlotDemand> = BTreeMap::new();

    for (idx, vehicle) in fleet.vehicles.iter().enumerate() {
        let mut remaining = vehicle.energy_needed_kwh();
        if remaining <= 0.0 {
            continue;
        }

        // Grid order is chronological, so the stable sort keeps equal-price
        // slots in time order.
        let mut valid: Vec<(NaiveDateTime, f32)> = grid
            .iter()
            .filter(|(t, _)| *t >= vehicle.arrival_time && *t < vehicle.departure_time)
            .map(|&(t, p)| (t, p.dam))
            .collect();
        valid.sort_by(|a, b| a.1.total_cmp(&b.1));

        if valid.is_empty() {
            debug!(vehicle = %vehicle.id, "no slots inside stay window");
            continue;
        }

        for (slot, _) in valid {
            if remaining <= 0.0 {
                break;
            }
            let energy = (vehicle.max_charge_kw * SLOT_HOURS).min(remaining);
            let kw = energy / SLOT_HOURS;
            let entry = demand.entry(slot).or_default();
            entry.entries.push((idx, kw));
            entry.total_kw += kw;
            remaining -= energy;
        }
    }

    demand
}

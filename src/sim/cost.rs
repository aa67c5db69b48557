//! Procurement cost arithmetic.
//!
//! All functions are pure; recomputing costs from a fixed schedule always
//! yields the same totals.

/// Cost of drawing `kw` for `slot_hours` at `price_eur_mwh` (EUR).
pub fn slot_cost(kw: f32, price_eur_mwh: f32, slot_hours: f32) -> f32 {
    kw * price_eur_mwh / 1000.0 * slot_hours
}

/// Volume-weighted average price (EUR/MWh); 0 when no energy was traded.
pub fn average_price(cost_eur: f32, energy_kwh: f32) -> f32 {
    if energy_kwh <= 0.0 {
        0.0
    } else {
        cost_eur / (energy_kwh / 1000.0)
    }
}

/// Running energy and cost totals for one procurement source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostTotals {
    pub energy_kwh: f32,
    pub cost_eur: f32,
}

impl CostTotals {
    /// Adds one slot's draw to the totals.
    pub fn add(&mut self, kw: f32, price_eur_mwh: f32, slot_hours: f32) {
        self.energy_kwh += kw * slot_hours;
        self.cost_eur += slot_cost(kw, price_eur_mwh, slot_hours);
    }

    pub fn average_price(&self) -> f32 {
        average_price(self.cost_eur, self.energy_kwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_hour_cost() {
        // 100 kW for 15 min at 80 EUR/MWh = 25 kWh * 0.08 EUR/kWh = 2 EUR
        assert!((slot_cost(100.0, 80.0, 0.25) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn hourly_cost() {
        assert!((slot_cost(11.0, 100.0, 1.0) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn average_price_inverts_cost() {
        let cost = slot_cost(100.0, 80.0, 0.25);
        assert!((average_price(cost, 25.0) - 80.0).abs() < 1e-3);
    }

    #[test]
    fn average_price_zero_energy() {
        assert_eq!(average_price(0.0, 0.0), 0.0);
    }

    #[test]
    fn totals_accumulate() {
        let mut totals = CostTotals::default();
        totals.add(100.0, 80.0, 0.25);
        totals.add(100.0, 120.0, 0.25);
        assert!((totals.energy_kwh - 50.0).abs() < 1e-6);
        assert!((totals.average_price() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let schedule = [(100.0_f32, 80.0_f32), (60.0, 95.0), (20.0, 110.0)];
        let run = || {
            let mut t = CostTotals::default();
            for &(kw, price) in &schedule {
                t.add(kw, price, 0.25);
            }
            t
        };
        assert_eq!(run(), run());
    }
}

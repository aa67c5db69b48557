//! Seeded synthetic price curves for runs without CSV inputs.
//!
//! Each market gets a sinusoidal daily shape with Gaussian noise. The curves
//! share a master seed with per-market offsets so DAM and IDM stay distinct
//! but the whole set reproduces from one number.

use chrono::{Duration, NaiveDateTime};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::series::PriceSeries;

const DAM_SEED_OFFSET: u64 = 101;
const IDM_15_SEED_OFFSET: u64 = 202;
const IDM_60_SEED_OFFSET: u64 = 303;

/// Sinusoidal daily price shape with additive Gaussian noise.
#[derive(Debug, Clone)]
pub struct PriceCurve {
    /// Mean price level (EUR/MWh).
    pub base_eur_mwh: f32,
    /// Amplitude of the daily swing (EUR/MWh).
    pub amp_eur_mwh: f32,
    /// Phase offset in radians (0 = trough near the start of day).
    pub phase_rad: f32,
    /// Standard deviation of the noise (EUR/MWh).
    pub noise_std: f32,
    /// Quotes per simulated day (24 hourly, 96 quarter-hourly).
    pub steps_per_day: usize,
    rng: StdRng,
}

impl PriceCurve {
    pub fn new(
        base_eur_mwh: f32,
        amp_eur_mwh: f32,
        phase_rad: f32,
        noise_std: f32,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base_eur_mwh,
            amp_eur_mwh,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Price at the given step. Never negative.
    pub fn price_at(&mut self, step: usize) -> f32 {
        let day_pos = (step % self.steps_per_day) as f32 / self.steps_per_day as f32;
        let angle = 2.0 * std::f32::consts::PI * day_pos + self.phase_rad;

        let noise = if self.noise_std > 0.0 {
            // Box-Muller
            let u1: f32 = self.rng.random::<f32>().clamp(1e-6, 1.0);
            let u2: f32 = self.rng.random::<f32>();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
            z0 * self.noise_std
        } else {
            0.0
        };

        (self.base_eur_mwh + self.amp_eur_mwh * angle.sin() + noise).max(0.0)
    }

    /// Materializes the curve as a series over `[start, start + days)`.
    pub fn series(&mut self, start: NaiveDateTime, days: u32) -> PriceSeries {
        let step = Duration::seconds(86_400 / self.steps_per_day as i64);
        let total = self.steps_per_day * days as usize;
        let points = (0..total)
            .map(|i| (start + step * i as i32, self.price_at(i)))
            .collect();
        PriceSeries::new(points)
    }
}

/// Hourly DAM curve: calm, moderate daily swing.
pub fn dam_series(start: NaiveDateTime, days: u32, seed: u64) -> PriceSeries {
    PriceCurve::new(80.0, 25.0, 0.0, 4.0, 24, seed.wrapping_add(DAM_SEED_OFFSET)).series(start, days)
}

/// Quarter-hourly IDM curve: same shape, noticeably noisier.
pub fn idm_15_series(start: NaiveDateTime, days: u32, seed: u64) -> PriceSeries {
    PriceCurve::new(78.0, 30.0, 0.0, 9.0, 96, seed.wrapping_add(IDM_15_SEED_OFFSET))
        .series(start, days)
}

/// Hourly IDM curve: between DAM and the quarter-hourly product.
pub fn idm_60_series(start: NaiveDateTime, days: u32, seed: u64) -> PriceSeries {
    PriceCurve::new(79.0, 28.0, 0.0, 6.0, 24, seed.wrapping_add(IDM_60_SEED_OFFSET))
        .series(start, days)
}

//! Probability mass functions for fleet arrival/departure times and return SOC.
//!
//! Bins carry relative weights; sampling first picks a bin by cumulative
//! weight, then draws uniformly inside the bin. This mirrors how the empirical
//! commuter distributions were recorded (half-hour time bins, 5%-SOC bins).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

use crate::error::ConfigError;

const SECONDS_PER_HOUR: u32 = 3600;
/// Half-hour bin span, inclusive of the final second (e.g. 18:00:00-18:29:59).
const HALF_HOUR_SPAN: u32 = 30 * 60 - 1;
const HOUR_SPAN: u32 = 3600 - 1;

/// One time-of-day bin: `[start_sec, end_sec]` seconds from midnight.
#[derive(Debug, Clone, Copy)]
struct TimeBin {
    start_sec: u32,
    end_sec: u32,
    cum_weight: f32,
}

/// Time-of-day distribution sampled to the second.
#[derive(Debug, Clone)]
pub struct TimePmf {
    bins: Vec<TimeBin>,
    total_weight: f32,
}

impl TimePmf {
    /// Builds a PMF from half-hour bins given as `(hour, minute, weight)`.
    /// Zero-weight bins may be omitted.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the weights sum to zero.
    pub fn from_half_hour_bins(bins: &[(u32, u32, f32)]) -> Result<Self, ConfigError> {
        Self::build(
            bins.iter()
                .map(|&(h, m, w)| (h * SECONDS_PER_HOUR + m * 60, w))
                .collect(),
            HALF_HOUR_SPAN,
        )
    }

    /// Builds a PMF from hourly bins given as `(hour, weight)`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the weights sum to zero.
    pub fn from_hourly_bins(bins: &[(u32, f32)]) -> Result<Self, ConfigError> {
        Self::build(
            bins.iter()
                .map(|&(h, w)| (h * SECONDS_PER_HOUR, w))
                .collect(),
            HOUR_SPAN,
        )
    }

    fn build(starts: Vec<(u32, f32)>, span: u32) -> Result<Self, ConfigError> {
        let mut bins = Vec::with_capacity(starts.len());
        let mut cum = 0.0_f32;
        for (start_sec, weight) in starts {
            if weight <= 0.0 {
                continue;
            }
            cum += weight;
            bins.push(TimeBin {
                start_sec,
                end_sec: start_sec + span,
                cum_weight: cum,
            });
        }
        if cum <= 0.0 {
            return Err(ConfigError::new("pmf", "probabilities sum to zero"));
        }
        Ok(Self {
            bins,
            total_weight: cum,
        })
    }

    /// Samples a time of day on `base_date`.
    pub fn sample(&self, base_date: NaiveDate, rng: &mut impl Rng) -> NaiveDateTime {
        let draw = rng.random_range(0.0..self.total_weight);
        let bin = self
            .bins
            .iter()
            .find(|b| draw < b.cum_weight)
            .unwrap_or(&self.bins[self.bins.len() - 1]);
        let sec = rng.random_range(bin.start_sec..=bin.end_sec);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(sec, 0)
            .unwrap_or(NaiveTime::MIN);
        base_date.and_time(time)
    }
}

/// One SOC bin: uniform over `[lo, hi)`.
#[derive(Debug, Clone, Copy)]
struct SocBin {
    lo: f32,
    hi: f32,
    cum_weight: f32,
}

/// Return-SOC distribution over fractional SOC ranges.
#[derive(Debug, Clone)]
pub struct SocPmf {
    bins: Vec<SocBin>,
    total_weight: f32,
}

impl SocPmf {
    /// Builds a PMF from `(lo, hi, weight)` SOC ranges.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the weights sum to zero.
    pub fn from_ranges(ranges: &[(f32, f32, f32)]) -> Result<Self, ConfigError> {
        let mut bins = Vec::with_capacity(ranges.len());
        let mut cum = 0.0_f32;
        for &(lo, hi, weight) in ranges {
            if weight <= 0.0 {
                continue;
            }
            cum += weight;
            bins.push(SocBin {
                lo,
                hi,
                cum_weight: cum,
            });
        }
        if cum <= 0.0 {
            return Err(ConfigError::new("pmf", "probabilities sum to zero"));
        }
        Ok(Self {
            bins,
            total_weight: cum,
        })
    }

    /// Samples a fractional SOC value.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        let draw = rng.random_range(0.0..self.total_weight);
        let bin = self
            .bins
            .iter()
            .find(|b| draw < b.cum_weight)
            .unwrap_or(&self.bins[self.bins.len() - 1]);
        rng.random_range(bin.lo..bin.hi)
    }
}

/// Empirical commuter arrival distribution (evening peak around 18:00).
pub fn commuter_arrivals() -> Result<TimePmf, ConfigError> {
    TimePmf::from_half_hour_bins(&[
        (16, 30, 5.0),
        (17, 0, 13.0),
        (17, 30, 14.0),
        (18, 0, 18.0),
        (18, 30, 17.0),
        (19, 0, 15.0),
        (19, 30, 10.0),
        (20, 0, 5.0),
        (20, 30, 3.0),
    ])
}

/// Empirical commuter departure distribution (morning rush around 07:00).
pub fn commuter_departures() -> Result<TimePmf, ConfigError> {
    TimePmf::from_half_hour_bins(&[
        (6, 0, 15.0),
        (6, 30, 25.0),
        (7, 0, 35.0),
        (7, 30, 20.0),
        (8, 0, 3.0),
        (8, 30, 2.0),
    ])
}

/// Empirical return-SOC distribution (most vehicles return at 15-30%).
pub fn commuter_return_soc() -> Result<SocPmf, ConfigError> {
    SocPmf::from_ranges(&[
        (0.10, 0.15, 5.0),
        (0.15, 0.20, 20.0),
        (0.20, 0.25, 30.0),
        (0.25, 0.30, 20.0),
        (0.30, 0.35, 10.0),
        (0.35, 0.40, 10.0),
        (0.40, 0.45, 5.0),
    ])
}

/// Flat arrival distribution over 17:00-22:59.
pub fn uniform_arrivals() -> Result<TimePmf, ConfigError> {
    TimePmf::from_hourly_bins(&(17..=22).map(|h| (h, 1.0)).collect::<Vec<_>>())
}

/// Flat departure distribution over 06:00-09:59.
pub fn uniform_departures() -> Result<TimePmf, ConfigError> {
    TimePmf::from_hourly_bins(&(6..=9).map(|h| (h, 1.0)).collect::<Vec<_>>())
}

/// Flat return-SOC distribution over 10-60% in 10% bins.
pub fn uniform_return_soc() -> Result<SocPmf, ConfigError> {
    SocPmf::from_ranges(&[
        (0.1, 0.2, 1.0),
        (0.2, 0.3, 1.0),
        (0.3, 0.4, 1.0),
        (0.4, 0.5, 1.0),
        (0.5, 0.6, 1.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use rand::{SeedableRng, rngs::StdRng};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 19).expect("valid test date")
    }

    #[test]
    fn zero_weights_rejected() {
        assert!(TimePmf::from_half_hour_bins(&[(18, 0, 0.0)]).is_err());
        assert!(SocPmf::from_ranges(&[(0.1, 0.2, 0.0)]).is_err());
    }

    #[test]
    fn samples_stay_inside_bins() {
        let pmf = TimePmf::from_half_hour_bins(&[(18, 0, 1.0)]).expect("one bin");
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let t = pmf.sample(date(), &mut rng);
            assert_eq!(t.hour(), 18);
            assert!(t.minute() < 30);
        }
    }

    #[test]
    fn soc_samples_stay_inside_ranges() {
        let pmf = SocPmf::from_ranges(&[(0.2, 0.3, 1.0)]).expect("one range");
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let soc = pmf.sample(&mut rng);
            assert!((0.2..0.3).contains(&soc));
        }
    }

    #[test]
    fn heavier_bin_sampled_more_often() {
        let pmf =
            TimePmf::from_half_hour_bins(&[(6, 0, 9.0), (20, 0, 1.0)]).expect("two bins");
        let mut rng = StdRng::seed_from_u64(1);
        let mut morning = 0;
        for _ in 0..1000 {
            if pmf.sample(date(), &mut rng).hour() == 6 {
                morning += 1;
            }
        }
        assert!(morning > 800, "expected ~900 morning draws, got {morning}");
    }

    #[test]
    fn deterministic_for_same_seed() {
        let pmf = commuter_arrivals().expect("commuter pmf");
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(pmf.sample(date(), &mut a), pmf.sample(date(), &mut b));
        }
    }

    #[test]
    fn commuter_distributions_build() {
        assert!(commuter_arrivals().is_ok());
        assert!(commuter_departures().is_ok());
        assert!(commuter_return_soc().is_ok());
        assert!(uniform_arrivals().is_ok());
        assert!(uniform_departures().is_ok());
        assert!(uniform_return_soc().is_ok());
    }
}

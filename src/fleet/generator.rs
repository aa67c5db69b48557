//! Stochastic fleet population generator.
//!
//! Samples one stay per vehicle from arrival/departure/SOC distributions.
//! All randomness flows through a single seeded [`StdRng`] so a given seed
//! reproduces the exact same population.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::config::FleetConfig;
use crate::error::ConfigError;

use super::pmf::{self, SocPmf, TimePmf};
use super::vehicle::{Fleet, Vehicle};

/// Cap on vehicles already connected when the horizon opens.
const PRE_SIM_MAX: u32 = 50;
/// Fallback stay length when a sampled departure precedes the arrival.
const MIN_STAY_HOURS: i64 = 6;

/// Fleet population generator with injected distributions and RNG.
pub struct FleetGenerator {
    size: u32,
    capacity_kwh: f32,
    min_charge_kw: f32,
    max_charge_kw: f32,
    target_soc: f32,
    workdays_only: bool,
    arrivals: TimePmf,
    departures: TimePmf,
    return_soc: SocPmf,
    rng: StdRng,
}

impl FleetGenerator {
    /// Builds a generator from fleet configuration and a seed.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the selected PMF set cannot be built.
    pub fn from_config(cfg: &FleetConfig, seed: u64) -> Result<Self, ConfigError> {
        let (arrivals, departures, return_soc) = if cfg.pmf == "uniform" {
            (
                pmf::uniform_arrivals()?,
                pmf::uniform_departures()?,
                pmf::uniform_return_soc()?,
            )
        } else {
            (
                pmf::commuter_arrivals()?,
                pmf::commuter_departures()?,
                pmf::commuter_return_soc()?,
            )
        };
        Ok(Self {
            size: cfg.size,
            capacity_kwh: cfg.capacity_kwh,
            min_charge_kw: cfg.min_charge_kw,
            max_charge_kw: cfg.max_charge_kw,
            target_soc: cfg.target_soc,
            workdays_only: cfg.workdays_only,
            arrivals,
            departures,
            return_soc,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Generates the vehicle population for a simulation horizon.
    ///
    /// The population mixes four arrival patterns: vehicles already connected
    /// before the horizon opens, morning and midday arrivals on the first
    /// day, and the standard evening-arrival/next-morning-departure pattern
    /// on every generated day.
    pub fn generate(&mut self, start: NaiveDateTime, days: u32) -> Fleet {
        let mut vehicles = Vec::new();

        // Already connected when the horizon opens: a third of the fleet.
        let pre_sim_count = (self.size / 3).min(PRE_SIM_MAX);
        for i in 0..pre_sim_count {
            let hours_before = self.rng.random_range(1..=6);
            let arrival = start - Duration::hours(hours_before);
            let departure = at_time(
                start.date(),
                self.rng.random_range(7..=12),
                self.rng.random_range(0..=59),
            );
            let return_soc = self.rng.random_range(0.10..0.40);
            self.push_vehicle(
                &mut vehicles,
                format!("pre_{i}"),
                None,
                arrival,
                departure,
                return_soc,
            );
        }

        for day in 0..days {
            let day_start = start + Duration::days(i64::from(day));
            if self.workdays_only && is_weekend(day_start.date()) {
                debug!(day, date = %day_start.date(), "skipping weekend day");
                continue;
            }

            let mut remaining = self.size;
            if day == 0 {
                // The first day also sees daytime arrivals; later days only
                // the evening pattern.
                let morning = self.size / 4;
                let midday = self.size / 4;
                for i in 0..morning {
                    self.generate_daytime_arrival(
                        &mut vehicles,
                        format!("0_morning_{i}"),
                        day_start,
                        (6, 10),
                        0.3,
                    );
                }
                for i in 0..midday {
                    self.generate_daytime_arrival(
                        &mut vehicles,
                        format!("0_midday_{i}"),
                        day_start,
                        (10, 16),
                        0.4,
                    );
                }
                remaining = self
                    .size
                    .saturating_sub(pre_sim_count + morning + midday);
            }

            for i in 0..remaining {
                self.generate_evening_arrival(
                    &mut vehicles,
                    format!("{day}_evening_{i}"),
                    day,
                    day_start,
                );
            }
        }

        let fleet = Fleet::new(vehicles);
        info!(
            vehicles = fleet.vehicles.len(),
            energy_needed_kwh = fleet.total_energy_needed_kwh(),
            "fleet initialized"
        );
        fleet
    }

    /// First-day arrival during `arrival_hours`, departing the same evening
    /// with probability `same_day_prob`, otherwise the next morning.
    fn generate_daytime_arrival(
        &mut self,
        vehicles: &mut Vec<Vehicle>,
        id: String,
        day_start: NaiveDateTime,
        arrival_hours: (u32, u32),
        same_day_prob: f32,
    ) {
        let arrival = at_time(
            day_start.date(),
            self.rng.random_range(arrival_hours.0..=arrival_hours.1),
            self.rng.random_range(0..=59),
        );
        let departure = if self.rng.random::<f32>() < same_day_prob {
            at_time(
                day_start.date(),
                self.rng.random_range(19..=23),
                self.rng.random_range(0..=59),
            )
        } else {
            at_time(
                next_day(day_start.date()),
                self.rng.random_range(6..=10),
                self.rng.random_range(0..=59),
            )
        };
        let return_soc = self.rng.random_range(0.2..0.5);
        self.push_vehicle(vehicles, id, Some(0), arrival, departure, return_soc);
    }

    /// Standard pattern: evening arrival per PMF, next-morning departure per
    /// PMF (shifted past the weekend when `workdays_only` is set).
    fn generate_evening_arrival(
        &mut self,
        vehicles: &mut Vec<Vehicle>,
        id: String,
        day: u32,
        day_start: NaiveDateTime,
    ) {
        let arrival = self.arrivals.sample(day_start.date(), &mut self.rng);

        let mut departure_date = next_day(day_start.date());
        if self.workdays_only && is_weekend(departure_date) {
            // Weekend departures shift past the weekend (Saturday +3, Sunday +2).
            let shift = 8 - u64::from(departure_date.weekday().num_days_from_monday());
            departure_date = departure_date
                .checked_add_days(Days::new(shift))
                .unwrap_or(departure_date);
        }
        let mut departure = self.departures.sample(departure_date, &mut self.rng);

        if departure <= arrival {
            departure = arrival + Duration::hours(MIN_STAY_HOURS);
        }

        let return_soc = self.return_soc.sample(&mut self.rng);
        self.push_vehicle(vehicles, id, Some(day), arrival, departure, return_soc);
    }

    /// Adds a vehicle when it both needs charge and has time to receive it.
    fn push_vehicle(
        &self,
        vehicles: &mut Vec<Vehicle>,
        id: String,
        day: Option<u32>,
        arrival: NaiveDateTime,
        departure: NaiveDateTime,
        return_soc: f32,
    ) {
        let energy_needed = (self.target_soc - return_soc) * self.capacity_kwh;
        if energy_needed <= 0.0 || departure <= arrival {
            return;
        }
        vehicles.push(Vehicle {
            id,
            day,
            arrival_time: arrival,
            departure_time: departure,
            capacity_kwh: self.capacity_kwh,
            return_soc,
            target_soc: self.target_soc,
            current_soc: return_soc,
            min_charge_kw: self.min_charge_kw,
            max_charge_kw: self.max_charge_kw,
            charging_schedule: Default::default(),
        });
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() >= 5
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

fn at_time(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight always valid"))
}

//! Price series storage and per-slot price resolution.

use chrono::{Duration, NaiveDateTime, Timelike};
use tracing::warn;

use crate::fleet::IdmMarket;

/// A time-ordered `(timestamp, price)` series for one market product.
///
/// Timestamps mark the start of the quoted delivery period; prices are in
/// EUR/MWh. The series is sorted on construction so lookups can bisect.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    points: Vec<(NaiveDateTime, f32)>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<(NaiveDateTime, f32)>) -> Self {
        points.sort_by_key(|&(t, _)| t);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// First quoted price within `[start, start + duration)`.
    pub fn price_in_bucket(&self, start: NaiveDateTime, duration: Duration) -> Option<f32> {
        let end = start + duration;
        let idx = self.points.partition_point(|&(t, _)| t < start);
        self.points
            .get(idx)
            .filter(|&&(t, _)| t < end)
            .map(|&(_, p)| p)
    }

    /// Price of the point closest in time to `t`, if the series is non-empty.
    pub fn nearest(&self, t: NaiveDateTime) -> Option<f32> {
        if self.points.is_empty() {
            return None;
        }
        let idx = self.points.partition_point(|&(ts, _)| ts < t);
        let mut best: Option<(i64, f32)> = None;
        for candidate in [idx.checked_sub(1), Some(idx)].into_iter().flatten() {
            if let Some(&(ts, p)) = self.points.get(candidate) {
                let dist = (ts - t).num_seconds().abs();
                if best.is_none_or(|(d, _)| dist < d) {
                    best = Some((dist, p));
                }
            }
        }
        best.map(|(_, p)| p)
    }
}

/// Resolved prices for one 15-minute slot.
///
/// `degraded` marks slots where at least one price came from a nearest-match
/// or fallback lookup instead of an exact bucket hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPrices {
    pub dam: f32,
    pub idm_15: f32,
    pub idm_60: f32,
    pub degraded: bool,
}

impl SlotPrices {
    /// The cheaper IDM sub-market for this slot. Ties go to the 15-minute
    /// product, which trades closer to delivery.
    pub fn best_idm(&self) -> (f32, IdmMarket) {
        if self.idm_15 <= self.idm_60 {
            (self.idm_15, IdmMarket::Min15)
        } else {
            (self.idm_60, IdmMarket::Min60)
        }
    }
}

/// All market inputs for one run.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub dam: PriceSeries,
    pub idm_15: PriceSeries,
    pub idm_60: PriceSeries,
    /// Last-resort DAM price when neither bucket nor nearest lookup hits.
    pub fallback_price_eur_mwh: f32,
}

impl MarketData {
    /// DAM price for the hour containing `t`.
    ///
    /// Falls back to the nearest quoted hour, then to the configured constant.
    /// The second value reports whether the lookup was degraded.
    pub fn dam_price(&self, t: NaiveDateTime) -> (f32, bool) {
        let hour_start = truncate_to_hour(t);
        if let Some(p) = self.dam.price_in_bucket(hour_start, Duration::hours(1)) {
            return (p, false);
        }
        if let Some(p) = self.dam.nearest(t) {
            warn!(slot = %t, price = p, "no DAM quote for hour, using nearest");
            return (p, true);
        }
        warn!(
            slot = %t,
            price = self.fallback_price_eur_mwh,
            "no DAM data at all, using fallback price"
        );
        (self.fallback_price_eur_mwh, true)
    }

    /// Resolves the three prices for the 15-minute slot starting at `slot`.
    ///
    /// Missing IDM quotes fall back to the slot's resolved DAM price, so a
    /// sparse intraday series degrades towards DAM-equivalent pricing rather
    /// than towards zero.
    pub fn slot_prices(&self, slot: NaiveDateTime) -> SlotPrices {
        let (dam, mut degraded) = self.dam_price(slot);

        let idm_15 = match self.idm_15.price_in_bucket(slot, Duration::minutes(15)) {
            Some(p) => p,
            None => {
                warn!(slot = %slot, "no 15-minute IDM quote, using DAM price");
                degraded = true;
                dam
            }
        };

        let hour_start = truncate_to_hour(slot);
        let idm_60 = match self.idm_60.price_in_bucket(hour_start, Duration::hours(1)) {
            Some(p) => p,
            None => {
                warn!(slot = %slot, "no 60-minute IDM quote, using DAM price");
                degraded = true;
                dam
            }
        };

        SlotPrices {
            dam,
            idm_15,
            idm_60,
            degraded,
        }
    }
}

fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.date()
        .and_hms_opt(t.hour(), 0, 0)
        .unwrap_or(t)
}

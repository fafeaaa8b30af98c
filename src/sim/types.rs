//! Core simulation types: battery operating state, solar input, and per-hour records.

use std::fmt;

use crate::error::SimError;

/// Number of hours in one simulated year.
pub const HOURS_PER_YEAR: usize = 8_760;

/// Floating-point tolerance used for SOC boundary clamps and near-equality checks.
pub const EPS: f32 = 1e-9;

/// Battery operating state for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingState {
    Idle,
    Charging,
    Discharging,
}

impl OperatingState {
    /// Fractional cycle cost of transitioning from `self` to `next`.
    ///
    /// `0` if unchanged, `1.0` for a direct charging/discharging reversal,
    /// `0.5` for any other transition (to/from idle).
    pub fn transition_cost(self, next: Self) -> f32 {
        if self == next {
            0.0
        } else if (self == Self::Charging && next == Self::Discharging)
            || (self == Self::Discharging && next == Self::Charging)
        {
            1.0
        } else {
            0.5
        }
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Charging => "Charging",
            Self::Discharging => "Discharging",
        };
        write!(f, "{s}")
    }
}

/// A validated one-year solar generation profile: exactly [`HOURS_PER_YEAR`]
/// non-negative MW values, one per absolute hour-of-year.
#[derive(Debug, Clone)]
pub struct SolarProfile {
    hours: Vec<f32>,
}

impl SolarProfile {
    /// Builds a profile from parsed values.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InputShape` if `hours` does not have exactly
    /// [`HOURS_PER_YEAR`] entries or contains a negative value.
    pub fn new(hours: Vec<f32>) -> Result<Self, SimError> {
        if hours.len() != HOURS_PER_YEAR {
            return Err(SimError::InputShape(format!(
                "expected {HOURS_PER_YEAR} hourly values, got {}",
                hours.len()
            )));
        }
        if let Some((idx, v)) = hours.iter().enumerate().find(|(_, v)| **v < 0.0) {
            return Err(SimError::InputShape(format!(
                "negative solar value {v} at hour {idx}"
            )));
        }
        Ok(Self { hours })
    }

    /// Solar generation (MW) at absolute hour-of-year `h`.
    ///
    /// # Panics
    ///
    /// Panics if `h >= HOURS_PER_YEAR`.
    pub fn at(&self, h: usize) -> f32 {
        self.hours[h]
    }

    /// Total solar generation across the year (MWh, one-hour steps).
    pub fn total_mwh(&self) -> f32 {
        self.hours.iter().sum()
    }

    /// Mean hourly solar generation (MW) across the year.
    pub fn average_mw(&self) -> f32 {
        self.total_mwh() / HOURS_PER_YEAR as f32
    }

    /// Number of hours in the profile; always [`HOURS_PER_YEAR`].
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    /// Never empty; a validly constructed profile always has 8,760 hours.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One simulated hour's full operational record.
#[derive(Debug, Clone)]
pub struct HourlyRecord {
    /// Absolute hour-of-year, `0..HOURS_PER_YEAR`.
    pub hour: usize,
    /// Calendar date this hour falls on, `YYYY-MM-DD` (reference year, non-leap).
    pub date: String,
    /// Hour of day, `0..23`.
    pub hour_of_day: u32,
    /// Solar generation this hour (MW).
    pub solar_mw: f32,
    /// Battery power in load-delivery convention: positive discharging, negative charging.
    pub bess_mw: f32,
    /// Stored energy at end of hour (MWh), `soc_pct / 100 * capacity`.
    pub stored_mwh: f32,
    /// State of charge at end of hour, percent.
    pub soc_pct: f32,
    /// Delivered commitment this hour, `0` or `target_mw`.
    pub committed_mw: f32,
    /// Unmet demand this hour (MW), `>= 0`.
    pub deficit_mw: f32,
    /// Whether the delivery target was met this hour.
    pub delivery: bool,
    /// Solar energy neither delivered nor stored this hour (MWh).
    pub wastage_mwh: f32,
    /// Battery operating state at end of hour.
    pub state: OperatingState,
}

impl fmt::Display for HourlyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>5} {} {:02}:00 | solar={:>6.2} bess={:>6.2} soc={:>5.1}% \
             committed={:>5.1} deficit={:>5.1} delivery={} wastage={:>5.2} state={}",
            self.hour,
            self.date,
            self.hour_of_day,
            self.solar_mw,
            self.bess_mw,
            self.soc_pct,
            self.committed_mw,
            self.deficit_mw,
            if self.delivery { "Yes" } else { "No" },
            self.wastage_mwh,
            self.state,
        )
    }
}

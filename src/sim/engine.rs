//! Yearly dispatch simulator (C3): drives the hourly dispatch decision
//! across a full year and accumulates per-hour records.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::battery::Battery;
use crate::config::{BatteryConfig, DeliveryConfig};
use crate::dispatch::{dispatch_hour, DispatchOutcome};
use crate::error::{InvariantViolation, SimError};
use crate::sim::types::OperatingState;

use super::types::{HourlyRecord, SolarProfile, EPS, HOURS_PER_YEAR};

const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Maps an absolute hour-of-year to a `(date, hour_of_day)` pair against a
/// fixed 365-day reference calendar (leap days are never produced, since
/// exactly 8,760 hours span exactly 365 days).
fn hour_to_date(h: usize) -> (String, u32) {
    let day_of_year = h / 24;
    let hour_of_day = (h % 24) as u32;
    let mut remaining = day_of_year as u32;
    let mut month = 0usize;
    for (i, &len) in MONTH_LENGTHS.iter().enumerate() {
        if remaining < len {
            month = i;
            break;
        }
        remaining -= len;
    }
    let day = remaining + 1;
    (format!("2024-{:02}-{:02}", month + 1, day), hour_of_day)
}

/// Drives one battery capacity through a full year of hourly dispatch.
///
/// Owns a fresh [`Battery`] and borrows the shared, immutable
/// [`SolarProfile`]; multiple simulators for different capacities can run
/// concurrently against the same profile without locking.
pub struct YearlySimulator<'a> {
    battery: Battery,
    delivery: DeliveryConfig,
    solar: &'a SolarProfile,
}

impl<'a> YearlySimulator<'a> {
    /// Creates a simulator for one battery capacity.
    pub fn new(
        capacity_mwh: f32,
        battery_cfg: &BatteryConfig,
        delivery_cfg: DeliveryConfig,
        solar: &'a SolarProfile,
    ) -> Self {
        Self {
            battery: Battery::new(capacity_mwh, battery_cfg),
            delivery: delivery_cfg,
            solar,
        }
    }

    /// Runs the full 8,760-hour year and returns every [`HourlyRecord`] in
    /// strict increasing hour order.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Invariant` if a hard invariant (SOC bounds, daily
    /// cycle cap, binary delivery, `bess_mw` sign) is violated mid-run; this
    /// indicates an implementation bug, not bad input.
    pub fn run(&mut self) -> Result<Vec<HourlyRecord>, SimError> {
        let (records, _cancelled) = self.run_cancellable(None)?;
        Ok(records)
    }

    /// Runs the year, checking `cancel` once per simulated hour. If the
    /// flag becomes set, the in-flight hour completes and the partial
    /// record set is returned with `cancelled = true`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Invariant` as soon as a post-hour invariant check
    /// fails, halting this run short of a full year.
    pub fn run_cancellable(&mut self, cancel: Option<&AtomicBool>) -> Result<(Vec<HourlyRecord>, bool), SimError> {
        let mut records = Vec::with_capacity(HOURS_PER_YEAR);
        let mut cancelled = false;

        for h in 0..HOURS_PER_YEAR {
            let solar_mw = self.solar.at(h);
            let outcome = dispatch_hour(&mut self.battery, solar_mw, &self.delivery, h);
            self.battery.apply_aux_load();

            self.check_invariants(&outcome, h)?;

            let (date, hour_of_day) = hour_to_date(h);
            records.push(HourlyRecord {
                hour: h,
                date,
                hour_of_day,
                solar_mw,
                bess_mw: outcome.bess_mw,
                stored_mwh: self.battery.stored_mwh(),
                soc_pct: self.battery.soc_pct(),
                committed_mw: outcome.committed_mw,
                deficit_mw: outcome.deficit_mw,
                delivery: outcome.delivery,
                wastage_mwh: outcome.wastage_mwh,
                state: self.battery.state(),
            });

            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
        }

        Ok((records, cancelled))
    }

    /// Checks the spec §8 universal invariants against the battery's
    /// post-hour state and `outcome`, returning a diagnostic
    /// [`InvariantViolation`] naming the active §4.2 branch on failure.
    fn check_invariants(&mut self, outcome: &DispatchOutcome, hour: usize) -> Result<(), SimError> {
        if let Some((soc_before, soc_after)) = self.battery.take_soc_violation() {
            return Err(SimError::Invariant(InvariantViolation {
                hour,
                branch: outcome.branch,
                detail: format!(
                    "soc escaped [{}, {}] by more than tolerance",
                    self.battery.soc_min(),
                    self.battery.soc_max()
                ),
                soc_before,
                soc_after,
            }));
        }

        let soc = self.battery.soc();

        if self.battery.daily_cycles() > self.battery.max_cycles_per_day() + EPS {
            return Err(SimError::Invariant(InvariantViolation {
                hour,
                branch: outcome.branch,
                detail: format!(
                    "daily_cycles {} exceeded max_cycles_per_day {}",
                    self.battery.daily_cycles(),
                    self.battery.max_cycles_per_day()
                ),
                soc_before: soc,
                soc_after: soc,
            }));
        }

        let target = self.delivery.target_mw;
        let binary_commit = outcome.committed_mw.abs() < EPS || (outcome.committed_mw - target).abs() < EPS;
        if !binary_commit {
            return Err(SimError::Invariant(InvariantViolation {
                hour,
                branch: outcome.branch,
                detail: format!("committed_mw {} is neither 0 nor target {target}", outcome.committed_mw),
                soc_before: soc,
                soc_after: soc,
            }));
        }

        let sign_ok = match self.battery.state() {
            OperatingState::Charging => outcome.bess_mw <= EPS,
            OperatingState::Discharging => outcome.bess_mw >= -EPS,
            OperatingState::Idle => outcome.bess_mw.abs() <= EPS,
        };
        if !sign_ok {
            return Err(SimError::Invariant(InvariantViolation {
                hour,
                branch: outcome.branch,
                detail: format!("bess_mw {} is sign-inconsistent with state {}", outcome.bess_mw, self.battery.state()),
                soc_before: soc,
                soc_after: soc,
            }));
        }

        Ok(())
    }

    /// Reference to the battery, for final-state metrics (total cycles,
    /// degradation) after a run completes.
    pub fn battery(&self) -> &Battery {
        &self.battery
    }
}

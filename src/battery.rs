//! Battery model: SOC, operating state, and cycle accounting (C1).
//!
//! All power/energy arithmetic is one-hour-step MW/MWh. SOC is kept inside
//! `[soc_min, soc_max]` by an explicit clamp after every operation; clamp
//! distance beyond [`EPS`] indicates a logic error upstream, not a precision
//! artifact, and is asserted against in debug builds.

use crate::config::BatteryConfig;
use crate::sim::types::{OperatingState, EPS};

/// Owned, mutable battery state for one simulation run.
#[derive(Debug, Clone)]
pub struct Battery {
    capacity_mwh: f32,
    soc_min: f32,
    soc_max: f32,
    eta: f32,
    c_charge: f32,
    c_discharge: f32,
    max_cycles_per_day: f32,
    degradation_per_cycle: f32,
    aux_load_pct: f32,
    soc: f32,
    state: OperatingState,
    daily_cycles: f32,
    total_cycles: f32,
    /// Set by `clamp_soc` when the pre-clamp distance from bounds exceeds
    /// tolerance; a logic error upstream, not precision noise. Cleared by
    /// [`Self::take_soc_violation`].
    soc_violation: Option<(f32, f32)>,
}

impl Battery {
    /// Creates a new battery with the given capacity and technical spec.
    ///
    /// Starts `Idle` at `config.soc_init`, with zero cycles accumulated.
    pub fn new(capacity_mwh: f32, config: &BatteryConfig) -> Self {
        Self {
            capacity_mwh,
            soc_min: config.soc_min,
            soc_max: config.soc_max,
            eta: config.eta_one_way(),
            c_charge: config.c_charge,
            c_discharge: config.c_discharge,
            max_cycles_per_day: config.max_cycles_per_day,
            degradation_per_cycle: config.degradation_per_cycle,
            aux_load_pct: config.aux_load_pct,
            soc: config.soc_init,
            state: OperatingState::Idle,
            daily_cycles: 0.0,
            total_cycles: 0.0,
            soc_violation: None,
        }
    }

    pub fn capacity_mwh(&self) -> f32 {
        self.capacity_mwh
    }

    pub fn soc(&self) -> f32 {
        self.soc
    }

    pub fn soc_min(&self) -> f32 {
        self.soc_min
    }

    pub fn soc_max(&self) -> f32 {
        self.soc_max
    }

    pub fn max_cycles_per_day(&self) -> f32 {
        self.max_cycles_per_day
    }

    pub fn soc_pct(&self) -> f32 {
        self.soc * 100.0
    }

    pub fn stored_mwh(&self) -> f32 {
        self.soc * self.capacity_mwh
    }

    pub fn state(&self) -> OperatingState {
        self.state
    }

    pub fn daily_cycles(&self) -> f32 {
        self.daily_cycles
    }

    pub fn total_cycles(&self) -> f32 {
        self.total_cycles
    }

    /// Maximum power (MW) the battery can deliver to the load this hour.
    pub fn available_discharge_power(&self) -> f32 {
        ((self.soc - self.soc_min) * self.capacity_mwh).min(self.capacity_mwh * self.c_discharge).max(0.0)
    }

    /// Storable energy headroom (MWh) before reaching `soc_max`.
    pub fn available_charge_headroom(&self) -> f32 {
        ((self.soc_max - self.soc) * self.capacity_mwh).max(0.0)
    }

    /// Accepts input power over one hour, clamped by C-rate and headroom.
    ///
    /// Returns the input-side power actually absorbed; the caller treats
    /// any un-absorbed portion of the original request as wastage.
    pub fn charge(&mut self, p_in_mw: f32) -> f32 {
        if p_in_mw <= 0.0 {
            return 0.0;
        }
        let rate_capped = p_in_mw.min(self.capacity_mwh * self.c_charge);
        let headroom = self.available_charge_headroom();
        let max_input_for_headroom = if self.eta > 0.0 { headroom / self.eta } else { 0.0 };
        let accepted = rate_capped.min(max_input_for_headroom);
        let stored = accepted * self.eta;
        self.soc += stored / self.capacity_mwh;
        self.clamp_soc();
        accepted
    }

    /// Delivers output power over one hour, limited by discharge power and
    /// available energy after the one-way efficiency loss.
    ///
    /// Returns the load-side power actually delivered.
    pub fn discharge(&mut self, p_out_mw: f32) -> f32 {
        if p_out_mw <= 0.0 {
            return 0.0;
        }
        let energy_limited = ((self.soc - self.soc_min) * self.capacity_mwh * self.eta).max(0.0);
        let delivered = p_out_mw.min(self.available_discharge_power()).min(energy_limited);
        let drawn = if self.eta > 0.0 { delivered / self.eta } else { 0.0 };
        self.soc -= drawn / self.capacity_mwh;
        self.clamp_soc();
        delivered
    }

    /// Whether transitioning from the current state to `next` stays within
    /// the daily cycle cap.
    pub fn can_cycle(&self, next: OperatingState) -> bool {
        let delta = self.state.transition_cost(next);
        self.daily_cycles + delta <= self.max_cycles_per_day + EPS
    }

    /// Performs the lazy daily reset at day boundaries (`hour % 24 == 0`).
    pub fn reset_day_if_needed(&mut self, hour: usize) {
        if hour % 24 == 0 {
            self.daily_cycles = 0.0;
        }
    }

    /// Transitions to `next`, charging the appropriate fractional cycle cost
    /// to both the daily and total counters. Callers must have confirmed
    /// `can_cycle(next)` before invoking this for a blocking transition.
    pub fn transition(&mut self, next: OperatingState, hour: usize) {
        self.reset_day_if_needed(hour);
        if next != self.state {
            let delta = self.state.transition_cost(next);
            self.daily_cycles += delta;
            self.total_cycles += delta;
            self.state = next;
        }
    }

    /// Subtracts the parasitic per-hour draw from stored energy, clamped so
    /// SOC never drops below `soc_min`. Returns the energy actually removed
    /// (MWh), reported as separate bookkeeping, not as delivery.
    pub fn apply_aux_load(&mut self) -> f32 {
        if self.aux_load_pct <= 0.0 {
            return 0.0;
        }
        let requested = self.aux_load_pct * self.capacity_mwh;
        let available = ((self.soc - self.soc_min) * self.capacity_mwh).max(0.0);
        let drawn = requested.min(available);
        self.soc -= drawn / self.capacity_mwh;
        self.clamp_soc();
        drawn
    }

    /// Capacity fraction lost to degradation given cycles accumulated so far.
    pub fn degradation_pct(&self) -> f32 {
        self.total_cycles * self.degradation_per_cycle * 100.0
    }

    fn clamp_soc(&mut self) {
        let pre = self.soc;
        let escaped = pre < self.soc_min - 10.0 * EPS || pre > self.soc_max + 10.0 * EPS;
        debug_assert!(
            !escaped,
            "soc {} escaped [{}, {}] by more than tolerance",
            pre, self.soc_min, self.soc_max
        );
        self.soc = self.soc.clamp(self.soc_min, self.soc_max);
        if escaped {
            self.soc_violation = Some((pre, self.soc));
        }
    }

    /// Returns and clears any SOC clamp violation recorded since the last
    /// call, for the caller to surface as a structured [`InvariantViolation`].
    pub fn take_soc_violation(&mut self) -> Option<(f32, f32)> {
        self.soc_violation.take()
    }
}

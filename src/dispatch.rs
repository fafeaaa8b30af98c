//! Hourly dispatch decision (C2): picks one of four branches per hour and
//! commands the battery accordingly.

use crate::battery::Battery;
use crate::config::DeliveryConfig;
use crate::sim::types::OperatingState;

/// Selects which power-source dispatch policy governs a run.
///
/// Only `T0` (solar + battery, no diesel) is implemented; the remaining
/// slots name the extension points described for future diesel co-dispatch
/// templates without attributing behavior to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTemplate {
    /// Solar + battery only.
    T0,
}

/// Outcome of dispatching one hour, before the caller attaches hour/date
/// bookkeeping and the post-hour battery snapshot.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Battery power in load-delivery convention: positive discharging, negative charging.
    pub bess_mw: f32,
    /// Delivered commitment this hour, `0` or `target_mw`.
    pub committed_mw: f32,
    /// Unmet demand this hour (MW), `>= 0`.
    pub deficit_mw: f32,
    /// Whether the delivery target was met this hour.
    pub delivery: bool,
    /// Solar energy neither delivered nor stored this hour (MWh).
    pub wastage_mwh: f32,
    /// Which §4.2 branch produced this outcome, for invariant diagnostics.
    pub branch: &'static str,
}

/// Runs the four-branch dispatch decision for one hour against `battery`,
/// mutating it in place, and returns the resulting [`DispatchOutcome`].
///
/// Branches are evaluated in order; the first match wins (spec §4.2):
/// excess solar, battery-assisted delivery, insufficient total, cycle-blocked.
pub fn dispatch_hour(
    battery: &mut Battery,
    solar_mw: f32,
    delivery: &DeliveryConfig,
    hour: usize,
) -> DispatchOutcome {
    battery.reset_day_if_needed(hour);
    let target = delivery.target_mw;

    if solar_mw >= target {
        return dispatch_excess_solar(battery, solar_mw, target, delivery.charge_threshold_mw, hour);
    }

    let avail_discharge = battery.available_discharge_power();
    if solar_mw + avail_discharge >= target {
        if let Some(outcome) = try_battery_assisted(battery, solar_mw, target, hour) {
            return outcome;
        }
        // can_cycle(Discharging) failed: fall through to the cycle-blocked branch.
        return dispatch_cycle_blocked(battery, solar_mw, target, hour);
    }

    dispatch_insufficient_total(battery, solar_mw, target, avail_discharge, hour)
}

/// Branch 1: `solar >= target`.
fn dispatch_excess_solar(
    battery: &mut Battery,
    solar_mw: f32,
    target: f32,
    charge_threshold: f32,
    hour: usize,
) -> DispatchOutcome {
    let excess = solar_mw - target;
    let was_discharging = battery.state() == OperatingState::Discharging;

    let (accepted, wastage) = if was_discharging {
        // Never charge in the same hour as a prior discharge: avoids a 1.0-cycle reversal.
        (0.0, excess)
    } else if excess >= charge_threshold && excess > 0.0 {
        let accepted = battery.charge(excess);
        (accepted, excess - accepted)
    } else {
        (0.0, excess)
    };

    if accepted > 0.0 && battery.state() == OperatingState::Idle && battery.can_cycle(OperatingState::Charging) {
        battery.transition(OperatingState::Charging, hour);
    }

    DispatchOutcome {
        bess_mw: -accepted,
        committed_mw: target,
        deficit_mw: 0.0,
        delivery: true,
        wastage_mwh: wastage,
        branch: "excess_solar",
    }
}

/// Branch 2: `solar < target` and `solar + available_discharge_power >= target`.
///
/// Returns `None` if `can_cycle(Discharging)` fails, signaling the caller to
/// fall through to the cycle-blocked branch.
fn try_battery_assisted(battery: &mut Battery, solar_mw: f32, target: f32, hour: usize) -> Option<DispatchOutcome> {
    if !battery.can_cycle(OperatingState::Discharging) {
        return None;
    }
    let deficit_needed = target - solar_mw;
    let delivered = battery.discharge(deficit_needed);
    if delivered >= deficit_needed - crate::sim::types::EPS {
        battery.transition(OperatingState::Discharging, hour);
        Some(DispatchOutcome {
            bess_mw: delivered,
            committed_mw: target,
            deficit_mw: 0.0,
            delivery: true,
            wastage_mwh: 0.0,
            branch: "battery_assisted",
        })
    } else {
        None
    }
}

/// Branch 3: `solar + available_discharge_power < target`.
fn dispatch_insufficient_total(
    battery: &mut Battery,
    solar_mw: f32,
    target: f32,
    avail_discharge: f32,
    hour: usize,
) -> DispatchOutcome {
    let deficit = target - solar_mw - avail_discharge;
    let was_discharging = battery.state() == OperatingState::Discharging;

    let accepted = if solar_mw > 0.0 && !was_discharging {
        let accepted = battery.charge(solar_mw);
        if accepted > 0.0 && battery.state() == OperatingState::Idle && battery.can_cycle(OperatingState::Charging) {
            battery.transition(OperatingState::Charging, hour);
        }
        accepted
    } else {
        0.0
    };

    if was_discharging && accepted == 0.0 {
        battery.transition(OperatingState::Idle, hour);
    }

    DispatchOutcome {
        bess_mw: -accepted,
        committed_mw: 0.0,
        deficit_mw: deficit,
        delivery: false,
        wastage_mwh: solar_mw - accepted,
        branch: "insufficient_total",
    }
}

/// Branch 4: resources are sufficient but `can_cycle(Discharging)` is false.
fn dispatch_cycle_blocked(battery: &mut Battery, solar_mw: f32, target: f32, hour: usize) -> DispatchOutcome {
    let deficit = target - solar_mw;
    let was_discharging = battery.state() == OperatingState::Discharging;

    let accepted = if solar_mw > 0.0 && !was_discharging {
        let accepted = battery.charge(solar_mw);
        if accepted > 0.0 && battery.state() == OperatingState::Idle && battery.can_cycle(OperatingState::Charging) {
            battery.transition(OperatingState::Charging, hour);
        }
        accepted
    } else {
        0.0
    };

    DispatchOutcome {
        bess_mw: -accepted,
        committed_mw: 0.0,
        deficit_mw: deficit,
        delivery: false,
        wastage_mwh: solar_mw - accepted,
        branch: "cycle_blocked",
    }
}

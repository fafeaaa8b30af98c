//! Capacity sweep driver (C5): runs the yearly simulator across a range of
//! battery capacities in parallel and selects the economically optimal size.

use std::sync::atomic::AtomicBool;

use rayon::prelude::*;

use crate::config::{BatteryConfig, DeliveryConfig, SweepConfig};
use crate::error::InvariantViolation;
use crate::sim::engine::YearlySimulator;
use crate::sim::summary::{attach_marginals, summarize, SummaryMetrics};
use crate::sim::types::{SolarProfile, EPS};

/// Result of sweeping a range of battery capacities.
#[derive(Debug, Clone)]
pub struct SweepResult {
    /// Summary metrics for every capacity that ran to completion, sorted
    /// ascending by `capacity_mwh`, with forward marginals attached.
    pub summaries: Vec<SummaryMetrics>,
    /// Capacity selected by the marginal-gain rule (spec §4.5). `None` if
    /// the sweep was cancelled before any capacity completed.
    pub optimal_capacity_mwh: Option<f32>,
    /// Whether the sweep was stopped early by the cancellation signal.
    pub cancelled: bool,
    /// Capacities (MWh) that ran to completion, ascending.
    pub completed_capacities: Vec<f32>,
    /// Capacities whose run halted on a hard invariant violation (spec §7),
    /// paired with the diagnostic. Excluded from `summaries`.
    pub invariant_violations: Vec<(f32, InvariantViolation)>,
}

/// Generates the tested capacities `C_k = size_min + k * size_step` while
/// `C_k <= size_max` (inclusive, within floating-point tolerance).
fn capacities(sweep: &SweepConfig) -> Vec<f32> {
    let mut caps = Vec::new();
    let mut k: u32 = 0;
    loop {
        let c = sweep.size_min + k as f32 * sweep.size_step;
        if c > sweep.size_max + EPS {
            break;
        }
        caps.push(c);
        k += 1;
    }
    caps
}

/// Finds the smallest capacity whose forward marginal hours/MWh falls below
/// `threshold` and remains below it for every strictly larger tested
/// capacity. Falls back to the largest tested capacity if no such point
/// exists. Ties are broken toward the smaller capacity by iterating ascending
/// and returning the first match.
fn select_optimal(summaries: &[SummaryMetrics], threshold: f32) -> Option<f32> {
    let n = summaries.len();
    if n == 0 {
        return None;
    }
    for (k, s) in summaries.iter().enumerate() {
        let Some(marginal) = s.marginal_hours_per_mwh else {
            continue;
        };
        if marginal >= threshold {
            continue;
        }
        let rest_below = summaries[k + 1..]
            .iter()
            .all(|later| later.marginal_hours_per_mwh.is_none_or(|m| m < threshold));
        if rest_below {
            return Some(s.capacity_mwh);
        }
    }
    Some(summaries[n - 1].capacity_mwh)
}

/// Runs the full capacity sweep described by `sweep_cfg`, independently
/// parallel across capacities. Each capacity owns a fresh battery and
/// shares only the immutable `battery_cfg`, `delivery_cfg`, and `solar`.
///
/// `cancel`, if set, is checked once per simulated hour inside every
/// capacity's run; any run still in flight when the flag flips completes
/// its current hour and is excluded from the final summaries.
pub fn run_sweep(
    battery_cfg: &BatteryConfig,
    delivery_cfg: &DeliveryConfig,
    sweep_cfg: &SweepConfig,
    solar: &SolarProfile,
    cancel: Option<&AtomicBool>,
) -> SweepResult {
    let caps = capacities(sweep_cfg);

    let tasks: Vec<Result<(f32, bool, SummaryMetrics), (f32, InvariantViolation)>> = caps
        .into_par_iter()
        .map(|capacity| {
            let mut sim = YearlySimulator::new(capacity, battery_cfg, delivery_cfg.clone(), solar);
            match sim.run_cancellable(cancel) {
                Ok((records, cancelled)) => {
                    let total_cycles = sim.battery().total_cycles();
                    let degradation_pct = sim.battery().degradation_pct();
                    let summary = summarize(capacity, &records, total_cycles, degradation_pct);
                    Ok((capacity, cancelled, summary))
                }
                Err(crate::error::SimError::Invariant(v)) => Err((capacity, v)),
                Err(_) => unreachable!("run_cancellable only raises SimError::Invariant"),
            }
        })
        .collect();

    let invariant_violations: Vec<(f32, InvariantViolation)> =
        tasks.iter().filter_map(|t| t.as_ref().err().cloned()).collect();
    let completed: Vec<(f32, bool, SummaryMetrics)> = tasks.into_iter().filter_map(Result::ok).collect();

    let cancelled = completed.iter().any(|(_, c, _)| *c);
    let completed_capacities: Vec<f32> = completed.iter().filter(|(_, c, _)| !c).map(|(cap, _, _)| *cap).collect();
    let mut summaries: Vec<SummaryMetrics> = completed.into_iter().filter(|(_, c, _)| !c).map(|(_, _, s)| s).collect();

    attach_marginals(&mut summaries);
    let optimal_capacity_mwh = select_optimal(&summaries, sweep_cfg.marginal_threshold);

    SweepResult {
        summaries,
        optimal_capacity_mwh,
        cancelled,
        completed_capacities,
        invariant_violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::HOURS_PER_YEAR;
    use std::sync::atomic::Ordering;

    fn battery_cfg() -> BatteryConfig {
        BatteryConfig {
            soc_min: 0.05,
            soc_max: 0.95,
            soc_init: 0.50,
            eta_rt: 0.87,
            c_charge: 1.0,
            c_discharge: 1.0,
            max_cycles_per_day: 2.0,
            degradation_per_cycle: 1.5e-5,
            aux_load_pct: 0.0,
        }
    }

    fn delivery_cfg() -> DeliveryConfig {
        DeliveryConfig {
            target_mw: 25.0,
            charge_threshold_mw: 0.0,
        }
    }

    fn sweep_cfg(min: f32, max: f32, step: f32) -> SweepConfig {
        SweepConfig {
            size_min: min,
            size_max: max,
            size_step: step,
            marginal_threshold: 30.0,
        }
    }

    fn varying_profile() -> SolarProfile {
        let mut hours = Vec::with_capacity(HOURS_PER_YEAR);
        for h in 0..HOURS_PER_YEAR {
            let hod = h % 24;
            let v = if (6..18).contains(&hod) { 40.0 } else { 0.0 };
            hours.push(v);
        }
        SolarProfile::new(hours).unwrap()
    }

    #[test]
    fn capacities_generates_inclusive_range() {
        let caps = capacities(&sweep_cfg(10.0, 30.0, 10.0));
        assert_eq!(caps, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn capacities_excludes_overshoot() {
        let caps = capacities(&sweep_cfg(10.0, 25.0, 10.0));
        assert_eq!(caps, vec![10.0, 20.0]);
    }

    #[test]
    fn s6_hours_delivered_is_monotonic_nondecreasing() {
        let solar = varying_profile();
        let result = run_sweep(&battery_cfg(), &delivery_cfg(), &sweep_cfg(50.0, 400.0, 50.0), &solar, None);
        assert!(!result.cancelled);
        let mut prev = 0u32;
        for s in &result.summaries {
            assert!(s.hours_delivered >= prev, "hours_delivered must be non-decreasing in capacity");
            prev = s.hours_delivered;
        }
    }

    #[test]
    fn optimal_is_none_for_empty_summaries() {
        assert_eq!(select_optimal(&[], 30.0), None);
    }

    #[test]
    fn optimal_falls_back_to_largest_when_no_knee() {
        let summaries = vec![
            SummaryMetrics {
                capacity_mwh: 50.0,
                hours_delivered: 1000,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: Some(100.0),
            },
            SummaryMetrics {
                capacity_mwh: 100.0,
                hours_delivered: 6000,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: None,
            },
        ];
        assert_eq!(select_optimal(&summaries, 30.0), Some(100.0));
    }

    #[test]
    fn optimal_picks_smallest_knee_that_stays_below_threshold() {
        let summaries = vec![
            SummaryMetrics {
                capacity_mwh: 50.0,
                hours_delivered: 1000,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: Some(10.0),
            },
            SummaryMetrics {
                capacity_mwh: 100.0,
                hours_delivered: 1500,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: Some(5.0),
            },
            SummaryMetrics {
                capacity_mwh: 200.0,
                hours_delivered: 1600,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: None,
            },
        ];
        assert_eq!(select_optimal(&summaries, 30.0), Some(50.0));
    }

    #[test]
    fn optimal_skips_false_knee_that_rises_again() {
        let summaries = vec![
            SummaryMetrics {
                capacity_mwh: 50.0,
                hours_delivered: 1000,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: Some(10.0),
            },
            SummaryMetrics {
                capacity_mwh: 100.0,
                hours_delivered: 2000,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: Some(50.0),
            },
            SummaryMetrics {
                capacity_mwh: 200.0,
                hours_delivered: 2100,
                total_wastage_mwh: 0.0,
                wastage_pct: 0.0,
                total_cycles: 0.0,
                avg_cycles_per_day: 0.0,
                degradation_pct: 0.0,
                marginal_hours_per_mwh: None,
            },
        ];
        assert_eq!(select_optimal(&summaries, 30.0), Some(100.0));
    }

    #[test]
    fn cancellation_marks_sweep_result_and_excludes_incomplete() {
        let solar = varying_profile();
        let flag = AtomicBool::new(false);
        flag.store(true, Ordering::Relaxed);
        let result = run_sweep(&battery_cfg(), &delivery_cfg(), &sweep_cfg(50.0, 150.0, 50.0), &solar, Some(&flag));
        assert!(result.cancelled);
        assert!(result.summaries.is_empty());
        assert!(result.completed_capacities.is_empty());
    }
}

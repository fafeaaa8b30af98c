//! Summary metrics derived from a complete per-hour record set (C4).

use super::types::HourlyRecord;

/// Per-capacity summary metrics (spec §3 `SummaryMetrics`, §4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    /// Battery capacity this summary was computed for (MWh).
    pub capacity_mwh: f32,
    /// Count of hours where `delivery == true`.
    pub hours_delivered: u32,
    /// Sum of `wastage_mwh` across the year.
    pub total_wastage_mwh: f32,
    /// `total_wastage_mwh / total solar`, as a percent. Zero if total solar is zero.
    pub wastage_pct: f32,
    /// Cumulative fractional cycles across the year.
    pub total_cycles: f32,
    /// `total_cycles / 365`.
    pub avg_cycles_per_day: f32,
    /// `total_cycles * degradation_per_cycle * 100`.
    pub degradation_pct: f32,
    /// Forward marginal hours/MWh against the next larger tested capacity.
    /// `None` at the largest capacity tested, since there is no "next".
    pub marginal_hours_per_mwh: Option<f32>,
}

/// Computes [`SummaryMetrics`] for one capacity's complete hourly record set.
///
/// `total_cycles` and `degradation_pct` come from the battery's own final
/// state rather than being re-derived from the record set, since
/// `HourlyRecord` does not carry a running cycle counter.
pub fn summarize(capacity_mwh: f32, records: &[HourlyRecord], total_cycles: f32, degradation_pct: f32) -> SummaryMetrics {
    let hours_delivered = records.iter().filter(|r| r.delivery).count() as u32;
    let total_wastage_mwh: f32 = records.iter().map(|r| r.wastage_mwh).sum();
    let total_solar_mwh: f32 = records.iter().map(|r| r.solar_mw).sum();
    let wastage_pct = if total_solar_mwh > 0.0 {
        total_wastage_mwh / total_solar_mwh * 100.0
    } else {
        0.0
    };

    SummaryMetrics {
        capacity_mwh,
        hours_delivered,
        total_wastage_mwh,
        wastage_pct,
        total_cycles,
        avg_cycles_per_day: total_cycles / 365.0,
        degradation_pct,
        marginal_hours_per_mwh: None,
    }
}

/// Fills in `marginal_hours_per_mwh` for every summary in `summaries`
/// (which must already be sorted by ascending `capacity_mwh`) against the
/// next larger tested capacity. The largest capacity is left `None`.
pub fn attach_marginals(summaries: &mut [SummaryMetrics]) {
    let len = summaries.len();
    for i in 0..len.saturating_sub(1) {
        let (lo, hi) = (&summaries[i], &summaries[i + 1]);
        let d_capacity = hi.capacity_mwh - lo.capacity_mwh;
        let marginal = if d_capacity > 0.0 {
            (hi.hours_delivered as f32 - lo.hours_delivered as f32) / d_capacity
        } else {
            0.0
        };
        summaries[i].marginal_hours_per_mwh = Some(marginal);
    }
}

//! CSV writers for the summary and hourly reports.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::sim::summary::SummaryMetrics;
use crate::sim::types::HourlyRecord;

const SUMMARY_HEADER: &str = "Battery Size (MWh),Hours Delivered,Total Wastage (MWh),\
                               Wastage (%),Total Cycles,Avg Cycles/Day,Degradation (%),\
                               Marginal Hours/MWh";

const HOURLY_HEADER: &str = "Date (YYYY-MM-DD),Hour (0..23),Solar_Generation_MW,BESS_MW,\
                              BESS_Charge_MWh,SOC_%,Committed_MW,Deficit_MW,\
                              Delivery_Hour (Yes|No),Wastage_MWh,State (Idle|Charging|Discharging)";

/// Writes the summary report (one row per tested capacity) to a file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_summary_csv(summaries: &[SummaryMetrics], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_summary_csv(summaries, BufWriter::new(file))
}

/// Writes the summary report to any writer, matching the exact column
/// order and numeric precision of the summary CSV interface: capacities
/// and MWh to 1 decimal, percentages to 2 decimals, hours as integers,
/// marginal to 3 decimals.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_summary_csv(summaries: &[SummaryMetrics], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SUMMARY_HEADER.split(','))?;

    for s in summaries {
        wtr.write_record(&[
            format!("{:.1}", s.capacity_mwh),
            s.hours_delivered.to_string(),
            format!("{:.1}", s.total_wastage_mwh),
            format!("{:.2}", s.wastage_pct),
            s.total_cycles.to_string(),
            format!("{:.2}", s.avg_cycles_per_day),
            format!("{:.2}", s.degradation_pct),
            s.marginal_hours_per_mwh.map_or_else(String::new, |m| format!("{m:.3}")),
        ])?;
    }

    wtr.flush()
}

/// Writes the hourly report (8,760 rows for one capacity) to a file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_hourly_csv(records: &[HourlyRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_hourly_csv(records, BufWriter::new(file))
}

/// Writes the hourly report to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_hourly_csv(records: &[HourlyRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HOURLY_HEADER.split(','))?;

    for r in records {
        wtr.write_record(&[
            r.date.clone(),
            r.hour_of_day.to_string(),
            format!("{:.2}", r.solar_mw),
            format!("{:.2}", r.bess_mw),
            format!("{:.2}", r.stored_mwh),
            format!("{:.2}", r.soc_pct),
            format!("{:.2}", r.committed_mw),
            format!("{:.2}", r.deficit_mw),
            if r.delivery { "Yes".to_string() } else { "No".to_string() },
            format!("{:.2}", r.wastage_mwh),
            r.state.to_string(),
        ])?;
    }

    wtr.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::OperatingState;

    fn summary(capacity: f32, marginal: Option<f32>) -> SummaryMetrics {
        SummaryMetrics {
            capacity_mwh: capacity,
            hours_delivered: 6000,
            total_wastage_mwh: 123.456,
            wastage_pct: 4.321,
            total_cycles: 365.5,
            avg_cycles_per_day: 1.001,
            degradation_pct: 0.0054,
            marginal_hours_per_mwh: marginal,
        }
    }

    fn hour(hour_of_day: u32) -> HourlyRecord {
        HourlyRecord {
            hour: 10,
            date: "2024-01-01".to_string(),
            hour_of_day,
            solar_mw: 35.123,
            bess_mw: -10.456,
            stored_mwh: 69.333,
            soc_pct: 69.333,
            committed_mw: 25.0,
            deficit_mw: 0.0,
            delivery: true,
            wastage_mwh: 0.0,
            state: OperatingState::Charging,
        }
    }

    #[test]
    fn summary_header_matches_exactly() {
        let mut buf = Vec::new();
        write_summary_csv(&[], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output.lines().next().unwrap(),
            "Battery Size (MWh),Hours Delivered,Total Wastage (MWh),Wastage (%),\
             Total Cycles,Avg Cycles/Day,Degradation (%),Marginal Hours/MWh"
        );
    }

    #[test]
    fn summary_row_precision() {
        let mut buf = Vec::new();
        write_summary_csv(&[summary(100.0, Some(12.3456))], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let row = output.lines().nth(1).unwrap();
        assert_eq!(row, "100.0,6000,123.5,4.32,365.5,1.00,0.01,12.346");
    }

    #[test]
    fn summary_row_blank_marginal_at_max_capacity() {
        let mut buf = Vec::new();
        write_summary_csv(&[summary(500.0, None)], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let row = output.lines().nth(1).unwrap();
        assert!(row.ends_with(','));
    }

    #[test]
    fn hourly_header_matches_exactly() {
        let mut buf = Vec::new();
        write_hourly_csv(&[], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output.lines().next().unwrap(),
            "Date (YYYY-MM-DD),Hour (0..23),Solar_Generation_MW,BESS_MW,BESS_Charge_MWh,SOC_%,\
             Committed_MW,Deficit_MW,Delivery_Hour (Yes|No),Wastage_MWh,State (Idle|Charging|Discharging)"
        );
    }

    #[test]
    fn hourly_row_count_matches_input() {
        let records: Vec<HourlyRecord> = (0..24).map(hour).collect();
        let mut buf = Vec::new();
        write_hourly_csv(&records, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn hourly_row_delivery_and_state_text() {
        let mut buf = Vec::new();
        write_hourly_csv(&[hour(5)], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let row = output.lines().nth(1).unwrap();
        assert!(row.contains("Yes"));
        assert!(row.ends_with("Charging"));
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<HourlyRecord> = (0..5).map(hour).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_hourly_csv(&records, &mut buf1).unwrap();
        write_hourly_csv(&records, &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }
}

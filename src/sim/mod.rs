/// Yearly dispatch simulator (C3): drives the hourly dispatch decision
/// across a full year and accumulates per-hour records.
pub mod engine;
/// Summary metrics derived from a complete per-hour record set (C4).
pub mod summary;
pub mod types;

/// CSV solar profile loader (CLI-only; the simulation core never touches the filesystem).
pub mod solar;
/// CSV summary and hourly report writers.
pub mod report;

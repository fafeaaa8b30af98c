//! Solar profile CSV ingestion. CLI-only convenience: the simulation core
//! never touches the filesystem, it only ever sees a validated `SolarProfile`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::SimError;
use crate::sim::types::SolarProfile;

/// Loads a solar profile from a two-column `timestamp,solar_mw` CSV file
/// (header row `timestamp,solar_mw`, one row per hour, 8,760 rows).
///
/// # Errors
///
/// Returns `SimError::InputShape` if the file cannot be read, a value column
/// fails to parse, or the resulting profile does not have exactly 8,760
/// non-negative values.
pub fn load_csv(path: &Path) -> Result<SolarProfile, SimError> {
    let file = File::open(path)
        .map_err(|e| SimError::InputShape(format!("cannot open \"{}\": {e}", path.display())))?;
    load_csv_reader(BufReader::new(file))
}

/// Parses a solar profile from any reader, using the same format as
/// [`load_csv`]. Exposed separately so tests can exercise parsing without
/// touching the filesystem.
pub fn load_csv_reader(reader: impl std::io::Read) -> Result<SolarProfile, SimError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut hours = Vec::with_capacity(8_760);

    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| SimError::InputShape(format!("row {idx}: {e}")))?;
        let value_col = record.get(record.len() - 1).ok_or_else(|| {
            SimError::InputShape(format!("row {idx}: missing solar_mw column"))
        })?;
        let value: f32 = value_col
            .trim()
            .parse()
            .map_err(|_| SimError::InputShape(format!("row {idx}: \"{value_col}\" is not a number")))?;
        hours.push(value);
    }

    SolarProfile::new(hours)
}

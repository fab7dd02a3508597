//! Writing a trajectory to a CSV report with one row per output time.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;

use crate::error::SeirError;
use crate::log::info;
use crate::trajectory::Trajectory;

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, SeirError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(SeirError::ReportError(format!(
            "report files must be CSVs, got {}",
            path.display()
        ))),
    }
}

/// Writes `trajectory` to `path` with the columns
/// `t,susceptible,exposed,infected,recovered`.
///
/// # Errors
///
/// Returns `SeirError::ReportError` if `path` does not end in `.csv`, and I/O or CSV errors if
/// the file cannot be written.
pub fn write_trajectory_csv(trajectory: &Trajectory, path: &Path) -> Result<(), SeirError> {
    let file = generate_validate_filepath(path)?;
    let mut writer = Writer::from_writer(file);
    for row in trajectory.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} trajectory rows to {}", trajectory.len(), path.display());
    Ok(())
}

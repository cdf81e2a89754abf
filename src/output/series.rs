use std::path::Path;

use crate::error::{GwError, Result};
use crate::timeseries::TimeSeries;

/// Write a time column followed by one column per named series.
///
/// All series must share the first series' length; times come from the
/// first series.
pub fn write_series_csv<P: AsRef<Path>>(path: P, columns: &[(&str, &TimeSeries)]) -> Result<()> {
    let path = path.as_ref();
    let Some((_, reference)) = columns.first() else {
        return Err(GwError::InvalidInput("no series to write".into()));
    };
    if let Some((_, other)) = columns.iter().find(|(_, ts)| ts.len() != reference.len()) {
        return Err(GwError::LengthMismatch {
            raw: reference.len(),
            filtered: other.len(),
        });
    }

    let io_err = |e: csv::Error| GwError::Io(format!("{}: {}", path.display(), e));
    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;

    let mut header = vec!["time"];
    header.extend(columns.iter().map(|(name, _)| *name));
    writer.write_record(&header).map_err(io_err)?;

    for i in 0..reference.len() {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(reference.time_at(i).to_string());
        row.extend(columns.iter().map(|(_, ts)| ts.samples()[i].to_string()));
        writer.write_record(&row).map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| GwError::Io(format!("{}: {}", path.display(), e)))?;
    log::debug!("Wrote {} rows to {}", reference.len(), path.display());
    Ok(())
}

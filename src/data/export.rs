use std::path::Path;

use thiserror::Error;

use super::filter::FilteredView;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("flushing CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the records of `view` as CSV, derived columns included, using the
/// dataset's column order. Missing cells are written as empty fields.
pub fn write_csv<W: std::io::Write>(view: &FilteredView<'_>, out: W) -> Result<(), ExportError> {
    let columns = &view.dataset().column_names;
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns)?;
    for record in view.records() {
        writer.write_record(columns.iter().map(|c| record.get(c).to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_file(view: &FilteredView<'_>, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(view, std::io::BufWriter::new(file))?;
    log::info!("Exported {} records to {}", view.len(), path.display());
    Ok(())
}

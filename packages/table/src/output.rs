//! CSV materialization.

use std::path::{Path, PathBuf};

use chamadas_admission_models::ResultTable;

use crate::TableError;

/// Writes `table` to `path` as UTF-8 CSV with one header row.
///
/// The file is written next to its destination with a `.part` suffix and
/// renamed into place, so `path` never holds a truncated table. A table
/// without columns produces an empty file.
///
/// # Errors
///
/// Returns [`TableError::Io`] or [`TableError::Csv`] if the file cannot be
/// written. No file is left at `path` or at the temporary path on error.
pub fn write_csv(table: &ResultTable, path: &Path) -> Result<(), TableError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let part = part_path(path);

    if let Err(e) = write_rows(table, &part) {
        let _ = std::fs::remove_file(&part);
        return Err(e);
    }

    std::fs::rename(&part, path).map_err(|e| {
        let _ = std::fs::remove_file(&part);
        io_error(path, e)
    })?;

    log::debug!("wrote {} row(s) to {}", table.len(), path.display());

    Ok(())
}

fn write_rows(table: &ResultTable, path: &Path) -> Result<(), TableError> {
    let csv_error = |source| TableError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

    if !table.columns.is_empty() {
        writer.write_record(&table.columns).map_err(csv_error)?;
        for row in &table.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
    }

    writer.flush().map_err(|e| io_error(path, e))
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> TableError {
    TableError::Io {
        path: path.display().to_string(),
        source,
    }
}

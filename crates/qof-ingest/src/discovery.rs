//! Measure file discovery.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::error::{IngestError, Result};

/// File name prefix of the per-period practice count extracts.
pub const PRACTICE_COUNT_PREFIX: &str = "input_practice_count";

/// A CSV file recognised as a measure table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureFile {
    /// Measure id captured from the file name.
    pub id: String,
    /// Path to the CSV file.
    pub path: PathBuf,
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        // Check for .csv extension (case-insensitive)
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            files.push(path);
        }
    }

    // Sort by filename
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Keeps the files whose name matches `pattern`, capturing the `id` group.
///
/// Files that do not match are skipped; the order of `csv_files` is kept.
pub fn discover_measure_files(csv_files: &[PathBuf], pattern: &Regex) -> Vec<MeasureFile> {
    let mut measures = Vec::new();
    for path in csv_files {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(id) = pattern
            .captures(file_name)
            .and_then(|captures| captures.name("id"))
        else {
            debug!(file = %file_name, "skipping file that is not a measure");
            continue;
        };
        measures.push(MeasureFile {
            id: id.as_str().to_string(),
            path: path.clone(),
        });
    }
    measures
}

/// Lists the practice count extracts (`input_practice_count*.csv`) in `dir`.
pub fn list_practice_count_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let files = list_csv_files(dir)?;
    Ok(files
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(PRACTICE_COUNT_PREFIX))
        })
        .collect())
}

//! Error types for measure file ingestion.

use std::path::PathBuf;

use qof_model::MeasureError;
use thiserror::Error;

/// Errors that can occur while locating and reading measure files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// The same column name appears twice in the header.
    #[error("duplicate column '{column}' in {path}")]
    DuplicateColumn { column: String, path: PathBuf },

    /// Required column not found.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

impl From<IngestError> for MeasureError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::FileNotFound { path } | IngestError::DirectoryNotFound { path } => {
                MeasureError::MissingFile { path }
            }
            IngestError::DirectoryRead { path, source } => MeasureError::Io { path, source },
            IngestError::MissingColumn { column, path } => MeasureError::MissingColumn {
                column,
                measure: path.display().to_string(),
            },
            IngestError::CsvParse { path, message } => {
                MeasureError::schema(path.display().to_string(), message)
            }
            IngestError::EmptyCsv { path } => {
                MeasureError::schema(path.display().to_string(), "file has no header row")
            }
            IngestError::DuplicateColumn { column, path } => MeasureError::schema(
                path.display().to_string(),
                format!("duplicate column '{column}'"),
            ),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

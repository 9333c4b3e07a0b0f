//! Errors raised while building or writing report outputs.

use std::path::PathBuf;

use qof_ingest::IngestError;
use qof_model::MeasureError;
use thiserror::Error;

/// Result alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("failed to serialize chart: {0}")]
    Json(#[from] serde_json::Error),

    #[error("measure pattern '{pattern}' did not match any measure names")]
    NoMatchingMeasures { pattern: String },

    #[error("invalid measure pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("panel chart has {count} panels, at most {max} are supported")]
    TooManyPanels { count: usize, max: usize },
}

impl ReportError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// True for missing files, directories or columns.
    pub fn is_missing_input(&self) -> bool {
        match self {
            Self::Measure(err) => err.is_missing_input(),
            Self::Ingest(
                IngestError::FileNotFound { .. }
                | IngestError::DirectoryNotFound { .. }
                | IngestError::MissingColumn { .. },
            ) => true,
            _ => false,
        }
    }
}

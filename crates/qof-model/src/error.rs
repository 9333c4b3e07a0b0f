//! Error types for measure table processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, reshaping or redacting a measure table.
///
/// Structural problems (missing files or columns) and data that cannot be
/// interpreted as counts abort processing of the measure. Empty tables are
/// not errors; callers log them and carry on.
#[derive(Debug, Error)]
pub enum MeasureError {
    // === Missing input ===
    /// Referenced input file does not exist.
    #[error("input file not found: {path}")]
    MissingFile { path: PathBuf },

    /// Referenced column is absent from the table.
    #[error("column '{column}' not found in measure '{measure}'")]
    MissingColumn { column: String, measure: String },

    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Schema mismatch ===
    /// A count or rate column holds a value that is not numeric.
    #[error("column '{column}' row {row}: expected a number, found '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// A count column holds a negative or fractional value.
    #[error("column '{column}' row {row}: expected a non-negative whole count, found {value}")]
    InvalidCount {
        column: String,
        row: usize,
        value: f64,
    },

    /// The table layout does not satisfy the expected column convention.
    #[error("measure '{measure}' does not match the expected layout: {reason}")]
    SchemaMismatch { measure: String, reason: String },

    // === Configuration ===
    /// Study configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    Frame { message: String },
}

impl MeasureError {
    pub fn schema(measure: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            measure: measure.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(column: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            measure: measure.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by absent files or columns.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            Self::MissingFile { .. } | Self::MissingColumn { .. } | Self::Io { .. }
        )
    }
}

#[cfg(feature = "polars")]
impl From<polars::prelude::PolarsError> for MeasureError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Frame {
            message: err.to_string(),
        }
    }
}

/// Result type for measure operations.
pub type Result<T> = std::result::Result<T, MeasureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_resource() {
        let err = MeasureError::missing_column("date", "ast_reg_total");
        assert_eq!(
            err.to_string(),
            "column 'date' not found in measure 'ast_reg_total'"
        );
        assert!(err.is_missing_input());
    }

    #[test]
    fn schema_mismatch_is_not_missing_input() {
        let err = MeasureError::schema("ast_reg_sex", "last column is 'value', expected 'date'");
        assert!(!err.is_missing_input());
        assert!(err.to_string().contains("ast_reg_sex"));
    }
}

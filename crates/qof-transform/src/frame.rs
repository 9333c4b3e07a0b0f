//! Measure frame types.
//!
//! A [`MeasureFrame`] wraps a Polars DataFrame with the measure id and the
//! resolved column roles, so downstream steps never have to guess which
//! column is the denominator.

use std::path::PathBuf;

use chrono::NaiveDate;
use polars::prelude::{DataFrame, NamedFrom, Series};
use qof_model::{MeasureError, MeasureShape, Result};

use crate::data_utils::{column_counts, column_floats, column_names, column_strings};

/// Provenance of a measure frame.
#[derive(Debug, Clone, Default)]
pub struct MeasureFrameMeta {
    /// The CSV file the frame was read from.
    pub source_file: Option<PathBuf>,
}

/// A measure table with its column roles.
///
/// Count columns hold `UInt64`, the rate column `Float64`, the date column
/// ISO `YYYY-MM-DD` strings and group columns nullable strings.
#[derive(Debug, Clone)]
pub struct MeasureFrame {
    /// Measure id, e.g. `ast_reg_sex`.
    pub id: String,
    /// The table contents.
    pub data: DataFrame,
    /// Resolved column roles.
    pub shape: MeasureShape,
    /// Optional provenance.
    pub meta: Option<MeasureFrameMeta>,
}

impl MeasureFrame {
    pub fn new(id: impl Into<String>, data: DataFrame, shape: MeasureShape) -> Self {
        Self {
            id: id.into(),
            data,
            shape,
            meta: None,
        }
    }

    /// Returns the number of rows in the frame.
    pub fn row_count(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.data)
    }

    pub fn numerators(&self) -> Result<Vec<Option<u64>>> {
        column_counts(&self.data, &self.shape.numerator, &self.id)
    }

    pub fn denominators(&self) -> Result<Vec<Option<u64>>> {
        column_counts(&self.data, &self.shape.denominator, &self.id)
    }

    pub fn rates(&self) -> Result<Vec<Option<f64>>> {
        column_floats(&self.data, &self.shape.rate, &self.id)
    }

    pub fn counts(&self, column: &str) -> Result<Vec<Option<u64>>> {
        column_counts(&self.data, column, &self.id)
    }

    pub fn floats(&self, column: &str) -> Result<Vec<Option<f64>>> {
        column_floats(&self.data, column, &self.id)
    }

    pub fn strings(&self, column: &str) -> Result<Vec<Option<String>>> {
        column_strings(&self.data, column, &self.id)
    }

    /// Period start of every row.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let raw = column_strings(&self.data, &self.shape.date, &self.id)?;
        raw.into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.unwrap_or_default();
                NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                    MeasureError::schema(
                        self.id.as_str(),
                        format!("row {row}: '{value}' is not an ISO 8601 date"),
                    )
                })
            })
            .collect()
    }

    /// Group-by values per row, one entry per group-by column.
    pub fn group_keys(&self) -> Result<Vec<Vec<Option<String>>>> {
        let columns: Vec<Vec<Option<String>>> = self
            .shape
            .group_by
            .iter()
            .map(|column| self.strings(column))
            .collect::<Result<_>>()?;
        Ok((0..self.row_count())
            .map(|row| columns.iter().map(|values| values[row].clone()).collect())
            .collect())
    }

    /// Replace (or add) a column.
    pub fn set_column(&mut self, series: Series) -> Result<()> {
        self.data.with_column(series)?;
        Ok(())
    }

    /// Keep only the rows where `keep` is true.
    pub fn retain_rows(&self, keep: Vec<bool>) -> Result<Self> {
        let mask = Series::new("keep".into(), keep);
        let data = self.data.filter(mask.bool()?)?;
        Ok(Self {
            id: self.id.clone(),
            data,
            shape: self.shape.clone(),
            meta: self.meta.clone(),
        })
    }

    /// Get the source file that produced this frame.
    pub fn source_file(&self) -> Option<&PathBuf> {
        self.meta.as_ref().and_then(|m| m.source_file.as_ref())
    }

    /// Record the source file in the metadata.
    pub fn set_source_file(&mut self, path: PathBuf) {
        let meta = self.meta.get_or_insert_with(MeasureFrameMeta::default);
        meta.source_file = Some(path);
    }
}

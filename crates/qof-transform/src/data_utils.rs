//! Column extraction helpers.
//!
//! Internal utilities for reading typed values out of DataFrame columns.

use polars::prelude::{AnyValue, DataFrame};
use qof_ingest::{any_to_f64, any_to_string_non_empty};
use qof_model::{MeasureError, Result};

/// Read a count column. Nulls are missing; anything that is not a
/// non-negative whole number is an error.
pub fn column_counts(df: &DataFrame, name: &str, measure: &str) -> Result<Vec<Option<u64>>> {
    let series = df
        .column(name)
        .map_err(|_| MeasureError::missing_column(name, measure))?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        let count = match value {
            AnyValue::Null => None,
            AnyValue::UInt64(v) => Some(v),
            other => {
                let v = any_to_f64(other.clone()).ok_or_else(|| MeasureError::NonNumeric {
                    column: name.to_string(),
                    row: idx,
                    value: other.to_string(),
                })?;
                if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
                    return Err(MeasureError::InvalidCount {
                        column: name.to_string(),
                        row: idx,
                        value: v,
                    });
                }
                Some(v as u64)
            }
        };
        values.push(count);
    }
    Ok(values)
}

/// Read a float column. Nulls and NaN are missing.
pub fn column_floats(df: &DataFrame, name: &str, measure: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| MeasureError::missing_column(name, measure))?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        let parsed = match value {
            AnyValue::Null => None,
            other => Some(any_to_f64(other.clone()).ok_or_else(|| MeasureError::NonNumeric {
                column: name.to_string(),
                row: idx,
                value: other.to_string(),
            })?),
        };
        values.push(parsed.filter(|v| !v.is_nan()));
    }
    Ok(values)
}

/// Read a text column; empty strings are treated as missing.
pub fn column_strings(df: &DataFrame, name: &str, measure: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .map_err(|_| MeasureError::missing_column(name, measure))?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_string_non_empty(
            series.get(idx).unwrap_or(AnyValue::Null),
        ));
    }
    Ok(values)
}

/// Column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

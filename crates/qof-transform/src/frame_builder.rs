//! Measure frame construction.
//!
//! Builds typed Polars frames from raw CSV tables once column roles are known.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use qof_ingest::{CountCell, CsvTable, parse_count, parse_f64};
use qof_model::{MeasureError, MeasureShape, Result};

use crate::frame::MeasureFrame;

/// Build a frame for measure `id` from a raw table.
///
/// Count columns must hold non-negative whole numbers, the rate column any
/// number, and the date column an ISO 8601 date (a time part is dropped).
/// Every row must satisfy `numerator <= denominator` when both are present;
/// a violation means the column roles were assigned wrongly.
pub fn build_measure_frame(id: &str, table: &CsvTable, shape: MeasureShape) -> Result<MeasureFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.headers.len());
    for (col_idx, header) in table.headers.iter().enumerate() {
        let cells = table.column_values(col_idx);
        let series = if header == &shape.numerator || header == &shape.denominator {
            let mut values: Vec<Option<u64>> = Vec::with_capacity(table.rows.len());
            for (row, raw) in cells.enumerate() {
                values.push(count_cell(header, row, raw)?);
            }
            Series::new(header.as_str().into(), values)
        } else if header == &shape.rate {
            let mut values: Vec<Option<f64>> = Vec::with_capacity(table.rows.len());
            for (row, raw) in cells.enumerate() {
                let value = parse_f64(raw);
                if value.is_none() && !is_missing_marker(raw) {
                    return Err(MeasureError::NonNumeric {
                        column: header.clone(),
                        row,
                        value: raw.to_string(),
                    });
                }
                values.push(value);
            }
            Series::new(header.as_str().into(), values)
        } else if header == &shape.date {
            let mut values: Vec<String> = Vec::with_capacity(table.rows.len());
            for (row, raw) in cells.enumerate() {
                let date = parse_iso_date(raw).ok_or_else(|| {
                    MeasureError::schema(id, format!("row {row}: '{raw}' is not an ISO 8601 date"))
                })?;
                values.push(date.format("%Y-%m-%d").to_string());
            }
            Series::new(header.as_str().into(), values)
        } else {
            let values: Vec<Option<String>> = cells
                .map(|raw| {
                    if raw.is_empty() {
                        None
                    } else {
                        Some(raw.to_string())
                    }
                })
                .collect();
            Series::new(header.as_str().into(), values)
        };
        columns.push(series.into());
    }
    let data = DataFrame::new(columns)?;
    let frame = MeasureFrame::new(id, data, shape);
    check_count_order(&frame)?;
    Ok(frame)
}

fn count_cell(column: &str, row: usize, raw: &str) -> Result<Option<u64>> {
    match parse_count(raw) {
        CountCell::Missing => Ok(None),
        CountCell::Count(value) => Ok(Some(value)),
        CountCell::Invalid(value) => Err(MeasureError::InvalidCount {
            column: column.to_string(),
            row,
            value,
        }),
        CountCell::NotNumeric => Err(MeasureError::NonNumeric {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        }),
    }
}

fn is_missing_marker(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Parse `YYYY-MM-DD`, optionally followed by a time.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|datetime| datetime.date())
}

fn check_count_order(frame: &MeasureFrame) -> Result<()> {
    let numerators = frame.numerators()?;
    let denominators = frame.denominators()?;
    for (row, (numerator, denominator)) in numerators.iter().zip(&denominators).enumerate() {
        if let (Some(numerator), Some(denominator)) = (numerator, denominator)
            && numerator > denominator
        {
            return Err(MeasureError::schema(
                frame.id.as_str(),
                format!(
                    "row {row}: numerator '{}' ({numerator}) exceeds denominator '{}' ({denominator})",
                    frame.shape.numerator, frame.shape.denominator
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qof_model::ShapeSource;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| (*v).to_string()).collect())
                .collect(),
        }
    }

    fn shape() -> MeasureShape {
        MeasureShape {
            numerator: "num".to_string(),
            denominator: "den".to_string(),
            rate: "value".to_string(),
            date: "date".to_string(),
            group_by: vec!["sex".to_string()],
            source: ShapeSource::Positional,
        }
    }

    #[test]
    fn builds_typed_columns() {
        let table = table(
            &["sex", "num", "den", "value", "date"],
            &[
                &["F", "3", "120.0", "0.025", "2019-03-01"],
                &["", "", "110", "", "2019-03-01 00:00:00"],
            ],
        );
        let frame = build_measure_frame("ast_reg_sex", &table, shape()).unwrap();

        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.numerators().unwrap(), vec![Some(3), None]);
        assert_eq!(frame.denominators().unwrap(), vec![Some(120), Some(110)]);
        assert_eq!(frame.rates().unwrap(), vec![Some(0.025), None]);
        assert_eq!(
            frame.strings("sex").unwrap(),
            vec![Some("F".to_string()), None]
        );
        let dates = frame.dates().unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2019, 3, 1).unwrap());
    }

    #[test]
    fn rejects_non_numeric_counts() {
        let table = table(
            &["sex", "num", "den", "value", "date"],
            &[&["F", "three", "120", "0.025", "2019-03-01"]],
        );
        let err = build_measure_frame("ast_reg_sex", &table, shape()).unwrap_err();
        assert!(matches!(err, MeasureError::NonNumeric { row: 0, .. }));
    }

    #[test]
    fn rejects_bad_dates() {
        let table = table(
            &["sex", "num", "den", "value", "date"],
            &[&["F", "3", "120", "0.025", "March 2019"]],
        );
        let err = build_measure_frame("ast_reg_sex", &table, shape()).unwrap_err();
        assert!(matches!(err, MeasureError::SchemaMismatch { .. }));
    }

    #[test]
    fn rejects_numerator_above_denominator() {
        let table = table(
            &["sex", "num", "den", "value", "date"],
            &[&["F", "130", "120", "1.08", "2019-03-01"]],
        );
        let err = build_measure_frame("ast_reg_sex", &table, shape()).unwrap_err();
        assert!(err.to_string().contains("exceeds denominator"));
    }
}

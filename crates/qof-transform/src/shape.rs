//! Column role resolution.
//!
//! The measures framework writes tables as
//! `[..group_by.., numerator, denominator, value, date]`, so the roles of a
//! table can be recovered from its header alone. That convention is checked
//! rather than trusted; an explicit [`MeasureSchema`] takes precedence when
//! one is configured.

use qof_model::schema::DATE_COLUMN;
use qof_model::{MeasureError, MeasureSchema, MeasureShape, Result, ShapeSource};

/// Number of trailing columns with fixed roles.
const TRAILING_ROLE_COLUMNS: usize = 4;

/// Resolve column roles, preferring `schema` over positional inference.
pub fn resolve_shape(
    measure: &str,
    headers: &[String],
    schema: Option<&MeasureSchema>,
) -> Result<MeasureShape> {
    match schema {
        Some(schema) => shape_from_schema(measure, headers, schema),
        None => infer_positional_shape(measure, headers),
    }
}

/// Infer column roles from the trailing column order.
///
/// The denominator is the third-from-last column and the group-by columns
/// are every column before the numerator.
pub fn infer_positional_shape(measure: &str, headers: &[String]) -> Result<MeasureShape> {
    if headers.len() < TRAILING_ROLE_COLUMNS {
        return Err(MeasureError::schema(
            measure,
            format!(
                "expected at least {TRAILING_ROLE_COLUMNS} columns \
                 (numerator, denominator, rate, date), found {}",
                headers.len()
            ),
        ));
    }
    let width = headers.len();
    let date = &headers[width - 1];
    if !date.eq_ignore_ascii_case(DATE_COLUMN) {
        return Err(MeasureError::schema(
            measure,
            format!("last column is '{date}', expected '{DATE_COLUMN}'"),
        ));
    }
    let group_by = &headers[..width - TRAILING_ROLE_COLUMNS];
    if let Some(clash) = group_by
        .iter()
        .find(|column| column.eq_ignore_ascii_case(DATE_COLUMN))
    {
        return Err(MeasureError::schema(
            measure,
            format!("group-by column '{clash}' collides with the date column"),
        ));
    }
    Ok(MeasureShape {
        numerator: headers[width - 4].clone(),
        denominator: headers[width - 3].clone(),
        rate: headers[width - 2].clone(),
        date: date.clone(),
        group_by: group_by.to_vec(),
        source: ShapeSource::Positional,
    })
}

fn shape_from_schema(
    measure: &str,
    headers: &[String],
    schema: &MeasureSchema,
) -> Result<MeasureShape> {
    let required = [
        &schema.numerator,
        &schema.denominator,
        &schema.rate,
        &schema.date,
    ];
    for column in required.into_iter().chain(schema.group_by.iter()) {
        if !headers.contains(column) {
            return Err(MeasureError::missing_column(column.as_str(), measure));
        }
    }
    Ok(MeasureShape {
        numerator: schema.numerator.clone(),
        denominator: schema.denominator.clone(),
        rate: schema.rate.clone(),
        date: schema.date.clone(),
        group_by: schema.group_by.clone(),
        source: ShapeSource::Explicit,
    })
}

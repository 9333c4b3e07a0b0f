//! Category labelling for demographic columns.

use polars::prelude::{NamedFrom, Series};
use qof_model::{BinaryLabels, Result, Stratum};
use tracing::debug;

use crate::frame::MeasureFrame;

/// Replace coded values in every stratum column the frame carries.
///
/// Strata without a matching column are skipped. Returns the strata that
/// were labelled.
pub fn label_strata(frame: &mut MeasureFrame, strata: &[Stratum]) -> Result<Vec<Stratum>> {
    let columns = frame.column_names();
    let mut labelled = Vec::new();
    for stratum in strata {
        let column = stratum.as_str();
        if !columns.iter().any(|name| name == column) {
            continue;
        }
        let values: Vec<Option<String>> = frame
            .strings(column)?
            .iter()
            .map(|raw| stratum.category_label(raw.as_deref()))
            .collect();
        frame.set_column(Series::new(column.into(), values))?;
        debug!(measure = %frame.id, column, "labelled stratum");
        labelled.push(*stratum);
    }
    Ok(labelled)
}

/// Map a 0/1 flag column to display strings. Other values are kept as they
/// are.
pub fn convert_binary(
    frame: &mut MeasureFrame,
    column: &str,
    positive: &'static str,
    negative: &'static str,
) -> Result<()> {
    let labels = BinaryLabels { positive, negative };
    let values: Vec<Option<String>> = frame
        .strings(column)?
        .into_iter()
        .map(|raw| raw.map(|raw| labels.label(&raw).map_or(raw, str::to_string)))
        .collect();
    frame.set_column(Series::new(column.into(), values))
}

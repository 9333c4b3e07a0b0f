//! Time series charts for a single measure, one line per group.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use qof_transform::{MeasureFrame, drop_zero_denominator_rows};
use serde::Serialize;
use tracing::{debug, warn};

use crate::chart::{ChartPoint, ChartScale, ChartSeries, markers_in_range, parse_date_markers};
use crate::error::Result;

/// Options for [`build_group_chart`].
#[derive(Debug, Clone, Default)]
pub struct GroupChartOptions {
    pub scale: Option<ChartScale>,
    /// Vertical marker dates as written in the configuration.
    pub date_lines: Vec<String>,
}

/// Chart specification for one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupChart {
    pub measure: String,
    pub group_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ChartScale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub series: Vec<ChartSeries>,
    pub date_markers: Vec<NaiveDate>,
}

impl GroupChart {
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|series| series.points.len()).sum()
    }
}

/// Whether the measure is drawn as a single line.
///
/// Measures without group-by columns, and population totals (ids containing
/// `total`), are not split.
pub fn is_single_series(frame: &MeasureFrame) -> bool {
    !frame.shape.has_groups() || frame.id.contains("total")
}

/// Build the chart for a measure. Zero-denominator rows are not plotted and
/// rows with a missing group value are left out of grouped charts.
pub fn build_group_chart(frame: &MeasureFrame, options: &GroupChartOptions) -> Result<GroupChart> {
    let charted = drop_zero_denominator_rows(frame)?;
    let dates = charted.dates()?;
    let values = charted.rates()?;
    let factor = ChartScale::factor(options.scale);

    let point = |row: usize| ChartPoint {
        date: dates[row],
        value: values[row].map(|value| value * factor),
        ci_low: None,
        ci_high: None,
    };

    let series = if is_single_series(&charted) {
        let points: Vec<ChartPoint> = (0..charted.row_count()).map(point).collect();
        if points.is_empty() {
            Vec::new()
        } else {
            vec![ChartSeries::new(None, points)]
        }
    } else {
        let mut groups: BTreeMap<Vec<String>, Vec<ChartPoint>> = BTreeMap::new();
        let mut skipped = 0usize;
        for (row, key) in charted.group_keys()?.into_iter().enumerate() {
            match key.into_iter().collect::<Option<Vec<String>>>() {
                Some(key) => groups.entry(key).or_default().push(point(row)),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(measure = %frame.id, skipped, "rows with a missing group value not plotted");
        }
        groups
            .into_iter()
            .map(|(key, points)| ChartSeries::new(Some(key.join(", ")), points))
            .collect()
    };

    if series.is_empty() {
        warn!(measure = %frame.id, "no rows to chart");
    }

    let date_markers = match (dates.iter().min(), dates.iter().max()) {
        (Some(first), Some(last)) => {
            markers_in_range(&parse_date_markers(&options.date_lines), *first, *last)
        }
        _ => Vec::new(),
    };

    Ok(GroupChart {
        measure: frame.id.clone(),
        group_by: frame.shape.group_by.clone(),
        scale: options.scale,
        y_label: options.scale.map(|scale| scale.y_label().to_string()),
        series,
        date_markers,
    })
}

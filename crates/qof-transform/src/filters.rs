//! Row filters applied before charting.

use std::collections::{BTreeSet, HashSet};

use qof_model::Result;
use tracing::debug;

use crate::frame::MeasureFrame;

/// Drop rows whose denominator is zero. Missing denominators are kept.
pub fn drop_zero_denominator_rows(frame: &MeasureFrame) -> Result<MeasureFrame> {
    let keep: Vec<bool> = frame
        .denominators()?
        .iter()
        .map(|denominator| *denominator != Some(0))
        .collect();
    retain_logged(frame, keep, "zero denominator")
}

/// Drop rows with no value for `column`.
pub fn drop_missing_demographics(frame: &MeasureFrame, column: &str) -> Result<MeasureFrame> {
    let keep: Vec<bool> = frame
        .strings(column)?
        .iter()
        .map(Option::is_some)
        .collect();
    retain_logged(frame, keep, "missing demographic")
}

/// Drop practices that have no events over the whole period, i.e. every rate
/// for the practice is zero or missing.
pub fn drop_irrelevant_practices(frame: &MeasureFrame, practice_column: &str) -> Result<MeasureFrame> {
    let practices = frame.strings(practice_column)?;
    let rates = frame.rates()?;
    let relevant: HashSet<&str> = practices
        .iter()
        .zip(&rates)
        .filter_map(|(practice, value)| match (practice, value) {
            (Some(practice), Some(value)) if *value != 0.0 => Some(practice.as_str()),
            _ => None,
        })
        .collect();
    let keep: Vec<bool> = practices
        .iter()
        .map(|practice| {
            practice
                .as_deref()
                .is_some_and(|practice| relevant.contains(practice))
        })
        .collect();
    retain_logged(frame, keep, "irrelevant practice")
}

/// Percentage of `all_practices` that appear in the measure, rounded to two
/// decimal places. `None` when there are no reference practices.
pub fn practice_coverage(
    frame: &MeasureFrame,
    practice_column: &str,
    all_practices: &BTreeSet<String>,
) -> Result<Option<f64>> {
    if all_practices.is_empty() {
        return Ok(None);
    }
    let in_measure: BTreeSet<String> = frame.strings(practice_column)?.into_iter().flatten().collect();
    let percentage = in_measure.len() as f64 / all_practices.len() as f64 * 100.0;
    Ok(Some((percentage * 100.0).round() / 100.0))
}

fn retain_logged(frame: &MeasureFrame, keep: Vec<bool>, reason: &str) -> Result<MeasureFrame> {
    let dropped = keep.iter().filter(|keep| !**keep).count();
    if dropped > 0 {
        debug!(measure = %frame.id, dropped, reason, "dropped rows");
    }
    frame.retain_rows(keep)
}

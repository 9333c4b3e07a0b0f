//! Small-number suppression.
//!
//! Counts at or below the threshold `n` could identify individuals, so they
//! are hidden before a table leaves the secure environment. Hiding only the
//! small cells is not enough when the column total is published elsewhere:
//! the hidden cells must add up to more than `n` so none of them can be
//! recovered by subtraction.
//!
//! For each count column:
//!
//! 1. Visible values in `[0, n]` are candidates. If they sum to zero there is
//!    nothing to hide and the column is left alone.
//! 2. Candidates are hidden smallest first (ties by row order), adding each
//!    value to a running total. Every candidate is hidden.
//! 3. While the running total is still `<= n`, the
//!    [`SuppressionPolicy::Complementary`] policy hides the smallest
//!    remaining visible value. [`SuppressionPolicy::CandidatesOnly`] stops and
//!    the column is reported as partially protected.
//!
//! Numerator and denominator are handled independently, then the rate is
//! cleared on every row where either count is missing.
//!
//! Hiding every candidate can hide more cells than the fewest needed to pass
//! the threshold: `[0, 1, 2, 3, 4, 8]` with `n = 5` already exceeds the
//! threshold after four cells, but `4` is still hidden because no visible
//! value `<= n` may remain. The floor wins over minimal cardinality.

use polars::prelude::{NamedFrom, Series};
use qof_model::{Result, SuppressionOptions, SuppressionPolicy};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::frame::MeasureFrame;

/// Working copy of one count column during suppression.
#[derive(Debug, Clone)]
pub struct SuppressionState {
    values: Vec<Option<u64>>,
    threshold: u64,
    suppressed_total: u64,
    suppressed_rows: Vec<usize>,
}

impl SuppressionState {
    pub fn new(values: &[Option<u64>], threshold: u64) -> Self {
        Self {
            values: values.to_vec(),
            threshold,
            suppressed_total: 0,
            suppressed_rows: Vec::new(),
        }
    }

    /// Sum of the visible values at or below the threshold.
    pub fn candidate_total(&self) -> u64 {
        self.values
            .iter()
            .flatten()
            .filter(|value| **value <= self.threshold)
            .fold(0u64, |total, value| total.saturating_add(*value))
    }

    /// Row of the smallest visible value, earliest row on ties.
    fn smallest_visible(&self, candidates_only: bool) -> Option<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|value| (value, row)))
            .filter(|(value, _)| !candidates_only || *value <= self.threshold)
            .min()
            .map(|(_, row)| row)
    }

    fn hide(&mut self, row: usize) {
        if let Some(value) = self.values[row].take() {
            self.suppressed_total = self.suppressed_total.saturating_add(value);
            self.suppressed_rows.push(row);
        }
    }

    /// Apply the suppression rule and consume the state.
    pub fn run(mut self, column: &str, policy: SuppressionPolicy) -> ColumnSuppression {
        if self.candidate_total() > 0 {
            while let Some(row) = self.smallest_visible(true) {
                self.hide(row);
            }
            if policy == SuppressionPolicy::Complementary {
                while self.suppressed_total <= self.threshold {
                    let Some(row) = self.smallest_visible(false) else {
                        break;
                    };
                    self.hide(row);
                }
            }
        }
        let partial = !self.suppressed_rows.is_empty() && self.suppressed_total <= self.threshold;
        ColumnSuppression {
            column: column.to_string(),
            values: self.values,
            suppressed_rows: self.suppressed_rows,
            suppressed_total: self.suppressed_total,
            partial,
        }
    }
}

/// Result of suppressing one count column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSuppression {
    pub column: String,
    /// Column values after suppression; `None` is missing.
    #[serde(skip)]
    pub values: Vec<Option<u64>>,
    /// Rows hidden by this run, in the order they were hidden.
    pub suppressed_rows: Vec<usize>,
    /// Sum of the hidden values.
    #[serde(skip)]
    pub suppressed_total: u64,
    /// True when the hidden total did not exceed the threshold.
    pub partial: bool,
}

impl ColumnSuppression {
    pub fn suppressed_count(&self) -> usize {
        self.suppressed_rows.len()
    }
}

/// Suppress small values in a single count column.
pub fn suppress_counts(
    column: &str,
    values: &[Option<u64>],
    options: SuppressionOptions,
) -> ColumnSuppression {
    SuppressionState::new(values, options.threshold).run(column, options.policy)
}

/// What a redaction run changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactionReport {
    pub measure: String,
    pub threshold: u64,
    pub numerator: ColumnSuppression,
    pub denominator: ColumnSuppression,
    /// Rows whose rate was cleared because a count is missing.
    pub rate_rows_cleared: usize,
}

impl RedactionReport {
    pub fn total_suppressed(&self) -> usize {
        self.numerator.suppressed_count() + self.denominator.suppressed_count()
    }

    pub fn is_partial(&self) -> bool {
        self.numerator.partial || self.denominator.partial
    }
}

/// Redact the named numerator, denominator and rate columns of `frame`.
///
/// The input frame is left untouched; a redacted copy is returned together
/// with a report of the suppressed cells.
pub fn redact_columns(
    frame: &MeasureFrame,
    options: SuppressionOptions,
    numerator: &str,
    denominator: &str,
    rate: &str,
) -> Result<(MeasureFrame, RedactionReport)> {
    let numerator_values = frame.counts(numerator)?;
    let denominator_values = frame.counts(denominator)?;
    let rates = frame.floats(rate)?;

    let numerator_result = suppress_counts(numerator, &numerator_values, options);
    let denominator_result = suppress_counts(denominator, &denominator_values, options);

    let mut rate_rows_cleared = 0usize;
    let redacted_rates: Vec<Option<f64>> = rates
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let counts_visible = numerator_result.values[row].is_some()
                && denominator_result.values[row].is_some();
            if counts_visible {
                *value
            } else {
                if value.is_some() {
                    rate_rows_cleared += 1;
                }
                None
            }
        })
        .collect();

    for result in [&numerator_result, &denominator_result] {
        debug!(
            measure = %frame.id,
            column = %result.column,
            suppressed = result.suppressed_count(),
            "suppressed column"
        );
        if result.partial {
            warn!(
                measure = %frame.id,
                column = %result.column,
                threshold = options.threshold,
                "hidden values do not exceed the threshold; protection is partial"
            );
        }
    }

    let mut redacted = frame.clone();
    redacted.set_column(Series::new(numerator.into(), numerator_result.values.clone()))?;
    redacted.set_column(Series::new(
        denominator.into(),
        denominator_result.values.clone(),
    ))?;
    redacted.set_column(Series::new(rate.into(), redacted_rates))?;

    let report = RedactionReport {
        measure: frame.id.clone(),
        threshold: options.threshold,
        numerator: numerator_result,
        denominator: denominator_result,
        rate_rows_cleared,
    };
    info!(
        measure = %frame.id,
        suppressed = report.total_suppressed(),
        rate_rows_cleared,
        "redaction complete"
    );
    Ok((redacted, report))
}

/// Redact a measure using its resolved column roles.
pub fn redact_measure(
    frame: &MeasureFrame,
    options: SuppressionOptions,
) -> Result<(MeasureFrame, RedactionReport)> {
    let shape = frame.shape.clone();
    redact_columns(
        frame,
        options,
        &shape.numerator,
        &shape.denominator,
        &shape.rate,
    )
}

//! Rates and binomial confidence intervals.

use polars::prelude::{NamedFrom, Series};
use qof_model::Result;
use tracing::debug;

use crate::frame::MeasureFrame;

/// Lower confidence bound column added by [`add_confidence_intervals`].
pub const CI_LOW_COLUMN: &str = "ci_low";
/// Upper confidence bound column added by [`add_confidence_intervals`].
pub const CI_HIGH_COLUMN: &str = "ci_high";

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// `numerator / denominator * multiplier`, or `None` when either count is
/// missing or the denominator is zero.
pub fn rate(numerator: Option<u64>, denominator: Option<u64>, multiplier: f64) -> Option<f64> {
    match (numerator, denominator) {
        (Some(numerator), Some(denominator)) if denominator > 0 => {
            Some(numerator as f64 / denominator as f64 * multiplier)
        }
        _ => None,
    }
}

/// Normal-approximation interval `p ± 1.96 * sqrt(p(1 - p) / denominator)`
/// for an unscaled proportion `p`. The bounds are not clamped to `[0, 1]`.
pub fn confidence_interval(proportion: f64, denominator: u64) -> Option<(f64, f64)> {
    if denominator == 0 || !proportion.is_finite() {
        return None;
    }
    let half_width = Z_95 * (proportion * (1.0 - proportion) / denominator as f64).sqrt();
    Some((proportion - half_width, proportion + half_width))
}

/// Recompute the rate column from the counts.
///
/// Rows with a missing count or a zero denominator get a missing rate.
pub fn compute_rates(frame: &mut MeasureFrame, multiplier: f64) -> Result<()> {
    let numerators = frame.numerators()?;
    let denominators = frame.denominators()?;
    let rates: Vec<Option<f64>> = numerators
        .iter()
        .zip(&denominators)
        .map(|(numerator, denominator)| rate(*numerator, *denominator, multiplier))
        .collect();
    let missing = rates.iter().filter(|value| value.is_none()).count();
    debug!(measure = %frame.id, multiplier, missing, "computed rates");
    let column = frame.shape.rate.clone();
    frame.set_column(Series::new(column.as_str().into(), rates))
}

/// Add `ci_low` and `ci_high` columns, scaled by `multiplier`.
///
/// Bounds are only defined where the rate is present and the denominator is
/// positive.
pub fn add_confidence_intervals(frame: &mut MeasureFrame, multiplier: f64) -> Result<()> {
    let numerators = frame.numerators()?;
    let denominators = frame.denominators()?;
    let rates = frame.rates()?;

    let mut low = Vec::with_capacity(rates.len());
    let mut high = Vec::with_capacity(rates.len());
    for ((numerator, denominator), value) in numerators.iter().zip(&denominators).zip(&rates) {
        let bounds = match (numerator, denominator, value) {
            (Some(numerator), Some(denominator), Some(_)) if *denominator > 0 => {
                let proportion = *numerator as f64 / *denominator as f64;
                confidence_interval(proportion, *denominator)
            }
            _ => None,
        };
        low.push(bounds.map(|(lower, _)| lower * multiplier));
        high.push(bounds.map(|(_, upper)| upper * multiplier));
    }

    frame.set_column(Series::new(CI_LOW_COLUMN.into(), low))?;
    frame.set_column(Series::new(CI_HIGH_COLUMN.into(), high))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_requires_both_counts_and_a_positive_denominator() {
        assert_eq!(rate(Some(3), Some(120), 1.0), Some(0.025));
        assert_eq!(rate(Some(3), Some(120), 1000.0), Some(25.0));
        assert_eq!(rate(None, Some(120), 1.0), None);
        assert_eq!(rate(Some(3), None, 1.0), None);
        assert_eq!(rate(Some(0), Some(0), 1.0), None);
    }

    #[test]
    fn interval_matches_normal_approximation() {
        let (low, high) = confidence_interval(0.5, 100).unwrap();
        assert!((low - 0.402).abs() < 1e-12);
        assert!((high - 0.598).abs() < 1e-12);
    }

    #[test]
    fn interval_collapses_at_the_boundaries() {
        assert_eq!(confidence_interval(0.0, 50), Some((0.0, 0.0)));
        assert_eq!(confidence_interval(1.0, 50), Some((1.0, 1.0)));
        assert_eq!(confidence_interval(0.2, 0), None);
    }
}

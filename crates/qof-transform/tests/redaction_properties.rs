//! Property-based tests for small-number suppression.

use proptest::prelude::*;
use qof_ingest::CsvTable;
use qof_model::{MeasureShape, ShapeSource, SuppressionOptions, SuppressionPolicy};
use qof_transform::{build_measure_frame, redact_measure, suppress_counts};

fn policy() -> impl Strategy<Value = SuppressionPolicy> {
    prop_oneof![
        Just(SuppressionPolicy::CandidatesOnly),
        Just(SuppressionPolicy::Complementary),
    ]
}

fn column() -> impl Strategy<Value = Vec<Option<u64>>> {
    prop::collection::vec(prop::option::weighted(0.9, 0u64..40), 0..30)
}

/// Count pairs with numerator <= denominator.
fn count_rows() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec(
        (0u64..60).prop_flat_map(|denominator| (0..=denominator, Just(denominator))),
        1..25,
    )
}

fn measure_table(rows: &[(u64, u64)]) -> CsvTable {
    CsvTable {
        headers: ["region", "ast_reg", "population", "value", "date"]
            .iter()
            .map(|h| (*h).to_string())
            .collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(idx, (numerator, denominator))| {
                let value = if *denominator > 0 {
                    (*numerator as f64 / *denominator as f64).to_string()
                } else {
                    String::new()
                };
                vec![
                    format!("R{idx}"),
                    numerator.to_string(),
                    denominator.to_string(),
                    value,
                    "2020-04-01".to_string(),
                ]
            })
            .collect(),
    }
}

fn shape() -> MeasureShape {
    MeasureShape {
        numerator: "ast_reg".to_string(),
        denominator: "population".to_string(),
        rate: "value".to_string(),
        date: "date".to_string(),
        group_by: vec!["region".to_string()],
        source: ShapeSource::Positional,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Once anything is hidden, no visible value is at or below the threshold.
    #[test]
    fn no_small_value_survives(values in column(), threshold in 0u64..10, policy in policy()) {
        let options = SuppressionOptions::new(threshold).with_policy(policy);
        let result = suppress_counts("population", &values, options);
        if !result.suppressed_rows.is_empty() {
            for value in result.values.iter().flatten() {
                prop_assert!(*value > threshold, "visible {} <= {}", value, threshold);
            }
        }
    }

    /// Complementary suppression hides more than the threshold, or the whole
    /// column.
    #[test]
    fn complementary_total_exceeds_threshold(values in column(), threshold in 0u64..10) {
        let options = SuppressionOptions::new(threshold)
            .with_policy(SuppressionPolicy::Complementary);
        let result = suppress_counts("population", &values, options);
        if !result.suppressed_rows.is_empty() {
            let all_hidden = result.values.iter().all(Option::is_none);
            prop_assert!(result.suppressed_total > threshold || all_hidden);
            prop_assert_eq!(result.partial, result.suppressed_total <= threshold);
        }
    }

    /// Values are hidden in ascending order and never after a larger one.
    #[test]
    fn hiding_is_monotonic(values in column(), threshold in 0u64..10, policy in policy()) {
        let options = SuppressionOptions::new(threshold).with_policy(policy);
        let result = suppress_counts("population", &values, options);
        let hidden: Vec<u64> = result
            .suppressed_rows
            .iter()
            .filter_map(|row| values[*row])
            .collect();
        prop_assert!(hidden.windows(2).all(|pair| pair[0] <= pair[1]));
        if let Some(largest_hidden) = hidden.last() {
            for value in result.values.iter().flatten() {
                prop_assert!(value >= largest_hidden);
            }
        }
    }

    /// Running the suppression again hides nothing new.
    #[test]
    fn suppression_is_idempotent(values in column(), threshold in 0u64..10, policy in policy()) {
        let options = SuppressionOptions::new(threshold).with_policy(policy);
        let first = suppress_counts("population", &values, options);
        let second = suppress_counts("population", &first.values, options);
        prop_assert_eq!(second.values, first.values);
    }

    /// A rate is missing exactly where a count is hidden; visible counts with
    /// a positive denominator keep their original rate.
    #[test]
    fn rate_is_missing_iff_a_count_is(rows in count_rows(), policy in policy()) {
        let table = measure_table(&rows);
        let frame = build_measure_frame("ast_reg_region", &table, shape()).unwrap();
        let options = SuppressionOptions::default().with_policy(policy);
        let (redacted, _) = redact_measure(&frame, options).unwrap();

        let original_rates = frame.rates().unwrap();
        let numerators = redacted.numerators().unwrap();
        let denominators = redacted.denominators().unwrap();
        let rates = redacted.rates().unwrap();
        for row in 0..redacted.row_count() {
            if numerators[row].is_none() || denominators[row].is_none() {
                prop_assert!(rates[row].is_none(), "row {} kept rate {:?}", row, rates[row]);
            } else if denominators[row] > Some(0) {
                prop_assert!(rates[row].is_some(), "row {} lost its rate", row);
                prop_assert_eq!(rates[row], original_rates[row]);
            }
        }

        let (again, report) = redact_measure(&redacted, options).unwrap();
        prop_assert_eq!(report.total_suppressed(), 0);
        prop_assert_eq!(again.rates().unwrap(), rates);
    }
}

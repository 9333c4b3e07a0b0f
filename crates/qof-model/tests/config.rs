//! Tests for loading study configuration from TOML.

use std::fs;

use qof_model::{MeasureError, Stratum, StudyConfig, StudyConfigFile, SuppressionPolicy};
use tempfile::TempDir;

#[test]
fn loads_overrides_and_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("study.toml");
    fs::write(
        &path,
        r#"
study_start = "2020-04-01"
study_end = "2021-03-31"
suppression_threshold = 7
complementary_suppression = true
demographics = ["sex", "care_home", "sex"]
rate_multiplier = 1000.0

[schema]
numerator = "ast_population"
denominator = "population"
group_by = ["practice"]
"#,
    )
    .unwrap();

    let config = StudyConfig::load(Some(&path)).expect("load config");

    assert_eq!(config.suppression.threshold, 7);
    assert_eq!(config.suppression.policy, SuppressionPolicy::Complementary);
    assert_eq!(
        config.demographics,
        vec![Stratum::Sex, Stratum::CareHomeStatus]
    );
    assert!((config.rate_multiplier - 1000.0).abs() < f64::EPSILON);
    assert_eq!(config.indicator, "AST005");
    assert_eq!(config.vertical_lines.len(), 2);

    let schema = config.schema.expect("schema");
    assert_eq!(schema.numerator, "ast_population");
    assert_eq!(schema.rate, "value");
    assert_eq!(schema.date, "date");
    assert_eq!(schema.group_by, vec!["practice".to_string()]);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = StudyConfigFile::from_toml_str("suppression_treshold = 3\n").expect_err("typo");
    assert!(matches!(err, MeasureError::InvalidConfig { .. }));
}

#[test]
fn unknown_demographic_is_rejected() {
    let file = StudyConfigFile::from_toml_str("demographics = [\"shoe_size\"]\n").expect("parse");
    let err = file.validate().expect_err("unknown demographic");
    assert!(err.to_string().contains("shoe_size"));
}

#[test]
fn non_positive_multiplier_is_rejected() {
    let file = StudyConfigFile::from_toml_str("rate_multiplier = 0.0\n").expect("parse");
    assert!(file.validate().is_err());
}

#[test]
fn missing_file_is_missing_input() {
    let dir = TempDir::new().unwrap();
    let err = StudyConfig::load(Some(&dir.path().join("absent.toml"))).expect_err("missing");
    assert!(err.is_missing_input());
}

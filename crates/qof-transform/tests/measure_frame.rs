//! Loading measure files and preparing them for charts.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use qof_ingest::MeasureFile;
use qof_model::{MeasureError, MeasureSchema, ShapeSource, Stratum, SuppressionOptions};
use qof_transform::{
    CI_HIGH_COLUMN, CI_LOW_COLUMN, MeasureFrame, add_confidence_intervals, compute_rates,
    convert_binary, drop_irrelevant_practices, drop_missing_demographics,
    drop_zero_denominator_rows, label_strata, load_measure, practice_coverage, redact_measure,
};
use tempfile::TempDir;

fn write_measure(dir: &Path, id: &str, contents: &str) -> MeasureFile {
    let path = dir.join(format!("measure_{id}.csv"));
    fs::write(&path, contents).unwrap();
    MeasureFile {
        id: id.to_string(),
        path,
    }
}

fn load(contents: &str) -> MeasureFrame {
    let dir = TempDir::new().unwrap();
    let file = write_measure(dir.path(), "ast_reg_sex", contents);
    load_measure(&file, None).unwrap()
}

#[test]
fn loads_positional_layout() {
    let dir = TempDir::new().unwrap();
    let file = write_measure(
        dir.path(),
        "ast_reg_sex",
        "sex,ast_reg,population,value,date\n\
         F,3,120,0.025,2019-03-01\n\
         M,40,130,0.3077,2019-03-01\n",
    );
    let frame = load_measure(&file, None).unwrap();

    assert_eq!(frame.id, "ast_reg_sex");
    assert_eq!(frame.shape.source, ShapeSource::Positional);
    assert_eq!(frame.shape.numerator, "ast_reg");
    assert_eq!(frame.shape.denominator, "population");
    assert_eq!(frame.shape.group_by, vec!["sex".to_string()]);
    assert_eq!(frame.numerators().unwrap(), vec![Some(3), Some(40)]);
    assert_eq!(frame.source_file(), Some(&file.path));
}

#[test]
fn explicit_schema_overrides_column_order() {
    let dir = TempDir::new().unwrap();
    let file = write_measure(
        dir.path(),
        "ast_reg_total",
        "date,population,ast_reg,value\n2019-03-01,120,3,0.025\n",
    );
    let schema = MeasureSchema::new("ast_reg", "population");
    let frame = load_measure(&file, Some(&schema)).unwrap();

    assert_eq!(frame.shape.source, ShapeSource::Explicit);
    assert_eq!(frame.denominators().unwrap(), vec![Some(120)]);
    assert!(frame.shape.group_by.is_empty());
}

#[test]
fn positional_layout_requires_date_last() {
    let dir = TempDir::new().unwrap();
    let file = write_measure(
        dir.path(),
        "ast_reg_sex",
        "sex,ast_reg,population,date,value\nF,3,120,2019-03-01,0.025\n",
    );
    let err = load_measure(&file, None).unwrap_err();
    assert!(matches!(err, MeasureError::SchemaMismatch { .. }));
}

#[test]
fn missing_measure_file_is_missing_input() {
    let dir = TempDir::new().unwrap();
    let file = MeasureFile {
        id: "ast_reg_sex".to_string(),
        path: dir.path().join("measure_ast_reg_sex.csv"),
    };
    let err = load_measure(&file, None).unwrap_err();
    assert!(err.is_missing_input());
}

#[test]
fn empty_table_loads_as_empty_frame() {
    let frame = load("sex,ast_reg,population,value,date\n");
    assert!(frame.is_empty());
    let (redacted, report) = redact_measure(&frame, SuppressionOptions::default()).unwrap();
    assert!(redacted.is_empty());
    assert_eq!(report.total_suppressed(), 0);
}

#[test]
fn redaction_clears_rates_next_to_hidden_counts() {
    let frame = load(
        "sex,ast_reg,population,value,date\n\
         F,2,120,0.0167,2019-03-01\n\
         M,4,150,0.0267,2019-03-01\n\
         F,30,121,0.2479,2019-04-01\n",
    );
    let (redacted, report) = redact_measure(&frame, SuppressionOptions::default()).unwrap();

    assert_eq!(redacted.numerators().unwrap(), vec![None, None, Some(30)]);
    assert_eq!(
        redacted.denominators().unwrap(),
        vec![Some(120), Some(150), Some(121)]
    );
    assert_eq!(redacted.rates().unwrap(), vec![None, None, Some(0.2479)]);
    assert_eq!(report.numerator.suppressed_rows, vec![0, 1]);
    assert_eq!(report.rate_rows_cleared, 2);
    assert!(!report.is_partial());

    // The input frame is untouched.
    assert_eq!(frame.numerators().unwrap(), vec![Some(2), Some(4), Some(30)]);
}

#[test]
fn rates_and_intervals_are_scaled() {
    let mut frame = load(
        "sex,ast_reg,population,value,date\n\
         F,50,100,,2019-03-01\n\
         M,0,0,,2019-03-01\n\
         ,,80,,2019-03-01\n",
    );
    compute_rates(&mut frame, 1000.0).unwrap();
    add_confidence_intervals(&mut frame, 1000.0).unwrap();

    assert_eq!(frame.rates().unwrap(), vec![Some(500.0), None, None]);
    let low = frame.floats(CI_LOW_COLUMN).unwrap();
    let high = frame.floats(CI_HIGH_COLUMN).unwrap();
    assert!((low[0].unwrap() - 402.0).abs() < 1e-9);
    assert!((high[0].unwrap() - 598.0).abs() < 1e-9);
    assert_eq!(low[1], None);
    assert_eq!(high[2], None);
}

#[test]
fn zero_denominators_and_missing_demographics_are_dropped() {
    let frame = load(
        "sex,ast_reg,population,value,date\n\
         F,0,0,,2019-03-01\n\
         M,10,100,0.1,2019-03-01\n\
         ,10,90,0.111,2019-03-01\n\
         F,12,,,2019-04-01\n",
    );
    let charted = drop_zero_denominator_rows(&frame).unwrap();
    assert_eq!(charted.row_count(), 3);
    assert_eq!(charted.denominators().unwrap(), vec![Some(100), Some(90), None]);

    let complete = drop_missing_demographics(&charted, "sex").unwrap();
    assert_eq!(
        complete.strings("sex").unwrap(),
        vec![Some("M".to_string()), Some("F".to_string())]
    );
}

#[test]
fn retained_rows_keep_shape_and_source() {
    let frame = load(
        "sex,ast_reg,population,value,date\n\
         F,8,100,0.08,2019-03-01\n\
         M,10,100,0.1,2019-03-01\n\
         F,12,100,0.12,2019-04-01\n",
    );
    let kept = frame.retain_rows(vec![true, false, true]).unwrap();

    assert_eq!(kept.row_count(), 2);
    assert_eq!(kept.shape, frame.shape);
    assert_eq!(kept.source_file(), frame.source_file());
    assert_eq!(kept.numerators().unwrap(), vec![Some(8), Some(12)]);
}

#[test]
fn practices_without_events_are_dropped() {
    let frame = load(
        "practice,ast_reg,population,value,date\n\
         1,0,100,0.0,2019-03-01\n\
         1,0,100,0.0,2019-04-01\n\
         2,0,50,0.0,2019-03-01\n\
         2,5,50,0.1,2019-04-01\n\
         3,,40,,2019-03-01\n",
    );
    let relevant = drop_irrelevant_practices(&frame, "practice").unwrap();
    assert_eq!(
        relevant.strings("practice").unwrap(),
        vec![Some("2".to_string()), Some("2".to_string())]
    );
}

#[test]
fn practice_coverage_is_rounded_to_two_places() {
    let frame = load(
        "practice,ast_reg,population,value,date\n\
         1,1,10,0.1,2019-03-01\n\
         2,1,10,0.1,2019-03-01\n\
         2,1,10,0.1,2019-04-01\n",
    );
    let all: BTreeSet<String> = ["1", "2", "3"].iter().map(|p| (*p).to_string()).collect();
    assert_eq!(
        practice_coverage(&frame, "practice", &all).unwrap(),
        Some(66.67)
    );
    assert_eq!(
        practice_coverage(&frame, "practice", &BTreeSet::new()).unwrap(),
        None
    );
}

#[test]
fn strata_columns_are_labelled() {
    let mut frame = load(
        "ethnicity,ast_reg,population,value,date\n\
         1.0,3,30,0.1,2019-03-01\n\
         4,3,30,0.1,2019-03-01\n\
         ,3,30,0.1,2019-03-01\n",
    );
    let labelled = label_strata(&mut frame, &[Stratum::Sex, Stratum::Ethnicity]).unwrap();
    assert_eq!(labelled, vec![Stratum::Ethnicity]);
    assert_eq!(
        frame.strings("ethnicity").unwrap(),
        vec![
            Some("White".to_string()),
            Some("Black".to_string()),
            Some("unknown".to_string()),
        ]
    );
}

#[test]
fn binary_columns_are_converted() {
    let mut frame = load(
        "learning_disability,ast_reg,population,value,date\n\
         0,3,30,0.1,2019-03-01\n\
         1,3,30,0.1,2019-03-01\n\
         ,3,30,0.1,2019-03-01\n",
    );
    convert_binary(&mut frame, "learning_disability", "LD", "No LD").unwrap();
    assert_eq!(
        frame.strings("learning_disability").unwrap(),
        vec![Some("No LD".to_string()), Some("LD".to_string()), None]
    );
}

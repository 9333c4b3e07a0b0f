//! Panel charts from a joined measures table.

use std::fs;
use std::path::PathBuf;

use qof_model::SuppressionOptions;
use qof_report::{
    ChartScale, MAX_PANELS, MeasureSelection, PanelChartOptions, ReportError, build_panel_chart,
    load_panel_table, redact_panel_rows, select_measures, write_panel_chart,
};
use tempfile::TempDir;

const JOINED: &str = "name,category,group,date,numerator,denominator,value\n\
                      ast_reg_sex,sex,F,2019-03-01,10,100,0.1\n\
                      ast_reg_sex,sex,M,2019-03-01,20,100,0.2\n\
                      ast_reg_region,region,London,2019-03-01,5,50,0.1\n\
                      ast_reg_region,region,unknown,2019-03-01,1,50,0.02\n\
                      ast_reg_region,region,London,2021-06-01,6,50,0.12\n\
                      event_total,total,,2019-03-01,7,70,0.1\n";

fn joined_file(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("measure_all.csv");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn pattern_selects_measures_and_labels_panels() {
    let dir = TempDir::new().unwrap();
    let rows = load_panel_table(&joined_file(&dir, JOINED)).unwrap();
    let selected =
        select_measures(rows, &MeasureSelection::Pattern("ast_reg_*".to_string())).unwrap();

    let mut options = PanelChartOptions::new("asthma_register_panels");
    options.exclude_group = Some("unknown".to_string());
    options.date_lines = vec!["2020-03-31".to_string(), "2022-03-31".to_string()];
    let chart = build_panel_chart(&selected, &options).unwrap();

    assert_eq!(chart.title, "Asthma Register Panels");
    assert_eq!(chart.columns, 2);
    assert_eq!(chart.rows, 1);
    let titles: Vec<&str> = chart.panels.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Region", "Sex"]);

    let region = &chart.panels[0];
    assert_eq!(region.category.as_deref(), Some("region"));
    assert_eq!(region.series.len(), 1);
    assert_eq!(region.series[0].label.as_deref(), Some("London"));
    assert_eq!(region.series[0].points.len(), 2);

    let markers: Vec<String> = chart.date_markers.iter().map(|d| d.to_string()).collect();
    assert_eq!(markers, vec!["2020-03-31"]);
}

#[test]
fn unmatched_pattern_is_an_error() {
    let dir = TempDir::new().unwrap();
    let rows = load_panel_table(&joined_file(&dir, JOINED)).unwrap();
    let err = select_measures(rows, &MeasureSelection::Pattern("copd_*".to_string())).unwrap_err();
    assert!(matches!(err, ReportError::NoMatchingMeasures { .. }));
}

#[test]
fn list_selection_keeps_named_measures() {
    let dir = TempDir::new().unwrap();
    let rows = load_panel_table(&joined_file(&dir, JOINED)).unwrap();
    let selected = select_measures(
        rows,
        &MeasureSelection::List(vec!["event_total".to_string()]),
    )
    .unwrap();
    assert_eq!(selected.len(), 1);

    let chart = build_panel_chart(&selected, &PanelChartOptions::new("totals")).unwrap();
    // The only measure has no group value, so nothing is drawn in its panel.
    assert_eq!(chart.panels.len(), 1);
    assert!(chart.panels[0].series.is_empty());
}

#[test]
fn confidence_intervals_are_scaled_with_values() {
    let dir = TempDir::new().unwrap();
    let rows = load_panel_table(&joined_file(&dir, JOINED)).unwrap();
    let selected = select_measures(
        rows,
        &MeasureSelection::List(vec!["ast_reg_sex".to_string()]),
    )
    .unwrap();
    let mut options = PanelChartOptions::new("sex");
    options.scale = Some(ChartScale::Percentage);
    options.confidence_intervals = true;
    let chart = build_panel_chart(&selected, &options).unwrap();

    assert_eq!(chart.y_label.as_deref(), Some("Percentage"));
    let point = &chart.panels[0].series[0].points[0];
    assert!((point.value.unwrap() - 10.0).abs() < 1e-9);
    assert!((point.ci_low.unwrap() - 4.12).abs() < 1e-9);
    assert!((point.ci_high.unwrap() - 15.88).abs() < 1e-9);
}

#[test]
fn small_counts_and_zero_denominators_never_reach_panels() {
    let dir = TempDir::new().unwrap();
    let contents = "name,category,group,date,numerator,denominator,value\n\
                    ast_reg_sex,sex,F,2019-03-01,1,2,0.5\n\
                    ast_reg_sex,sex,M,2019-03-01,0,0,0\n\
                    ast_reg_sex,sex,F,2019-04-01,30,100,0.3\n\
                    ast_reg_sex,sex,M,2019-04-01,40,120,0.3333\n";
    let rows = load_panel_table(&joined_file(&dir, contents)).unwrap();
    let redacted = redact_panel_rows(rows, SuppressionOptions::new(5));

    assert_eq!(redacted.len(), 3);
    assert!(redacted.iter().all(|row| row.denominator != Some(0)));
    assert_eq!(redacted[0].numerator, None);
    assert_eq!(redacted[0].denominator, None);
    assert_eq!(redacted[0].value, None);
    assert_eq!(redacted[1].value, Some(0.3));

    let mut options = PanelChartOptions::new("sex");
    options.confidence_intervals = true;
    let chart = build_panel_chart(&redacted, &options).unwrap();
    let female = &chart.panels[0].series[0];
    assert_eq!(female.label.as_deref(), Some("F"));
    assert_eq!(female.points[0].value, None);
    assert_eq!(female.points[0].ci_low, None);
    assert_eq!(female.points[1].value, Some(0.3));

    let male = &chart.panels[0].series[1];
    assert_eq!(male.points.len(), 1);
    assert_eq!(male.points[0].date.to_string(), "2019-04-01");
}

#[test]
fn counts_are_suppressed_per_measure() {
    let dir = TempDir::new().unwrap();
    let contents = "name,category,group,date,numerator,denominator,value\n\
                    ast_reg_sex,sex,F,2019-03-01,3,100,0.03\n\
                    ast_reg_region,region,London,2019-03-01,30,100,0.3\n";
    let rows = load_panel_table(&joined_file(&dir, contents)).unwrap();
    let redacted = redact_panel_rows(rows, SuppressionOptions::new(5));

    assert_eq!(redacted[0].value, None);
    assert_eq!(redacted[1].numerator, Some(30));
    assert_eq!(redacted[1].value, Some(0.3));
}

#[test]
fn more_than_ten_panels_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut contents = String::from("name,category,group,date,numerator,denominator,value\n");
    for idx in 0..=MAX_PANELS {
        contents.push_str(&format!("measure_{idx},sex,F,2019-03-01,1,10,0.1\n"));
    }
    let rows = load_panel_table(&joined_file(&dir, &contents)).unwrap();
    let err = build_panel_chart(&rows, &PanelChartOptions::new("too_many")).unwrap_err();
    assert!(matches!(err, ReportError::TooManyPanels { count: 11, max: 10 }));
}

#[test]
fn odd_panel_counts_round_rows_up() {
    let dir = TempDir::new().unwrap();
    let mut contents = String::from("name,category,group,date,numerator,denominator,value\n");
    for idx in 0..5 {
        contents.push_str(&format!("measure_{idx},sex,F,2019-03-01,1,10,0.1\n"));
    }
    let rows = load_panel_table(&joined_file(&dir, &contents)).unwrap();
    let chart = build_panel_chart(&rows, &PanelChartOptions::new("five")).unwrap();
    assert_eq!(chart.rows, 3);
}

#[test]
fn missing_columns_are_missing_input() {
    let dir = TempDir::new().unwrap();
    let path = joined_file(&dir, "name,group,date,value\nast_reg_sex,F,2019-03-01,0.1\n");
    let err = load_panel_table(&path).unwrap_err();
    assert!(err.is_missing_input());
}

#[test]
fn panel_chart_is_written_under_its_output_name() {
    let dir = TempDir::new().unwrap();
    let rows = load_panel_table(&joined_file(&dir, JOINED)).unwrap();
    let chart = build_panel_chart(&rows, &PanelChartOptions::new("all_measures")).unwrap();
    let path = write_panel_chart(dir.path(), "all_measures", &chart).unwrap();
    assert_eq!(path, dir.path().join("all_measures.json"));
    assert!(fs::read_to_string(path).unwrap().contains("\"title\": \"All Measures\""));
}

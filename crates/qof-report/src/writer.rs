//! Output writers.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use polars::prelude::AnyValue;
use qof_ingest::any_to_string;
use qof_transform::MeasureFrame;
use serde::Serialize;
use tracing::info;

use crate::error::{ReportError, Result};
use crate::group_chart::GroupChart;
use crate::panel_chart::PanelChart;

/// File name of the redacted copy of measure `id`.
pub fn redacted_file_name(id: &str) -> String {
    format!("redacted_{id}.csv")
}

/// File name of the group chart of measure `id`.
pub fn group_chart_file_name(id: &str) -> String {
    format!("group_chart_{id}.json")
}

/// Write a measure frame as CSV with its original column layout.
///
/// Missing values are written as empty cells and whole-number floats without
/// a decimal point.
pub fn write_measure_csv(path: &Path, frame: &MeasureFrame) -> Result<()> {
    let csv_error = |err: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let file = File::create(path).map_err(|source| ReportError::write(path, source))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let df = &frame.data;
    writer
        .write_record(df.get_column_names().iter().map(|name| name.as_str()))
        .map_err(csv_error)?;
    let columns = df.get_columns();
    for idx in 0..df.height() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        writer.write_record(&record).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|source| ReportError::write(path, source))?;
    Ok(())
}

/// Write `redacted_<id>.csv` into `output_dir`.
pub fn write_redacted_csv(output_dir: &Path, frame: &MeasureFrame) -> Result<PathBuf> {
    create_dir(output_dir)?;
    let path = output_dir.join(redacted_file_name(&frame.id));
    write_measure_csv(&path, frame)?;
    info!(measure = %frame.id, path = %path.display(), rows = frame.row_count(), "wrote redacted table");
    Ok(path)
}

/// Write `group_chart_<id>.json` into `output_dir`.
pub fn write_group_chart(output_dir: &Path, chart: &GroupChart) -> Result<PathBuf> {
    let path = output_dir.join(group_chart_file_name(&chart.measure));
    write_json(&path, chart)?;
    info!(measure = %chart.measure, path = %path.display(), series = chart.series.len(), "wrote group chart");
    Ok(path)
}

/// Write `<output_name>.json` into `output_dir`.
pub fn write_panel_chart(output_dir: &Path, output_name: &str, chart: &PanelChart) -> Result<PathBuf> {
    let path = output_dir.join(format!("{output_name}.json"));
    write_json(&path, chart)?;
    info!(path = %path.display(), panels = chart.panels.len(), "wrote panel chart");
    Ok(path)
}

/// Pretty-print `value` as JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, format!("{json}\n")).map_err(|source| ReportError::write(path, source))
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::write(dir, source))
}

//! Pipeline entry points behind the CLI commands.
//!
//! Every run follows the same stages:
//! 1. **Config**: load `study.toml` (or defaults), apply flag overrides, validate
//! 2. **Discover**: find measure files by name pattern
//! 3. **Transform**: load, redact and prepare each measure on its own copy
//! 4. **Output**: write redacted CSV tables or JSON chart specifications
//!
//! A measure that fails to parse is reported and skipped; missing input
//! aborts the run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span, trace, warn};

use qof_ingest::{
    MeasureFile, discover_measure_files, list_csv_files, list_practice_count_files,
    read_practice_ids,
};
use qof_model::{
    MeasureError, MeasureSchema, Stratum, StudyConfig, StudyConfigFile, SuppressionPolicy,
};
use qof_report::{
    ChartScale, GroupChartOptions, MeasureSelection, PanelChartOptions, build_group_chart,
    build_panel_chart, load_panel_table, redact_panel_rows, select_measures, write_group_chart,
    write_panel_chart, write_redacted_csv,
};
use qof_transform::{
    ColumnSuppression, MeasureFrame, RedactionReport, compute_rates, drop_irrelevant_practices,
    drop_missing_demographics, drop_zero_denominator_rows, label_strata, load_measure,
    practice_coverage, redact_measure,
};

use crate::logging::redact_value;
use crate::types::{ChartRun, ChartSummary, MeasureSummary, RedactionRun};

/// Column holding practice identifiers in practice-level measures.
pub const PRACTICE_COLUMN: &str = "practice";

// ============================================================================
// Stage 1: Config
// ============================================================================

/// Command line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub threshold: Option<u64>,
    pub complementary: bool,
    pub rate_multiplier: Option<f64>,
    pub date_lines: Option<Vec<String>>,
    pub schema: Option<MeasureSchema>,
}

/// Load the study configuration and apply `overrides`.
pub fn load_study_config(overrides: &ConfigOverrides) -> Result<StudyConfig> {
    let mut file = match &overrides.config_path {
        Some(path) => StudyConfigFile::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => StudyConfigFile::default(),
    };
    if let Some(threshold) = overrides.threshold {
        file.suppression_threshold = threshold;
    }
    if overrides.complementary {
        file.complementary_suppression = true;
    }
    if let Some(multiplier) = overrides.rate_multiplier {
        file.rate_multiplier = multiplier;
    }
    if let Some(lines) = &overrides.date_lines {
        file.vertical_lines.clone_from(lines);
    }
    if let Some(schema) = &overrides.schema {
        file.schema = Some(schema.clone());
    }
    let config = file.validate().context("validate config")?;
    debug!(
        threshold = config.suppression.threshold,
        complementary = config.suppression.policy == SuppressionPolicy::Complementary,
        multiplier = config.rate_multiplier,
        study_start = %config.study_start,
        study_end = %config.study_end,
        "study configuration"
    );
    Ok(config)
}

// ============================================================================
// Stage 2: Discover
// ============================================================================

/// Measure files in `input_dir` whose names match the configured pattern.
pub fn discover_measures(input_dir: &Path, config: &StudyConfig) -> Result<Vec<MeasureFile>> {
    let csv_files = list_csv_files(input_dir)
        .with_context(|| format!("list csv files in {}", input_dir.display()))?;
    let measures = discover_measure_files(&csv_files, &config.measure_file_pattern);
    if measures.is_empty() {
        warn!(
            input_dir = %input_dir.display(),
            pattern = %config.measure_file_pattern,
            "no measure files found"
        );
    } else {
        info!(count = measures.len(), "discovered measure files");
    }
    Ok(measures)
}

/// Practice ids from every practice count file in `input_dir`.
pub fn known_practices(input_dir: &Path) -> Result<BTreeSet<String>> {
    let files = list_practice_count_files(input_dir).context("list practice count files")?;
    if files.is_empty() {
        return Ok(BTreeSet::new());
    }
    let practices = read_practice_ids(&files, PRACTICE_COLUMN).context("read practice ids")?;
    info!(files = files.len(), practices = practices.len(), "loaded practice counts");
    Ok(practices)
}

// ============================================================================
// Stage 3/4: Redact and write
// ============================================================================

/// Redact every measure in `input_dir` and write `redacted_<id>.csv` files.
pub fn run_redaction(input_dir: &Path, output_dir: &Path, config: &StudyConfig) -> Result<RedactionRun> {
    let span = info_span!("redact", input_dir = %input_dir.display());
    let _guard = span.enter();

    let measures = discover_measures(input_dir, config)?;
    let practices = known_practices(input_dir)?;
    let mut run = RedactionRun {
        output_dir: output_dir.to_path_buf(),
        ..RedactionRun::default()
    };

    for file in &measures {
        let measure_span = info_span!("measure", id = %file.id);
        let _measure_guard = measure_span.enter();

        let Some(frame) = load_or_skip(file, config, &mut run.errors)? else {
            continue;
        };
        let (redacted, report) = redact_measure(&frame, config.suppression)
            .with_context(|| format!("redact {}", file.id))?;
        trace_suppressed(&frame, &report.numerator)?;
        trace_suppressed(&frame, &report.denominator)?;

        let coverage = if frame.column_names().iter().any(|c| c == PRACTICE_COLUMN) {
            practice_coverage(&frame, PRACTICE_COLUMN, &practices)?
        } else {
            None
        };
        if let Some(coverage) = coverage {
            info!(measure = %file.id, coverage, "practice coverage (%)");
        }

        let output = write_redacted_csv(output_dir, &redacted)
            .with_context(|| format!("write redacted {}", file.id))?;
        run.measures.push(summarize(&redacted, &report, coverage, Some(output)));
    }
    info!(
        measures = run.measures.len(),
        suppressed = run.total_suppressed(),
        errors = run.errors.len(),
        "redaction finished"
    );
    Ok(run)
}

fn summarize(
    frame: &MeasureFrame,
    report: &RedactionReport,
    practice_coverage: Option<f64>,
    output: Option<PathBuf>,
) -> MeasureSummary {
    MeasureSummary {
        id: frame.id.clone(),
        rows: frame.row_count(),
        suppressed_cells: report.total_suppressed(),
        rates_cleared: report.rate_rows_cleared,
        partial: report.is_partial(),
        practice_coverage,
        output,
    }
}

/// Record hidden cell values at trace level, redacted unless `--log-data`.
fn trace_suppressed(original: &MeasureFrame, suppression: &ColumnSuppression) -> Result<()> {
    if suppression.suppressed_rows.is_empty() {
        return Ok(());
    }
    let values = original.counts(&suppression.column)?;
    let hidden: Vec<String> = suppression
        .suppressed_rows
        .iter()
        .map(|row| {
            values
                .get(*row)
                .copied()
                .flatten()
                .map(|v| v.to_string())
                .unwrap_or_default()
        })
        .collect();
    trace!(
        column = %suppression.column,
        rows = ?suppression.suppressed_rows,
        values = %redact_value(&hidden.join(",")),
        "suppressed cells"
    );
    Ok(())
}

/// Load a measure. Parse failures are recorded and the measure skipped;
/// missing input is returned as an error.
fn load_or_skip(
    file: &MeasureFile,
    config: &StudyConfig,
    errors: &mut Vec<String>,
) -> Result<Option<MeasureFrame>> {
    match load_measure(file, config.schema.as_ref()) {
        Ok(frame) => {
            if frame.is_empty() {
                warn!(measure = %file.id, "empty measure table");
            }
            Ok(Some(frame))
        }
        Err(error) if error.is_missing_input() => {
            Err(error).with_context(|| format!("load {}", file.path.display()))
        }
        Err(error) => {
            warn!(measure = %file.id, %error, "skipping measure");
            errors.push(format!("{}: {error}", file.id));
            Ok(None)
        }
    }
}

// ============================================================================
// Group charts
// ============================================================================

/// Build and write `group_chart_<id>.json` for every measure.
///
/// Tables are redacted before charting. Rates are recomputed from the
/// visible counts with the configured multiplier, and only rows inside the
/// study period are drawn.
pub fn run_group_charts(
    input_dir: &Path,
    output_dir: &Path,
    config: &StudyConfig,
    scale: Option<ChartScale>,
) -> Result<ChartRun> {
    let span = info_span!("charts", input_dir = %input_dir.display());
    let _guard = span.enter();

    let measures = discover_measures(input_dir, config)?;
    let options = GroupChartOptions {
        scale,
        date_lines: config.vertical_lines.clone(),
    };
    let mut run = ChartRun {
        output_dir: output_dir.to_path_buf(),
        ..ChartRun::default()
    };

    for file in &measures {
        let measure_span = info_span!("measure", id = %file.id);
        let _measure_guard = measure_span.enter();

        let Some(frame) = load_or_skip(file, config, &mut run.errors)? else {
            continue;
        };
        let prepared = match prepare_for_chart(&frame, config) {
            Ok(prepared) => prepared,
            Err(error) => {
                warn!(measure = %file.id, %error, "skipping measure");
                run.errors.push(format!("{}: {error}", file.id));
                continue;
            }
        };
        let chart = build_group_chart(&prepared, &options)
            .with_context(|| format!("build chart {}", file.id))?;
        let output = write_group_chart(output_dir, &chart)
            .with_context(|| format!("write chart {}", file.id))?;
        run.charts.push(ChartSummary {
            id: file.id.clone(),
            series: chart.series.len(),
            points: chart.point_count(),
            output,
        });
    }
    info!(charts = run.charts.len(), errors = run.errors.len(), "charts finished");
    Ok(run)
}

/// Redact, label and filter a measure ahead of charting.
///
/// Zero denominators are dropped from the unredacted table, so a zero that
/// redaction would hide never reaches a chart as an empty point.
pub fn prepare_for_chart(frame: &MeasureFrame, config: &StudyConfig) -> Result<MeasureFrame, MeasureError> {
    let charted = drop_zero_denominator_rows(frame)?;
    let (mut prepared, _) = redact_measure(&charted, config.suppression)?;
    label_strata(&mut prepared, &config.demographics)?;

    let group_by = prepared.shape.group_by.clone();
    for column in &group_by {
        let is_demographic = Stratum::from_name(column)
            .is_some_and(|stratum| config.demographics.contains(&stratum));
        if is_demographic {
            prepared = drop_missing_demographics(&prepared, column)?;
        }
    }

    compute_rates(&mut prepared, config.rate_multiplier)?;
    if group_by.iter().any(|column| column == PRACTICE_COLUMN) {
        prepared = drop_irrelevant_practices(&prepared, PRACTICE_COLUMN)?;
    }

    let keep: Vec<bool> = prepared
        .dates()?
        .into_iter()
        .map(|date| config.in_study_period(date))
        .collect();
    prepared.retain_rows(keep)
}

// ============================================================================
// Panel charts
// ============================================================================

/// Inputs for a panel chart run.
#[derive(Debug, Clone)]
pub struct PanelRequest {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub output_name: String,
    pub selection: MeasureSelection,
    pub columns: usize,
    pub scale: Option<ChartScale>,
    pub confidence_intervals: bool,
    pub exclude_group: Option<String>,
}

/// Build and write `<output_name>.json` from a joined measures table.
///
/// Counts of the selected measures are redacted, and zero-denominator rows
/// dropped, before any panel is built.
pub fn run_panel_chart(request: &PanelRequest, config: &StudyConfig) -> Result<ChartSummary> {
    let span = info_span!("panel", output = %request.output_name);
    let _guard = span.enter();

    if request.output_name.trim().is_empty() {
        bail!("output name must not be empty");
    }
    let rows = load_panel_table(&request.input_file)
        .with_context(|| format!("load {}", request.input_file.display()))?;
    let selected = select_measures(rows, &request.selection)?;
    let redacted = redact_panel_rows(selected, config.suppression);

    let mut options = PanelChartOptions::new(&request.output_name);
    options.columns = request.columns;
    options.scale = request.scale;
    options.date_lines.clone_from(&config.vertical_lines);
    options.confidence_intervals = request.confidence_intervals;
    options.exclude_group.clone_from(&request.exclude_group);

    let chart = build_panel_chart(&redacted, &options)?;
    let output = write_panel_chart(&request.output_dir, &request.output_name, &chart)?;
    Ok(ChartSummary {
        id: request.output_name.clone(),
        series: chart.panels.iter().map(|panel| panel.series.len()).sum(),
        points: chart
            .panels
            .iter()
            .flat_map(|panel| &panel.series)
            .map(|series| series.points.len())
            .sum(),
        output,
    })
}

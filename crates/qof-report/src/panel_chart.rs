//! Multi-panel charts built from a joined measures table.
//!
//! The joined table has one row per measure, group and date, with the columns
//! `name`, `category`, `group`, `date`, `numerator`, `denominator` and
//! `value`. Each measure name becomes one panel and each group one line in
//! that panel. Rows go through [`redact_panel_rows`] before they are drawn.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use qof_ingest::{CountCell, IngestError, parse_count, parse_f64, read_csv_table};
use qof_model::{MeasureError, SuppressionOptions};
use qof_transform::{confidence_interval, suppress_counts};
use qof_transform::frame_builder::parse_iso_date;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::{
    ChartPoint, ChartScale, ChartSeries, filename_to_title, markers_in_range, parse_date_markers,
    title_case,
};
use crate::error::{ReportError, Result};

/// Panels beyond this make the grid unreadable.
pub const MAX_PANELS: usize = 10;

const JOINED_TABLE: &str = "joined measures";
const REQUIRED_COLUMNS: [&str; 7] = [
    "name",
    "category",
    "group",
    "date",
    "numerator",
    "denominator",
    "value",
];

/// One row of the joined measures table.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub name: String,
    pub category: Option<String>,
    pub group: Option<String>,
    pub date: NaiveDate,
    pub numerator: Option<u64>,
    pub denominator: Option<u64>,
    pub value: Option<f64>,
}

/// Which measures of the joined table to draw.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MeasureSelection {
    #[default]
    All,
    /// Shell-style glob over measure names (`*`, `?`, `[seq]`, `[!seq]`).
    Pattern(String),
    /// Exact measure names. An empty list selects everything.
    List(Vec<String>),
}

/// Options for [`build_panel_chart`].
#[derive(Debug, Clone)]
pub struct PanelChartOptions {
    /// Overall title, usually derived from the output name.
    pub title: String,
    pub columns: usize,
    pub scale: Option<ChartScale>,
    pub date_lines: Vec<String>,
    pub confidence_intervals: bool,
    /// Group label to leave out of every panel, e.g. `unknown`.
    pub exclude_group: Option<String>,
}

impl PanelChartOptions {
    pub fn new(output_name: &str) -> Self {
        Self {
            title: filename_to_title(output_name),
            columns: 2,
            scale: None,
            date_lines: Vec::new(),
            confidence_intervals: false,
            exclude_group: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub measure: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelChart {
    pub title: String,
    pub columns: usize,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ChartScale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub confidence_intervals: bool,
    pub panels: Vec<Panel>,
    pub date_markers: Vec<NaiveDate>,
}

/// Read the joined measures table.
pub fn load_panel_table(path: &Path) -> Result<Vec<PanelRow>> {
    let table = read_csv_table(path)?;
    let mut indices: HashMap<&str, usize> = HashMap::new();
    for column in REQUIRED_COLUMNS {
        let idx = table
            .column_index(column)
            .ok_or_else(|| IngestError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })?;
        indices.insert(column, idx);
    }
    let cell = |row: &Vec<String>, column: &str| -> String {
        indices
            .get(column)
            .and_then(|idx| row.get(*idx))
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };
    let non_empty = |value: String| if value.is_empty() { None } else { Some(value) };

    let mut rows = Vec::with_capacity(table.rows.len());
    for (idx, raw) in table.rows.iter().enumerate() {
        let date_text = cell(raw, "date");
        let date = parse_iso_date(&date_text).ok_or_else(|| {
            MeasureError::schema(
                JOINED_TABLE,
                format!("row {idx}: '{date_text}' is not an ISO 8601 date"),
            )
        })?;
        let numerator = count_cell(cell(raw, "numerator"), "numerator", idx)?;
        let denominator = count_cell(cell(raw, "denominator"), "denominator", idx)?;
        let name = cell(raw, "name");
        if name.is_empty() {
            return Err(
                MeasureError::schema(JOINED_TABLE, format!("row {idx}: empty measure name")).into(),
            );
        }
        rows.push(PanelRow {
            name,
            category: non_empty(cell(raw, "category")),
            group: non_empty(cell(raw, "group")),
            date,
            numerator,
            denominator,
            value: parse_f64(&cell(raw, "value")),
        });
    }
    debug!(path = %path.display(), rows = rows.len(), "loaded joined measures table");
    Ok(rows)
}

fn count_cell(text: String, column: &str, row: usize) -> Result<Option<u64>> {
    match parse_count(&text) {
        CountCell::Missing => Ok(None),
        CountCell::Count(value) => Ok(Some(value)),
        CountCell::Invalid(value) => Err(MeasureError::InvalidCount {
            column: column.to_string(),
            row,
            value,
        }
        .into()),
        CountCell::NotNumeric => Err(MeasureError::NonNumeric {
            column: column.to_string(),
            row,
            value: text,
        }
        .into()),
    }
}

/// Drop zero-denominator rows, then suppress small counts measure by measure.
///
/// Numerators and denominators of each measure name are suppressed as two
/// columns, the same way a single measure table is redacted. The value is
/// cleared on every row where either count ends up missing, so neither it nor
/// its confidence interval can be drawn.
pub fn redact_panel_rows(rows: Vec<PanelRow>, options: SuppressionOptions) -> Vec<PanelRow> {
    let before = rows.len();
    let mut rows: Vec<PanelRow> = rows
        .into_iter()
        .filter(|row| row.denominator != Some(0))
        .collect();
    if rows.len() < before {
        debug!(dropped = before - rows.len(), "dropped zero-denominator panel rows");
    }

    let mut by_measure: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        by_measure.entry(row.name.clone()).or_default().push(idx);
    }
    for (name, indices) in &by_measure {
        let numerators: Vec<Option<u64>> = indices.iter().map(|idx| rows[*idx].numerator).collect();
        let denominators: Vec<Option<u64>> =
            indices.iter().map(|idx| rows[*idx].denominator).collect();
        let numerator = suppress_counts("numerator", &numerators, options);
        let denominator = suppress_counts("denominator", &denominators, options);
        debug!(
            measure = %name,
            numerator = numerator.suppressed_count(),
            denominator = denominator.suppressed_count(),
            "suppressed panel counts"
        );
        if numerator.partial || denominator.partial {
            warn!(measure = %name, threshold = options.threshold, "small counts only partially protected");
        }
        for ((idx, numerator), denominator) in
            indices.iter().zip(numerator.values).zip(denominator.values)
        {
            let row = &mut rows[*idx];
            row.numerator = numerator;
            row.denominator = denominator;
            if numerator.is_none() || denominator.is_none() {
                row.value = None;
            }
        }
    }
    rows
}

/// Translate a shell glob into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str(r"\[");
                } else {
                    let body: String = chars[i + 1..j].iter().collect();
                    let body = body.replace('\\', r"\\");
                    out.push('[');
                    if let Some(rest) = body.strip_prefix('!') {
                        out.push('^');
                        out.push_str(rest);
                    } else if body.starts_with('^') {
                        out.push('\\');
                        out.push_str(&body);
                    } else {
                        out.push_str(&body);
                    }
                    out.push(']');
                    i = j;
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
        i += 1;
    }
    out.push('$');
    Regex::new(&out).map_err(|err| ReportError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

/// Keep the rows of the selected measures.
pub fn select_measures(rows: Vec<PanelRow>, selection: &MeasureSelection) -> Result<Vec<PanelRow>> {
    match selection {
        MeasureSelection::All => Ok(rows),
        MeasureSelection::List(names) if names.is_empty() => Ok(rows),
        MeasureSelection::List(names) => {
            let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
            Ok(rows
                .into_iter()
                .filter(|row| wanted.contains(row.name.as_str()))
                .collect())
        }
        MeasureSelection::Pattern(pattern) => {
            let regex = glob_to_regex(pattern)?;
            let selected: Vec<PanelRow> = rows
                .into_iter()
                .filter(|row| regex.is_match(&row.name))
                .collect();
            if selected.is_empty() {
                return Err(ReportError::NoMatchingMeasures {
                    pattern: pattern.clone(),
                });
            }
            Ok(selected)
        }
    }
}

/// Words (split on `_`) that occur in every measure name.
///
/// A word repeated within one name counts once per occurrence.
pub fn autoselect_labels<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let unique: BTreeSet<&str> = names.into_iter().collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in &unique {
        for word in name.split('_') {
            *counts.entry(word).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count == unique.len())
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Panel title from a measure name with the shared words removed.
pub fn panel_label(name: &str, repeated: &BTreeSet<String>) -> String {
    let words: Vec<&str> = name
        .split('_')
        .filter(|word| !repeated.contains(*word))
        .collect();
    title_case(&words.join(" "))
}

/// Build a panel chart from (already selected) joined rows.
pub fn build_panel_chart(rows: &[PanelRow], options: &PanelChartOptions) -> Result<PanelChart> {
    let mut by_measure: BTreeMap<&str, Vec<&PanelRow>> = BTreeMap::new();
    for row in rows {
        by_measure.entry(row.name.as_str()).or_default().push(row);
    }
    if by_measure.len() > MAX_PANELS {
        return Err(ReportError::TooManyPanels {
            count: by_measure.len(),
            max: MAX_PANELS,
        });
    }
    if by_measure.is_empty() {
        warn!(title = %options.title, "no measures selected for panel chart");
    }

    let columns = options.columns.max(1);
    let grid_rows = by_measure.len().div_ceil(columns);
    let repeated = autoselect_labels(by_measure.keys().copied());
    let factor = ChartScale::factor(options.scale);

    let panels: Vec<Panel> = by_measure
        .iter()
        .map(|(name, measure_rows)| {
            let mut groups: BTreeMap<&str, Vec<ChartPoint>> = BTreeMap::new();
            for row in measure_rows {
                let Some(group) = row.group.as_deref() else {
                    continue;
                };
                if options.exclude_group.as_deref() == Some(group) {
                    continue;
                }
                groups
                    .entry(group)
                    .or_default()
                    .push(panel_point(row, factor, options.confidence_intervals));
            }
            Panel {
                measure: (*name).to_string(),
                title: panel_label(name, &repeated),
                category: measure_rows.first().and_then(|row| row.category.clone()),
                series: groups
                    .into_iter()
                    .map(|(group, points)| ChartSeries::new(Some(group.to_string()), points))
                    .collect(),
            }
        })
        .collect();

    let date_markers = match (
        rows.iter().map(|row| row.date).min(),
        rows.iter().map(|row| row.date).max(),
    ) {
        (Some(first), Some(last)) => {
            markers_in_range(&parse_date_markers(&options.date_lines), first, last)
        }
        _ => Vec::new(),
    };

    info!(
        title = %options.title,
        panels = panels.len(),
        rows = grid_rows,
        columns,
        "built panel chart"
    );
    Ok(PanelChart {
        title: options.title.clone(),
        columns,
        rows: grid_rows,
        scale: options.scale,
        y_label: options.scale.map(|scale| scale.y_label().to_string()),
        confidence_intervals: options.confidence_intervals,
        panels,
        date_markers,
    })
}

fn panel_point(row: &PanelRow, factor: f64, with_ci: bool) -> ChartPoint {
    let bounds = if with_ci {
        row.value
            .zip(row.denominator)
            .and_then(|(value, denominator)| confidence_interval(value, denominator))
    } else {
        None
    };
    ChartPoint {
        date: row.date,
        value: row.value.map(|value| value * factor),
        ci_low: bounds.map(|(low, _)| low * factor),
        ci_high: bounds.map(|(_, high)| high * factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globs_translate_like_fnmatch() {
        let regex = glob_to_regex("ast_reg_*").unwrap();
        assert!(regex.is_match("ast_reg_sex"));
        assert!(!regex.is_match("event_ast_reg_sex"));

        let regex = glob_to_regex("ast_reg_[!s]*").unwrap();
        assert!(regex.is_match("ast_reg_region"));
        assert!(!regex.is_match("ast_reg_sex"));

        let regex = glob_to_regex("ast.reg?").unwrap();
        assert!(regex.is_match("ast.reg1"));
        assert!(!regex.is_match("astxreg1"));

        assert!(glob_to_regex("ast[").unwrap().is_match("ast["));
    }

    #[test]
    fn shared_words_are_removed_from_labels() {
        let names = ["ast_reg_sex", "ast_reg_age_band", "ast_reg_region"];
        let repeated = autoselect_labels(names);
        assert_eq!(
            repeated,
            BTreeSet::from(["ast".to_string(), "reg".to_string()])
        );
        assert_eq!(panel_label("ast_reg_age_band", &repeated), "Age Band");
    }

    #[test]
    fn single_measure_label_is_empty() {
        let repeated = autoselect_labels(["ast_reg_sex"]);
        assert_eq!(panel_label("ast_reg_sex", &repeated), "");
    }
}

//! Study configuration.
//!
//! [`StudyConfigFile`] is the raw, serde-facing form read from TOML. It is
//! turned into a [`StudyConfig`] by [`StudyConfigFile::validate`], which is
//! what every pipeline entry point receives.

use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MeasureError, Result};
use crate::schema::MeasureSchema;
use crate::stratum::Stratum;

/// QOF convention for small-number suppression.
pub const DEFAULT_SUPPRESSION_THRESHOLD: u64 = 5;

/// File names produced by the measures framework, e.g. `measure_ast_reg_sex.csv`.
pub const DEFAULT_MEASURE_FILE_PATTERN: &str = r"^measure_(?P<id>\w+)\.csv$";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What happens once every small value is hidden but the hidden total is
/// still at or below the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionPolicy {
    /// Stop; protection for that column is partial.
    #[default]
    CandidatesOnly,
    /// Keep hiding the smallest visible values until the total exceeds the
    /// threshold.
    Complementary,
}

/// Settings for the redaction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionOptions {
    pub threshold: u64,
    pub policy: SuppressionPolicy,
}

impl Default for SuppressionOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SUPPRESSION_THRESHOLD,
            policy: SuppressionPolicy::default(),
        }
    }
}

impl SuppressionOptions {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SuppressionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Raw configuration as written in `study.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfigFile {
    /// Study start date; should match the date in the project definition.
    pub study_start: String,
    /// Study end date; should match the date in the project definition.
    pub study_end: String,
    pub suppression_threshold: u64,
    pub complementary_suppression: bool,
    /// Demographic variables measures are broken down by.
    pub demographics: Vec<String>,
    pub rate_multiplier: f64,
    /// Vertical chart markers, e.g. financial year ends. Dates outside the
    /// charted range are not drawn; unparseable entries are skipped.
    pub vertical_lines: Vec<String>,
    pub measure_label: String,
    pub indicator: String,
    pub measure_file_pattern: String,
    pub schema: Option<MeasureSchema>,
}

impl Default for StudyConfigFile {
    fn default() -> Self {
        Self {
            study_start: "2019-03-01".to_string(),
            study_end: "2022-03-31".to_string(),
            suppression_threshold: DEFAULT_SUPPRESSION_THRESHOLD,
            complementary_suppression: false,
            demographics: Stratum::DEMOGRAPHICS
                .iter()
                .map(|stratum| stratum.as_str().to_string())
                .collect(),
            rate_multiplier: 1.0,
            vertical_lines: vec!["2020-03-31".to_string(), "2021-03-31".to_string()],
            measure_label: "Asthma register".to_string(),
            indicator: "AST005".to_string(),
            measure_file_pattern: DEFAULT_MEASURE_FILE_PATTERN.to_string(),
            schema: None,
        }
    }
}

impl StudyConfigFile {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| MeasureError::config(err.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MeasureError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| MeasureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check every setting and produce the typed configuration.
    pub fn validate(self) -> Result<StudyConfig> {
        let study_start = parse_config_date("study_start", &self.study_start)?;
        let study_end = parse_config_date("study_end", &self.study_end)?;
        if study_start > study_end {
            return Err(MeasureError::config(format!(
                "study_start {study_start} is after study_end {study_end}"
            )));
        }

        if !self.rate_multiplier.is_finite() || self.rate_multiplier <= 0.0 {
            return Err(MeasureError::config(format!(
                "rate_multiplier must be a positive number, got {}",
                self.rate_multiplier
            )));
        }

        let mut demographics: Vec<Stratum> = Vec::with_capacity(self.demographics.len());
        for name in &self.demographics {
            let stratum = Stratum::from_name(name)
                .ok_or_else(|| MeasureError::config(format!("unknown demographic '{name}'")))?;
            if !demographics.contains(&stratum) {
                demographics.push(stratum);
            }
        }

        let measure_file_pattern = Regex::new(&self.measure_file_pattern).map_err(|err| {
            MeasureError::config(format!("measure_file_pattern does not compile: {err}"))
        })?;
        if !measure_file_pattern
            .capture_names()
            .any(|name| name == Some("id"))
        {
            return Err(MeasureError::config(
                "measure_file_pattern must contain a named group 'id'",
            ));
        }

        if let Some(schema) = &self.schema {
            validate_schema(schema)?;
        }

        let policy = if self.complementary_suppression {
            SuppressionPolicy::Complementary
        } else {
            SuppressionPolicy::CandidatesOnly
        };

        Ok(StudyConfig {
            study_start,
            study_end,
            suppression: SuppressionOptions {
                threshold: self.suppression_threshold,
                policy,
            },
            demographics,
            rate_multiplier: self.rate_multiplier,
            vertical_lines: self.vertical_lines,
            measure_label: self.measure_label,
            indicator: self.indicator,
            measure_file_pattern,
            schema: self.schema,
        })
    }
}

/// Validated configuration passed into each pipeline entry point.
#[derive(Debug, Clone)]
pub struct StudyConfig {
    pub study_start: NaiveDate,
    pub study_end: NaiveDate,
    pub suppression: SuppressionOptions,
    pub demographics: Vec<Stratum>,
    pub rate_multiplier: f64,
    pub vertical_lines: Vec<String>,
    pub measure_label: String,
    pub indicator: String,
    pub measure_file_pattern: Regex,
    pub schema: Option<MeasureSchema>,
}

impl StudyConfig {
    /// Load and validate a TOML file, or validate the defaults when no path is
    /// given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => StudyConfigFile::load(path)?.validate(),
            None => StudyConfigFile::default().validate(),
        }
    }

    /// Whether `date` falls inside the study period (inclusive).
    pub fn in_study_period(&self, date: NaiveDate) -> bool {
        date >= self.study_start && date <= self.study_end
    }

    /// Extract the measure id from a file name, if it matches the pattern.
    pub fn measure_id(&self, file_name: &str) -> Option<String> {
        self.measure_file_pattern
            .captures(file_name)
            .and_then(|captures| captures.name("id"))
            .map(|id| id.as_str().to_string())
    }
}

fn parse_config_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|err| MeasureError::config(format!("{key} '{value}' is not a YYYY-MM-DD date: {err}")))
}

fn validate_schema(schema: &MeasureSchema) -> Result<()> {
    let mut names: Vec<&str> = vec![
        schema.numerator.as_str(),
        schema.denominator.as_str(),
        schema.rate.as_str(),
        schema.date.as_str(),
    ];
    names.extend(schema.group_by.iter().map(String::as_str));
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(MeasureError::config("schema column names must not be empty"));
    }
    for (idx, name) in names.iter().enumerate() {
        if names[..idx].contains(name) {
            return Err(MeasureError::config(format!(
                "schema assigns column '{name}' more than one role"
            )));
        }
    }
    Ok(())
}

//! Column roles of a measure table.

use serde::{Deserialize, Serialize};

/// Default name of the period column assigned by the measures framework.
pub const DATE_COLUMN: &str = "date";

/// Default name of the rate column written by the measures framework.
pub const RATE_COLUMN: &str = "value";

fn default_date() -> String {
    DATE_COLUMN.to_string()
}

fn default_rate() -> String {
    RATE_COLUMN.to_string()
}

/// Explicitly named column roles for a measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureSchema {
    pub numerator: String,
    pub denominator: String,
    #[serde(default = "default_rate")]
    pub rate: String,
    #[serde(default = "default_date")]
    pub date: String,
    #[serde(default)]
    pub group_by: Vec<String>,
}

impl MeasureSchema {
    pub fn new(numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
            rate: default_rate(),
            date: default_date(),
            group_by: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = rate.into();
        self
    }

    #[must_use]
    pub fn with_group_by(mut self, group_by: Vec<String>) -> Self {
        self.group_by = group_by;
        self
    }
}

/// How a [`MeasureShape`] was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeSource {
    /// Inferred from the trailing column order.
    Positional,
    /// Taken from a [`MeasureSchema`].
    Explicit,
}

/// Resolved column roles for a loaded measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureShape {
    pub numerator: String,
    pub denominator: String,
    pub rate: String,
    pub date: String,
    pub group_by: Vec<String>,
    pub source: ShapeSource,
}

impl MeasureShape {
    /// Numerator and denominator, in that order.
    pub fn count_columns(&self) -> [&str; 2] {
        [self.numerator.as_str(), self.denominator.as_str()]
    }

    pub fn has_groups(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Whether `column` plays a numeric role.
    pub fn is_numeric(&self, column: &str) -> bool {
        column == self.numerator || column == self.denominator || column == self.rate
    }
}

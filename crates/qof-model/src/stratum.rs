//! Demographic strata used to break measures down.
//!
//! The category lists mirror the values emitted by the extraction step so the
//! report layer can order series consistently and label coded values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A categorical breakdown dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Sex,
    AgeBand,
    Region,
    Imd,
    Ethnicity,
    LearningDisability,
    CareHomeStatus,
    Practice,
}

const SEX_CATEGORIES: &[&str] = &["F", "M"];

const AGE_BAND_CATEGORIES: &[&str] = &[
    "0-19", "20-29", "30-39", "40-49", "50-59", "60-69", "70-79", "80+",
];

const REGION_CATEGORIES: &[&str] = &[
    "North East",
    "North West",
    "Yorkshire and the Humber",
    "East Midlands",
    "West Midlands",
    "East of England",
    "London",
    "South East",
    "South West",
];

/// IMD quintiles; `0` means the address could not be matched.
const IMD_CATEGORIES: &[&str] = &["0", "1", "2", "3", "4", "5"];

const ETHNICITY_CATEGORIES: &[&str] = &["White", "Mixed", "Asian", "Black", "Other", "unknown"];

const LEARNING_DISABILITY_LABELS: BinaryLabels = BinaryLabels {
    positive: "Record of learning disability",
    negative: "No record of learning disability",
};

const CARE_HOME_LABELS: BinaryLabels = BinaryLabels {
    positive: "Record of positive care home status",
    negative: "No record of positive care home status",
};

/// Display strings for a 0/1 flag column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryLabels {
    pub positive: &'static str,
    pub negative: &'static str,
}

impl BinaryLabels {
    /// Label a raw flag value. Returns `None` for anything other than 0 or 1.
    pub fn label(&self, raw: &str) -> Option<&'static str> {
        match parse_code(raw)? {
            0 => Some(self.negative),
            1 => Some(self.positive),
            _ => None,
        }
    }
}

impl Stratum {
    /// The patient demographics measures are broken down by by default.
    pub const DEMOGRAPHICS: [Stratum; 7] = [
        Stratum::Sex,
        Stratum::AgeBand,
        Stratum::Region,
        Stratum::Imd,
        Stratum::Ethnicity,
        Stratum::LearningDisability,
        Stratum::CareHomeStatus,
    ];

    /// Column name used by the extraction step.
    pub fn as_str(self) -> &'static str {
        match self {
            Stratum::Sex => "sex",
            Stratum::AgeBand => "age_band",
            Stratum::Region => "region",
            Stratum::Imd => "imd",
            Stratum::Ethnicity => "ethnicity",
            Stratum::LearningDisability => "learning_disability",
            Stratum::CareHomeStatus => "care_home_status",
            Stratum::Practice => "practice",
        }
    }

    /// Parse a column name, accepting the short `care_home` spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let stratum = match normalized.as_str() {
            "sex" => Stratum::Sex,
            "age_band" => Stratum::AgeBand,
            "region" => Stratum::Region,
            "imd" => Stratum::Imd,
            "ethnicity" => Stratum::Ethnicity,
            "learning_disability" => Stratum::LearningDisability,
            "care_home_status" | "care_home" => Stratum::CareHomeStatus,
            "practice" => Stratum::Practice,
            _ => return None,
        };
        Some(stratum)
    }

    /// Human readable name, e.g. "Age band".
    pub fn label(self) -> &'static str {
        match self {
            Stratum::Sex => "Sex",
            Stratum::AgeBand => "Age band",
            Stratum::Region => "Region",
            Stratum::Imd => "IMD quintile",
            Stratum::Ethnicity => "Ethnicity",
            Stratum::LearningDisability => "Learning disability",
            Stratum::CareHomeStatus => "Care home status",
            Stratum::Practice => "Practice",
        }
    }

    /// Known categories after labelling. Practices are pseudonymous ids and
    /// have no fixed list.
    pub fn categories(self) -> Vec<&'static str> {
        match self {
            Stratum::Sex => SEX_CATEGORIES.to_vec(),
            Stratum::AgeBand => AGE_BAND_CATEGORIES.to_vec(),
            Stratum::Region => REGION_CATEGORIES.to_vec(),
            Stratum::Imd => IMD_CATEGORIES.to_vec(),
            Stratum::Ethnicity => ETHNICITY_CATEGORIES.to_vec(),
            Stratum::LearningDisability => {
                vec![
                    LEARNING_DISABILITY_LABELS.negative,
                    LEARNING_DISABILITY_LABELS.positive,
                ]
            }
            Stratum::CareHomeStatus => vec![CARE_HOME_LABELS.negative, CARE_HOME_LABELS.positive],
            Stratum::Practice => Vec::new(),
        }
    }

    /// Labels for flag strata.
    pub fn binary_labels(self) -> Option<BinaryLabels> {
        match self {
            Stratum::LearningDisability => Some(LEARNING_DISABILITY_LABELS),
            Stratum::CareHomeStatus => Some(CARE_HOME_LABELS),
            _ => None,
        }
    }

    /// Translate a raw value into its display category.
    ///
    /// Ethnicity codes 1-5 become group names and 0 or missing becomes
    /// "unknown"; flag strata use their binary labels. Values without a
    /// translation are returned unchanged, missing values stay missing.
    pub fn category_label(self, raw: Option<&str>) -> Option<String> {
        match self {
            Stratum::Ethnicity => Some(ethnicity_label(raw).to_string()),
            _ => {
                let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
                match self.binary_labels() {
                    Some(labels) => Some(labels.label(raw).unwrap_or(raw).to_string()),
                    None => Some(raw.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn ethnicity_label(raw: Option<&str>) -> &str {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return "unknown";
    };
    match parse_code(raw) {
        Some(1) => "White",
        Some(2) => "Mixed",
        Some(3) => "Asian",
        Some(4) => "Black",
        Some(5) => "Other",
        Some(0) => "unknown",
        _ => raw,
    }
}

/// Parse integer codes that may have been written as floats ("1.0").
fn parse_code(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(code) = trimmed.parse::<i64>() {
        return Some(code);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value.is_finite() {
        Some(value as i64)
    } else {
        None
    }
}

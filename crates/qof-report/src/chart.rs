//! Chart specification types shared by group and panel charts.
//!
//! Charts are written as JSON specifications; rendering them is left to the
//! consumer.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

/// How proportions are presented on the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartScale {
    /// Proportion × 100.
    Percentage,
    /// Proportion × 1000.
    Rate,
}

impl ChartScale {
    pub fn multiplier(self) -> f64 {
        match self {
            ChartScale::Percentage => 100.0,
            ChartScale::Rate => 1000.0,
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            ChartScale::Percentage => "Percentage",
            ChartScale::Rate => "Rate per thousand",
        }
    }

    /// Multiplier for an optional scale; unscaled charts plot the raw value.
    pub fn factor(scale: Option<Self>) -> f64 {
        scale.map_or(1.0, Self::multiplier)
    }
}

/// One plotted observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_high: Option<f64>,
}

/// A line on a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Legend entry; `None` for the single series of an ungrouped chart.
    pub label: Option<String>,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(label: Option<String>, mut points: Vec<ChartPoint>) -> Self {
        points.sort_by_key(|point| point.date);
        Self { label, points }
    }
}

/// Parse vertical marker dates, skipping entries that are not ISO dates.
pub fn parse_date_markers(raw: &[String]) -> Vec<NaiveDate> {
    let mut markers: Vec<NaiveDate> = raw
        .iter()
        .filter_map(|entry| match NaiveDate::parse_from_str(entry.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(marker = %entry, "skipping date marker that is not a YYYY-MM-DD date");
                None
            }
        })
        .collect();
    markers.sort_unstable();
    markers.dedup();
    markers
}

/// Keep markers inside `[first, last]`.
pub fn markers_in_range(markers: &[NaiveDate], first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    markers
        .iter()
        .copied()
        .filter(|date| *date >= first && *date <= last)
        .collect()
}

/// Capitalise the first letter of every word and lowercase the rest.
///
/// A word starts after any character that is not a letter, so `"age_band"`
/// becomes `"Age_Band"` and `"80plus"` becomes `"80Plus"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// `"ast_reg_by_region"` → `"Ast Reg By Region"`.
pub fn filename_to_title(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn scales_carry_their_axis_label() {
        assert_eq!(ChartScale::Percentage.multiplier(), 100.0);
        assert_eq!(ChartScale::Rate.y_label(), "Rate per thousand");
        assert_eq!(ChartScale::factor(None), 1.0);
    }

    #[test]
    fn unparseable_markers_are_skipped() {
        let raw = vec![
            "2021-03-31".to_string(),
            "end of year".to_string(),
            "2020-03-31".to_string(),
        ];
        assert_eq!(
            parse_date_markers(&raw),
            vec![date(2020, 3, 31), date(2021, 3, 31)]
        );
    }

    #[test]
    fn markers_outside_the_range_are_dropped() {
        let markers = [date(2019, 1, 1), date(2020, 3, 31), date(2023, 1, 1)];
        assert_eq!(
            markers_in_range(&markers, date(2019, 3, 1), date(2022, 3, 1)),
            vec![date(2020, 3, 31)]
        );
    }

    #[test]
    fn titles_follow_word_boundaries() {
        assert_eq!(filename_to_title("asthma_panel_by_REGION"), "Asthma Panel By Region");
        assert_eq!(title_case("80plus"), "80Plus");
        assert_eq!(title_case("0-19"), "0-19");
    }
}

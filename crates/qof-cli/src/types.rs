use std::path::PathBuf;

/// Outcome of one measure in a redaction run.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSummary {
    pub id: String,
    pub rows: usize,
    pub suppressed_cells: usize,
    pub rates_cleared: usize,
    pub partial: bool,
    /// Percentage of known practices present in the measure.
    pub practice_coverage: Option<f64>,
    pub output: Option<PathBuf>,
}

impl MeasureSummary {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

#[derive(Debug, Default)]
pub struct RedactionRun {
    pub output_dir: PathBuf,
    pub measures: Vec<MeasureSummary>,
    /// Per-measure failures, formatted for display.
    pub errors: Vec<String>,
}

impl RedactionRun {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn total_suppressed(&self) -> usize {
        self.measures.iter().map(|m| m.suppressed_cells).sum()
    }
}

/// One written chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSummary {
    pub id: String,
    pub series: usize,
    pub points: usize,
    pub output: PathBuf,
}

#[derive(Debug, Default)]
pub struct ChartRun {
    pub output_dir: PathBuf,
    pub charts: Vec<ChartSummary>,
    pub errors: Vec<String>,
}

impl ChartRun {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

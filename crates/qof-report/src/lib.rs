//! Report outputs for measure tables.
//!
//! - **writer**: redacted CSV tables and JSON chart specifications
//! - **group_chart**: one time series per group for a single measure
//! - **panel_chart**: a grid of measures from a joined measures table
//! - **chart**: shared chart types, scales and date markers

pub mod chart;
pub mod error;
pub mod group_chart;
pub mod panel_chart;
pub mod writer;

pub use chart::{
    ChartPoint, ChartScale, ChartSeries, filename_to_title, markers_in_range, parse_date_markers,
    title_case,
};
pub use error::{ReportError, Result};
pub use group_chart::{GroupChart, GroupChartOptions, build_group_chart, is_single_series};
pub use panel_chart::{
    MAX_PANELS, MeasureSelection, Panel, PanelChart, PanelChartOptions, PanelRow,
    autoselect_labels, build_panel_chart, glob_to_regex, load_panel_table, panel_label,
    redact_panel_rows, select_measures,
};
pub use writer::{
    group_chart_file_name, redacted_file_name, write_group_chart, write_json, write_measure_csv,
    write_panel_chart, write_redacted_csv,
};

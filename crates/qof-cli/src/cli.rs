//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "qof-measures",
    version,
    about = "Redact and chart pre-aggregated QOF measure tables",
    long_about = "Redact and chart pre-aggregated QOF measure tables.\n\n\
                  Small counts are suppressed before any table or chart leaves \
                  the output directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow suppressed cell values to appear in trace logs.
    ///
    /// Logs may leave the secure environment; leave this off outside local
    /// debugging.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Suppress small counts and write redacted copies of every measure table.
    Redact(RedactArgs),

    /// Write a time series chart specification for every measure table.
    Charts(ChartsArgs),

    /// Write a multi-panel chart specification from a joined measures table.
    Panel(PanelArgs),

    /// List the configured demographic strata and their categories.
    Strata(StrataArgs),
}

/// Study configuration shared by every command.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Study configuration file (TOML). Defaults apply when omitted.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Counts at or below this value are suppressed.
    #[arg(long = "threshold", value_name = "N")]
    pub threshold: Option<u64>,

    /// Keep hiding the smallest visible counts until the hidden total exceeds
    /// the threshold.
    #[arg(long = "complementary")]
    pub complementary: bool,

    /// Multiplier applied when rates are recomputed from counts.
    #[arg(long = "rate-multiplier", value_name = "FACTOR")]
    pub rate_multiplier: Option<f64>,

    /// Vertical chart markers (YYYY-MM-DD); replaces the configured list.
    #[arg(long = "date-lines", value_name = "DATE", num_args = 1..)]
    pub date_lines: Option<Vec<String>>,

    /// Numerator column; with --denominator, replaces positional inference.
    #[arg(long = "numerator", value_name = "COLUMN", requires = "denominator")]
    pub numerator: Option<String>,

    /// Denominator column; with --numerator, replaces positional inference.
    #[arg(long = "denominator", value_name = "COLUMN", requires = "numerator")]
    pub denominator: Option<String>,

    /// Rate column used with an explicit schema.
    #[arg(long = "rate-column", value_name = "COLUMN", requires = "numerator")]
    pub rate_column: Option<String>,

    /// Group-by columns used with an explicit schema (comma separated).
    #[arg(
        long = "group-by",
        value_name = "COLUMNS",
        value_delimiter = ',',
        requires = "numerator"
    )]
    pub group_by: Vec<String>,
}

#[derive(Args)]
pub struct RedactArgs {
    /// Directory containing the measure files.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output directory (default: <INPUT_DIR>/redacted).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args)]
pub struct ChartsArgs {
    /// Directory containing the measure files.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output directory (default: <INPUT_DIR>/charts).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Y axis scale for the plotted proportions.
    #[arg(long = "scale", value_enum)]
    pub scale: Option<ScaleArg>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args)]
pub struct PanelArgs {
    /// Joined measures file with name, category, group, date, denominator
    /// and value columns.
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: PathBuf,

    /// Output directory for the chart specification.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// File stem of the chart; also used for its title.
    #[arg(long = "output-name", value_name = "NAME")]
    pub output_name: String,

    /// Glob pattern over measure names.
    #[arg(long = "measures-pattern", value_name = "GLOB", conflicts_with = "measures_list")]
    pub measures_pattern: Option<String>,

    /// Measure names to include (comma separated).
    #[arg(long = "measures-list", value_name = "NAMES", value_delimiter = ',')]
    pub measures_list: Vec<String>,

    /// Panels per grid row.
    #[arg(long = "columns", default_value_t = 2)]
    pub columns: usize,

    /// Y axis scale for the plotted proportions.
    #[arg(long = "scale", value_enum)]
    pub scale: Option<ScaleArg>,

    /// Add 95% confidence intervals to every line.
    #[arg(long = "confidence-intervals")]
    pub confidence_intervals: bool,

    /// Leave this group out of every panel, e.g. unknown.
    #[arg(long = "exclude-group", value_name = "LABEL")]
    pub exclude_group: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args)]
pub struct StrataArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScaleArg {
    /// Proportion × 100.
    Percentage,
    /// Proportion × 1000.
    Rate,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

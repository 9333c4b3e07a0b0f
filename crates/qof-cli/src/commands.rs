use anyhow::Result;
use comfy_table::Table;

use qof_cli::pipeline::{
    ConfigOverrides, PanelRequest, load_study_config, run_group_charts, run_panel_chart,
    run_redaction,
};
use qof_cli::types::{ChartRun, ChartSummary, RedactionRun};
use qof_model::MeasureSchema;
use qof_report::{ChartScale, MeasureSelection};

use crate::cli::{ChartsArgs, ConfigArgs, PanelArgs, RedactArgs, ScaleArg, StrataArgs};
use crate::summary::apply_table_style;

fn overrides(args: &ConfigArgs) -> ConfigOverrides {
    let schema = match (&args.numerator, &args.denominator) {
        (Some(numerator), Some(denominator)) => {
            let mut schema = MeasureSchema::new(numerator, denominator)
                .with_group_by(args.group_by.clone());
            if let Some(rate) = &args.rate_column {
                schema = schema.with_rate(rate);
            }
            Some(schema)
        }
        _ => None,
    };
    ConfigOverrides {
        config_path: args.config.clone(),
        threshold: args.threshold,
        complementary: args.complementary,
        rate_multiplier: args.rate_multiplier,
        date_lines: args.date_lines.clone(),
        schema,
    }
}

fn chart_scale(scale: Option<ScaleArg>) -> Option<ChartScale> {
    scale.map(|scale| match scale {
        ScaleArg::Percentage => ChartScale::Percentage,
        ScaleArg::Rate => ChartScale::Rate,
    })
}

pub fn run_redact(args: &RedactArgs) -> Result<RedactionRun> {
    let config = load_study_config(&overrides(&args.config))?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.input_dir.join("redacted"));
    run_redaction(&args.input_dir, &output_dir, &config)
}

pub fn run_charts(args: &ChartsArgs) -> Result<ChartRun> {
    let config = load_study_config(&overrides(&args.config))?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.input_dir.join("charts"));
    run_group_charts(&args.input_dir, &output_dir, &config, chart_scale(args.scale))
}

pub fn run_panel(args: &PanelArgs) -> Result<ChartSummary> {
    let config = load_study_config(&overrides(&args.config))?;
    let selection = match &args.measures_pattern {
        Some(pattern) => MeasureSelection::Pattern(pattern.clone()),
        None if args.measures_list.is_empty() => MeasureSelection::All,
        None => MeasureSelection::List(args.measures_list.clone()),
    };
    let request = PanelRequest {
        input_file: args.input_file.clone(),
        output_dir: args.output_dir.clone(),
        output_name: args.output_name.clone(),
        selection,
        columns: args.columns,
        scale: chart_scale(args.scale),
        confidence_intervals: args.confidence_intervals,
        exclude_group: args.exclude_group.clone(),
    };
    run_panel_chart(&request, &config)
}

pub fn run_strata(args: &StrataArgs) -> Result<()> {
    let config = load_study_config(&overrides(&args.config))?;
    println!(
        "{} ({}), {} to {}",
        config.measure_label, config.indicator, config.study_start, config.study_end
    );
    let mut table = Table::new();
    table.set_header(vec!["Stratum", "Column", "Categories"]);
    apply_table_style(&mut table);
    for stratum in &config.demographics {
        let categories = stratum.categories();
        let categories = if categories.is_empty() {
            "-".to_string()
        } else {
            categories.join(", ")
        };
        table.add_row(vec![
            stratum.label().to_string(),
            stratum.as_str().to_string(),
            categories,
        ]);
    }
    println!("{table}");
    Ok(())
}

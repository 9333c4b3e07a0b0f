use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use qof_cli::types::{ChartRun, ChartSummary, MeasureSummary, RedactionRun};

pub fn print_redaction_summary(run: &RedactionRun) {
    println!("Output: {}", run.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Measure"),
        header_cell("Rows"),
        header_cell("Suppressed"),
        header_cell("Rates cleared"),
        header_cell("Protection"),
        header_cell("Coverage"),
        header_cell("Output"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);

    let mut total_rows = 0usize;
    let mut total_cleared = 0usize;
    for summary in ordered(&run.measures, |m| &m.id) {
        total_rows += summary.rows;
        total_cleared += summary.rates_cleared;
        table.add_row(vec![
            measure_cell(summary),
            Cell::new(summary.rows),
            count_cell(summary.suppressed_cells, Color::Yellow),
            count_cell(summary.rates_cleared, Color::Yellow),
            protection_cell(summary),
            coverage_cell(summary.practice_coverage),
            output_cell(summary.output.as_ref()),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        count_cell(run.total_suppressed(), Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(total_cleared, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_errors(&run.errors);
}

pub fn print_chart_summary(run: &ChartRun) {
    println!("Output: {}", run.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chart"),
        header_cell("Series"),
        header_cell("Points"),
        header_cell("Output"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for chart in ordered(&run.charts, |c| &c.id) {
        table.add_row(chart_row(chart));
    }
    println!("{table}");
    print_errors(&run.errors);
}

pub fn print_panel_summary(chart: &ChartSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chart"),
        header_cell("Series"),
        header_cell("Points"),
        header_cell("Output"),
    ]);
    apply_table_style(&mut table);
    table.add_row(chart_row(chart));
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Errors:");
    for error in errors {
        eprintln!("- {error}");
    }
}

fn chart_row(chart: &ChartSummary) -> Vec<Cell> {
    vec![
        Cell::new(&chart.id).add_attribute(Attribute::Bold),
        Cell::new(chart.series),
        count_cell(chart.points, Color::Green),
        output_cell(Some(&chart.output)),
    ]
}

fn ordered<'a, T>(items: &'a [T], key: impl Fn(&T) -> &String) -> Vec<&'a T> {
    let mut ordered: Vec<&T> = items.iter().collect();
    ordered.sort_by(|a, b| key(a).cmp(key(b)));
    ordered
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn measure_cell(summary: &MeasureSummary) -> Cell {
    let cell = Cell::new(&summary.id).add_attribute(Attribute::Bold);
    if summary.is_empty() {
        cell.fg(Color::DarkGrey)
    } else {
        cell
    }
}

fn protection_cell(summary: &MeasureSummary) -> Cell {
    if summary.partial {
        Cell::new("partial")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else if summary.suppressed_cells > 0 {
        Cell::new("ok").fg(Color::Green)
    } else {
        dim_cell("-")
    }
}

fn coverage_cell(coverage: Option<f64>) -> Cell {
    match coverage {
        Some(value) => Cell::new(format!("{value:.2}%")),
        None => dim_cell("-"),
    }
}

fn output_cell(path: Option<&PathBuf>) -> Cell {
    match path.and_then(|path| path.file_name()) {
        Some(name) => Cell::new(name.to_string_lossy()).fg(Color::Green),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

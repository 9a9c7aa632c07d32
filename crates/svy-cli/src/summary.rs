use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use svy_model::Severity;

use svy_cli::types::RunResult;

pub fn print_summary(result: &RunResult) {
    println!("Campaign: {}", result.campaign);
    println!("Output: {}", result.output_dir.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Mode"),
        header_cell("Respondents"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Paradata"),
        header_cell("Sessions"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in [1, 2, 3, 4, 5, 6, 7] {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_respondents = 0usize;
    let mut total_rows = 0usize;
    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;
    for summary in &result.modes {
        total_respondents += summary.respondents;
        total_rows += summary.dataset.rows;
        total_errors += summary.errors;
        total_warnings += summary.warnings;
        let (paradata, sessions) = match &summary.paradata {
            Some(paradata) => (
                Cell::new(paradata.respondents),
                Cell::new(paradata.sessions),
            ),
            None => (dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![
            mode_cell(&summary.mode),
            Cell::new(summary.respondents),
            Cell::new(summary.dataset.rows),
            Cell::new(summary.dataset.columns),
            paradata,
            sessions,
            count_cell(summary.errors, Color::Red),
            count_cell(summary.warnings, Color::Yellow),
        ]);
    }
    for (mode, _) in &result.failed_modes {
        table.add_row(vec![
            Cell::new(mode).fg(Color::Red).add_attribute(Attribute::Bold),
            Cell::new("FAILED").fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    if let Some(multimode) = &result.multimode {
        table.add_row(vec![
            Cell::new(&multimode.name).fg(Color::DarkGrey),
            dim_cell("-"),
            Cell::new(multimode.rows).fg(Color::DarkGrey),
            Cell::new(multimode.columns).fg(Color::DarkGrey),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_respondents).add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(total_errors, Color::Red).add_attribute(Attribute::Bold),
        count_cell(total_warnings, Color::Yellow).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    print_diagnostic_table(result);

    if !result.failed_modes.is_empty() || !result.errors.is_empty() {
        eprintln!("Errors:");
        for (mode, reason) in &result.failed_modes {
            eprintln!("- mode {mode}: {reason}");
        }
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

/// Diagnostics grouped by mode, severity and kind, with one example message.
fn print_diagnostic_table(result: &RunResult) {
    if result.diagnostics.is_empty() {
        return;
    }
    let mut groups: BTreeMap<(String, u8, &'static str), (Severity, usize, &str)> = BTreeMap::new();
    for diagnostic in result.diagnostics.iter() {
        let mode = diagnostic.mode.clone().unwrap_or_else(|| "-".to_string());
        let key = (mode, severity_rank(diagnostic.severity), diagnostic.kind.as_str());
        groups
            .entry(key)
            .and_modify(|(_, count, _)| *count += 1)
            .or_insert((diagnostic.severity, 1, diagnostic.message.as_str()));
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Mode"),
        header_cell("Severity"),
        header_cell("Kind"),
        header_cell("Count"),
        header_cell("Example"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for ((mode, _, kind), (severity, count, example)) in groups {
        table.add_row(vec![
            mode_cell(&mode),
            severity_cell(severity),
            Cell::new(kind),
            Cell::new(count),
            Cell::new(example),
        ]);
    }
    println!();
    println!("Diagnostics:");
    println!("{table}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Error => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => dim_cell("INFO"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn mode_cell(mode: &str) -> Cell {
    Cell::new(mode)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

//! Human-readable run summaries.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cohort_model::{LinkReport, NumericSummary, PatientCleaningReport};

use crate::types::RunResult;

pub fn print_run_summary(result: &RunResult) {
    println!("Output: {}", result.output_dir.display());
    println!(
        "Hypertension cohort: {} ({})",
        result.hypertension.version,
        result
            .hypertension
            .codes
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Some(report) = &result.patients {
        print_patient_summary(report);
    }
    if !result.links.is_empty() {
        print_link_summary(&result.links);
    }
}

pub fn print_patient_summary(report: &PatientCleaningReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Patients"),
        header_cell("Rows"),
        header_cell("Share"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Initial"),
        Cell::new(report.initial),
        dim_cell("-"),
    ]);
    table.add_row(vec![
        Cell::new("Valid").fg(Color::Green),
        Cell::new(report.valid),
        Cell::new(format!("{:.1}%", report.valid_fraction() * 100.0)),
    ]);
    table.add_row(vec![
        Cell::new("Excluded").fg(Color::Yellow),
        Cell::new(report.excluded),
        Cell::new(format!("{:.1}%", (1.0 - report.valid_fraction()) * 100.0)),
    ]);
    println!("{table}");

    println!("Age distribution (valid cohort, years):");
    print_numeric_summary(&report.age_summary);

    if !report.race_mapping.is_empty() {
        let mut races = Table::new();
        races.set_header(vec![
            header_cell("Race"),
            header_cell("Count"),
            header_cell("Original values"),
        ]);
        apply_table_style(&mut races);
        align_column(&mut races, 1, CellAlignment::Right);
        for entry in &report.race_mapping {
            races.add_row(vec![
                Cell::new(entry.race.as_str()),
                Cell::new(entry.count),
                if entry.originals.is_empty() {
                    dim_cell("-")
                } else {
                    Cell::new(entry.originals.join(", "))
                },
            ]);
        }
        println!("Race mapping (original -> normalized):");
        println!("{races}");
    }
}

fn print_numeric_summary(summary: &NumericSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("count"),
        header_cell("mean"),
        header_cell("std"),
        header_cell("min"),
        header_cell("25%"),
        header_cell("50%"),
        header_cell("75%"),
        header_cell("max"),
    ]);
    apply_table_style(&mut table);
    for index in 0..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(summary.count),
        stat_cell(summary.mean),
        stat_cell(summary.std_dev),
        stat_cell(summary.min),
        stat_cell(summary.q1),
        stat_cell(summary.median),
        stat_cell(summary.q3),
        stat_cell(summary.max),
    ]);
    println!("{table}");
}

pub fn print_link_summary(reports: &[LinkReport]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Input"),
        header_cell("Output"),
        header_cell("No patient"),
        header_cell("Bad code"),
        header_cell("Unknown code"),
        header_cell("No start"),
        header_cell("Patients"),
        header_cell("Codes"),
    ]);
    apply_table_style(&mut table);
    for index in 1..9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for report in reports {
        table.add_row(vec![
            Cell::new(report.stage.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(report.input_rows),
            Cell::new(report.output_rows)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
            drop_cell(report.dropped_unknown_patient),
            drop_cell(report.dropped_unparseable_code),
            drop_cell(report.dropped_unknown_code),
            drop_cell(report.dropped_missing_start),
            Cell::new(report.unique_patients),
            Cell::new(report.unique_codes),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn stat_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => Cell::new(format!("{value:.1}")),
        None => dim_cell("-"),
    }
}

fn drop_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Yellow)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

use std::collections::BTreeSet;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cohort_model::{ClassificationResult, SubjectId};
use cohort_rules::CohortResults;

pub fn print_summary(results: &[CohortResults]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Evaluated"),
        header_cell("Positive"),
        header_cell("Negative"),
        header_cell("Labelled"),
        header_cell("Undetermined"),
        header_cell("Rejected obs"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for cohort in results {
        table.add_row(vec![
            Cell::new(cohort.rule())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(cohort.evaluated()),
            count_cell(cohort.positive_count(), Color::Green),
            count_cell(cohort.negative_count(), Color::Yellow),
            count_cell(cohort.labelled_count(), Color::Cyan),
            count_cell(cohort.undetermined_count(), Color::DarkGrey),
            count_cell(cohort.rejected_observations(), Color::Red),
        ]);
    }
    println!("{table}");
    print_subject_table(results);
}

/// One row per subject, one column per rule.
fn print_subject_table(results: &[CohortResults]) {
    let subjects: BTreeSet<&SubjectId> = results
        .iter()
        .flat_map(|cohort| cohort.results().keys())
        .collect();
    if subjects.is_empty() {
        return;
    }
    let mut table = Table::new();
    let mut header = vec![header_cell("Subject")];
    header.extend(results.iter().map(|cohort| header_cell(cohort.rule())));
    table.set_header(header);
    apply_table_style(&mut table);
    for subject in subjects {
        let mut row = vec![Cell::new(subject)];
        row.extend(results.iter().map(|cohort| result_cell(cohort.get(subject))));
        table.add_row(row);
    }
    println!();
    println!("Subjects:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
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

fn result_cell(result: Option<ClassificationResult>) -> Cell {
    match result {
        Some(ClassificationResult::Flag(true)) => Cell::new("yes")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Some(ClassificationResult::Flag(false)) => Cell::new("no").fg(Color::Yellow),
        Some(label) => Cell::new(label).fg(Color::Cyan),
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

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

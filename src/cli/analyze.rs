use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::analyzer::{analyze_workbook, SheetReport};
use crate::error::Result;
use crate::settings::resolve_workbook_path;
use crate::workbook::Workbook;

pub fn run(file: Option<String>) -> Result<()> {
    let path = resolve_workbook_path(file.as_deref());
    let workbook = Workbook::open(&path)?;
    let reports = analyze_workbook(&workbook);

    println!("Workbook: {}", path.display());
    println!("Sheets:   {}", workbook.sheet_names().join(", "));
    for report in &reports {
        println!();
        print!("{}", format_report(report));
    }
    Ok(())
}

pub fn format_report(report: &SheetReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format!("Sheet: {}", report.name).bold()));
    out.push_str(&format!(
        "{} rows x {} columns\n",
        report.row_count, report.column_count
    ));

    let mut columns = Table::new();
    columns.set_header(vec!["#", "Column", "Type", "Blank"]);
    for (i, (col, kind)) in report.columns.iter().zip(&report.column_types).enumerate() {
        let blanks = report
            .blank_counts
            .iter()
            .find(|(name, _)| name == col)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        columns.add_row(vec![Cell::new(i + 1), Cell::new(col), Cell::new(kind), Cell::new(blanks)]);
    }
    out.push_str(&format!("{columns}\n"));

    if report.preview.is_empty() {
        out.push_str(&format!("{}\n", "(no data rows)".dimmed()));
    } else {
        let mut preview = Table::new();
        preview.set_header(report.columns.clone());
        for row in &report.preview {
            preview.add_row(row.clone());
        }
        out.push_str(&format!("Preview (first {} rows)\n{preview}\n", report.preview.len()));
    }
    out
}

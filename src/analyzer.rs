use crate::workbook::{Sheet, Workbook};

pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    /// Inferred type per column, aligned with `columns`.
    pub column_types: Vec<&'static str>,
    /// (column, blank cells) for columns with at least one blank.
    pub blank_counts: Vec<(String, usize)>,
    pub preview: Vec<Vec<String>>,
}

/// "empty" when the column has no values, "mixed" when they disagree.
fn column_type(sheet: &Sheet, col: usize) -> &'static str {
    let mut kinds = sheet
        .rows
        .iter()
        .filter_map(|r| r.get(col))
        .filter(|c| !c.is_empty())
        .map(|c| c.kind());
    match kinds.next() {
        None => "empty",
        Some(first) if kinds.all(|k| k == first) => first,
        Some(_) => "mixed",
    }
}

pub fn analyze_sheet(sheet: &Sheet) -> SheetReport {
    let blank_counts = sheet
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, header)| {
            let blanks = sheet
                .rows
                .iter()
                .filter(|r| r.get(i).map_or(true, |c| c.is_empty()))
                .count();
            (blanks > 0).then(|| (header.clone(), blanks))
        })
        .collect();

    let preview = sheet
        .rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|r| {
            (0..sheet.headers.len())
                .map(|i| r.get(i).map(|c| c.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    SheetReport {
        name: sheet.name.clone(),
        row_count: sheet.rows.len(),
        column_count: sheet.headers.len(),
        columns: sheet.headers.clone(),
        column_types: (0..sheet.headers.len()).map(|i| column_type(sheet, i)).collect(),
        blank_counts,
        preview,
    }
}

pub fn analyze_workbook(workbook: &Workbook) -> Vec<SheetReport> {
    workbook.sheets.iter().map(analyze_sheet).collect()
}

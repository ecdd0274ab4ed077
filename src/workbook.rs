use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use calamine::{Data, Reader};

use crate::error::{LocacaoError, Result};
use crate::normalize::extract_date;

pub mod sheets {
    pub const OWNERS: &str = "Proprietários";
    pub const TENANTS: &str = "Inquilinos";
    pub const PROPERTIES: &str = "Imóveis";
    pub const CONTRACTS: &str = "Contratos";
}

/// Column headers exactly as they appear in the spreadsheet.
pub mod cols {
    pub const NAME: &str = "NOME/RAZÃO SOCIAL*";
    pub const TAX_ID: &str = "CPF/CNPJ*";
    pub const PROPERTY: &str = "IMÓVEL LOCADO:";

    pub const OWNER_EMAIL: &str = "EMAIL";
    pub const OWNER_PHONE: &str = "WPP/TELEFONE";
    pub const OWNER_ADDRESS: &str = "ENDEREÇO COMPLETO";
    pub const OWNER_BANK: &str = "DADOS BANCÁRIOS";

    pub const TENANT_EMAIL: &str = "EMAIL*";
    pub const TENANT_PHONE: &str = "WPP/TELEFONE*";
    pub const TENANT_ADDRESS: &str = "ENDEREÇO COMPLETO*";
    pub const TENANT_BIRTH: &str = "DATA DE NASCIMENTO";

    pub const PROPERTY_ADDRESS: &str = "CEP - ENDEREÇO COMPLETO";
    pub const PROPERTY_RENT: &str = "VALOR DO ALUGUEL";

    pub const CONTRACT_TERMS: &str = "DADOS DO CONTRATO (VALOR DO ALUGUEL, DATA DE INÍCIO, DURAÇÃO, DATA DE TÉRMINO, DIA DO VENCIMENTO)";
    pub const CONTRACT_GUARANTEE: &str = "GARANTIAS (FIANÇA, CAUÇÃO OU SEGURO-FIANÇA)";
    pub const CONTRACT_ADMIN_FEE: &str = "VALOR DA ADMINISTRAÇÃO";
    pub const CONTRACT_NOTES: &str = "OBSERVAÇÕES";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Excel serial date.
    Date(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Empty => "empty",
            Cell::Text(_) => "text",
            Cell::Number(_) => "number",
            Cell::Date(_) => "date",
            Cell::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Date(serial) => match excel_serial_to_date(*serial) {
                Some(d) => write!(f, "{d}"),
                None => write!(f, "{serial}"),
            },
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(trimmed.to_string())
                }
            }
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Date(dt.as_f64()),
        }
    }
}

pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    index: HashMap<String, usize>,
}

impl Sheet {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.clone()).or_insert(i);
        }
        Self {
            name: name.to_string(),
            headers,
            rows,
            index,
        }
    }

    /// Build a sheet from string cells; blank strings become `Cell::Empty`.
    #[cfg(test)]
    pub fn from_strings(name: &str, headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|s| {
                        if s.trim().is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(s.trim().to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(name, headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { sheet: self, cells })
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.index.get(header).copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    sheet: &'a Sheet,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    pub fn cell(&self, header: &str) -> &'a Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.sheet
            .column_index(header)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(EMPTY)
    }

    /// Trimmed text of the cell, `None` when missing or blank.
    pub fn text(&self, header: &str) -> Option<String> {
        let cell = self.cell(header);
        if cell.is_empty() {
            return None;
        }
        let s = cell.to_string();
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    }

    /// Numeric cells only; text that looks like a number is not coerced.
    pub fn number(&self, header: &str) -> Option<f64> {
        match self.cell(header) {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Date cells, or `DD/MM/YYYY` inside a text cell.
    pub fn date(&self, header: &str) -> Option<String> {
        match self.cell(header) {
            Cell::Date(serial) => excel_serial_to_date(*serial),
            Cell::Text(s) => extract_date(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = calamine::open_workbook_auto(path)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let mut raw_rows = range.rows();
            let headers: Vec<String> = raw_rows
                .next()
                .map(|r| r.iter().map(|c| c.to_string().trim().to_string()).collect())
                .unwrap_or_default();
            let rows = raw_rows
                .map(|r| r.iter().map(Cell::from).collect())
                .collect();
            sheets.push(Sheet::new(&name, headers, rows));
        }
        log::info!("Loaded {} sheet(s) from {}", sheets.len(), path.display());
        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| LocacaoError::MissingSheet(name.to_string()))
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook};

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), Some("2025-01-10".to_string()));
        assert_eq!(excel_serial_to_date(45667.75), Some("2025-01-10".to_string()));
    }

    #[test]
    fn test_number_cells_render_without_fraction() {
        assert_eq!(Cell::Number(12345678909.0).to_string(), "12345678909");
        assert_eq!(Cell::Number(10.5).to_string(), "10.5");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_row_accessors() {
        let sheet = Sheet::new(
            "Teste",
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            vec![vec![
                Cell::Text("  Maria ".into()),
                Cell::Number(12.0),
                Cell::Date(45667.0),
                Cell::Text("nascida em 02/05/1990".into()),
            ]],
        );
        let row = sheet.rows().next().unwrap();
        assert_eq!(row.text("A"), Some("Maria".to_string()));
        assert_eq!(row.number("B"), Some(12.0));
        assert_eq!(row.number("A"), None);
        assert_eq!(row.date("C"), Some("2025-01-10".to_string()));
        assert_eq!(row.date("D"), Some("1990-05-02".to_string()));
        assert_eq!(row.text("MISSING"), None);
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let sheet = Sheet::from_strings("Teste", &["A", "B"], &[vec!["x"]]);
        let row = sheet.rows().next().unwrap();
        assert_eq!(row.text("A"), Some("x".to_string()));
        assert!(row.cell("B").is_empty());
    }

    #[test]
    fn test_missing_sheet_is_an_error() {
        let wb = Workbook::default();
        assert!(matches!(wb.sheet("Contratos"), Err(LocacaoError::MissingSheet(_))));
    }

    #[test]
    fn test_open_reads_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planilha.xlsx");

        let mut xlsx = XlsxWorkbook::new();
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        let ws = xlsx.add_worksheet();
        ws.set_name(sheets::TENANTS).unwrap();
        ws.write_string(0, 0, cols::NAME).unwrap();
        ws.write_string(0, 1, cols::TAX_ID).unwrap();
        ws.write_string(0, 2, cols::TENANT_BIRTH).unwrap();
        ws.write_string(1, 0, "Ana Souza").unwrap();
        ws.write_number(1, 1, 52998224725.0).unwrap();
        let birth = ExcelDateTime::from_ymd(1990, 5, 2).unwrap();
        ws.write_datetime_with_format(1, 2, &birth, &date_format).unwrap();
        xlsx.save(&path).unwrap();

        let wb = Workbook::open(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec![sheets::TENANTS]);
        let sheet = wb.sheet(sheets::TENANTS).unwrap();
        assert_eq!(sheet.headers, vec![cols::NAME, cols::TAX_ID, cols::TENANT_BIRTH]);
        let row = sheet.rows().next().unwrap();
        assert_eq!(row.text(cols::NAME), Some("Ana Souza".to_string()));
        assert_eq!(row.text(cols::TAX_ID), Some("52998224725".to_string()));
        assert_eq!(row.date(cols::TENANT_BIRTH), Some("1990-05-02".to_string()));
    }
}

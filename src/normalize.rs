//! Field cleaning for spreadsheet cells. Every function here degrades to
//! `None` (or a documented default) on missing or malformed input.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{GuaranteeType, PersonKind};

pub const DEFAULT_DUE_DAY: u32 = 5;
pub const DEFAULT_END_DATE: &str = "2026-12-31";
pub const DEFAULT_POSTAL_CODE: &str = "74000-000";
pub const DEFAULT_ADMIN_FEE_PCT: f64 = 10.0;

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn brl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"R?\$?\s*([\d.]+,\d{2})")
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(\d{2})/(\d{2})/(\d{4})")
}

fn cep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(\d{5}-?\d{3})")
}

fn due_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"TODO DIA (\d{1,2})")
}

fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn clean_tax_id(raw: Option<&str>) -> Option<String> {
    raw.map(digits)
}

pub fn clean_phone(raw: Option<&str>) -> Option<String> {
    let mut tel = digits(raw?);
    if tel.len() > 11 && tel.starts_with("55") {
        tel.replace_range(..2, "");
    }
    tel.truncate(20);
    if tel.is_empty() {
        None
    } else {
        Some(tel)
    }
}

/// First Brazilian-formatted amount in the text: "R$ 7.500,00" -> 7500.0.
pub fn extract_brl(text: &str) -> Option<f64> {
    let caps = brl_re().captures(text)?;
    caps[1].replace('.', "").replace(',', ".").parse().ok()
}

/// First `DD/MM/YYYY` in the text, as `YYYY-MM-DD`.
pub fn extract_date(text: &str) -> Option<String> {
    let caps = date_re().captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn person_kind(tax_id: &str) -> PersonKind {
    if tax_id.len() == 14 {
        PersonKind::Organization
    } else {
        PersonKind::Individual
    }
}

pub fn extract_cep(address: &str) -> Option<String> {
    cep_re().captures(address).map(|c| c[1].to_string())
}

pub fn extract_due_day(text: &str) -> u32 {
    due_day_re()
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(DEFAULT_DUE_DAY)
}

/// Date in the segment after the last `" - "`, if the text has one.
pub fn extract_end_date(text: &str) -> Option<String> {
    if !text.contains(" - ") {
        return None;
    }
    text.rsplit(" - ").next().and_then(extract_date)
}

/// Lower-case and strip Portuguese diacritics so "Caução" matches "caucao".
pub fn fold_accents(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Keyword order matters: a text mentioning both deposit and guarantor is a deposit.
pub fn classify_guarantee(text: &str) -> (GuaranteeType, Option<f64>) {
    let folded = fold_accents(text);
    if folded.contains("caucao") {
        (GuaranteeType::Deposit, extract_brl(text))
    } else if folded.contains("fianca") {
        (GuaranteeType::Guarantor, None)
    } else if folded.contains("seguro") {
        (GuaranteeType::Insurance, None)
    } else {
        (GuaranteeType::None, None)
    }
}

fn all_same(d: &[u32]) -> bool {
    d.windows(2).all(|w| w[0] == w[1])
}

pub fn is_valid_cpf(tax_id: &str) -> bool {
    let d: Vec<u32> = tax_id.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != 11 || tax_id.len() != 11 || all_same(&d) {
        return false;
    }
    let check = |len: usize| -> u32 {
        let sum: u32 = (0..len).map(|i| d[i] * (len as u32 + 1 - i as u32)).sum();
        let rest = 11 - sum % 11;
        if rest >= 10 {
            0
        } else {
            rest
        }
    };
    check(9) == d[9] && check(10) == d[10]
}

pub fn is_valid_cnpj(tax_id: &str) -> bool {
    let d: Vec<u32> = tax_id.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != 14 || tax_id.len() != 14 || all_same(&d) {
        return false;
    }
    let check = |len: usize| -> u32 {
        let mut weight = len as u32 - 7;
        let mut sum = 0;
        for digit in &d[..len] {
            sum += digit * weight;
            weight = if weight == 2 { 9 } else { weight - 1 };
        }
        if sum % 11 < 2 {
            0
        } else {
            11 - sum % 11
        }
    };
    check(12) == d[12] && check(13) == d[13]
}

pub fn tax_id_is_valid(tax_id: &str) -> bool {
    match person_kind(tax_id) {
        PersonKind::Organization => is_valid_cnpj(tax_id),
        PersonKind::Individual => is_valid_cpf(tax_id),
    }
}

/// Format a float as Brazilian currency: R$ 1.234,56
pub fn brl(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-R$ {with_dots},{dec_part}")
    } else {
        format!("R$ {with_dots},{dec_part}")
    }
}

/// 000.000.000-00 for CPF, 00.000.000/0000-00 for CNPJ, anything else unchanged.
pub fn format_tax_id(tax_id: &str) -> String {
    if !tax_id.chars().all(|c| c.is_ascii_digit()) {
        return tax_id.to_string();
    }
    match tax_id.len() {
        11 => format!("{}.{}.{}-{}", &tax_id[..3], &tax_id[3..6], &tax_id[6..9], &tax_id[9..]),
        14 => format!(
            "{}.{}.{}/{}-{}",
            &tax_id[..2],
            &tax_id[2..5],
            &tax_id[5..8],
            &tax_id[8..12],
            &tax_id[12..]
        ),
        _ => tax_id.to_string(),
    }
}

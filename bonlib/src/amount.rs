//! Суммы: разбор пользовательского ввода и вывод в формате fr-FR.

use crate::error::{BonError, Result};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

fn junk() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d.,]").expect("static regex"))
}

/// Пустой ввод даёт `None`. Запятая считается десятичным разделителем,
/// всё кроме цифр, точки и запятой выбрасывается (валюта, пробелы, знак).
pub fn parse_amount(input: &str) -> Result<Option<Decimal>> {
    let cleaned = junk().replace_all(input.trim(), "").replace(',', ".");
    if cleaned.is_empty() || cleaned == "." {
        return Ok(None);
    }
    cleaned
        .parse::<Decimal>()
        .map(Some)
        .map_err(|e| BonError::Parse(format!("amount {input:?}: {e}")))
}

/// `6662` -> `6 662,00`. Округление только здесь, при показе.
pub fn format_amount(a: Decimal) -> String {
    let s = format!("{:.2}", a.round_dp(2).abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let sign = if a.is_sign_negative() && !a.round_dp(2).is_zero() { "-" } else { "" };
    format!("{sign}{grouped},{frac}")
}

/// Как `format_amount`, но пустая строка для отсутствующей суммы.
pub fn format_opt(a: Option<Decimal>) -> String {
    a.map(format_amount).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_input() {
        assert_eq!(parse_amount("").unwrap(), None);
        assert_eq!(parse_amount("  ").unwrap(), None);
        assert_eq!(parse_amount("1870").unwrap(), Some(Decimal::new(1870, 0)));
        assert_eq!(parse_amount("12,5").unwrap(), Some(Decimal::new(125, 1)));
        assert_eq!(parse_amount("1 900.00 DA").unwrap(), Some(Decimal::new(190000, 2)));
        assert_eq!(parse_amount("abc").unwrap(), None);
    }

    #[test]
    fn rejects_ambiguous_separators() {
        assert!(parse_amount("1.234,56").is_err());
    }

    #[test]
    fn formats_fr() {
        assert_eq!(format_amount(Decimal::new(6662, 0)), "6 662,00");
        assert_eq!(format_amount(Decimal::new(853200, 2)), "8 532,00");
        assert_eq!(format_amount(Decimal::new(2, 0)), "2,00");
        assert_eq!(format_amount(Decimal::new(-1234567, 1)), "-123 456,70");
        assert_eq!(format_amount(Decimal::ZERO), "0,00");
        assert_eq!(format_opt(None), "");
    }
}

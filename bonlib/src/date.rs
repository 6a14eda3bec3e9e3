//! Нормализация дат строк ledger.
//!
//! Даты приходят как `YYYY-MM-DD`, `DD/MM/YYYY`, голый год (строка-заглушка года) или пусто.
//! Всё сводится к одному размеченному значению, которое используется и для сортировки, и для вывода.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiptDate {
    Full(NaiveDate),
    YearOnly(i32),
    Unparseable,
}

/// Ключ хронологической сортировки.
///
/// Год-заглушка идёт перед всеми полными датами того же года, неразобранные даты в конце.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChronoKey {
    Dated(i32, Option<NaiveDate>),
    Undated,
}

struct Patterns {
    iso: Regex,
    fr: Regex,
    year: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        iso: Regex::new(r"^(?P<y>\d{4})-(?P<m>\d{1,2})-(?P<d>\d{1,2})$").expect("static regex"),
        fr: Regex::new(r"^(?P<d>\d{1,2})/(?P<m>\d{1,2})/(?P<y>\d{4})$").expect("static regex"),
        year: Regex::new(r"^\d{4}$").expect("static regex"),
    })
}

/// Разбор строки даты. Никогда не падает: всё непонятное даёт `Unparseable`.
pub fn normalize(raw: &str) -> ReceiptDate {
    let s = raw.trim();
    if s.is_empty() {
        return ReceiptDate::Unparseable;
    }
    let p = patterns();

    if p.year.is_match(s) {
        return s.parse().map(ReceiptDate::YearOnly).unwrap_or(ReceiptDate::Unparseable);
    }

    let caps = match p.iso.captures(s).or_else(|| p.fr.captures(s)) {
        Some(c) => c,
        None => return ReceiptDate::Unparseable,
    };
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    match (num("y"), num("m"), num("d")) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y as i32, m, d)
            .map(ReceiptDate::Full)
            .unwrap_or(ReceiptDate::Unparseable),
        _ => ReceiptDate::Unparseable,
    }
}

impl ReceiptDate {
    pub fn is_parseable(&self) -> bool {
        !matches!(self, ReceiptDate::Unparseable)
    }

    pub fn chrono_key(&self) -> ChronoKey {
        match *self {
            ReceiptDate::Full(d) => ChronoKey::Dated(d.year(), Some(d)),
            ReceiptDate::YearOnly(y) => ChronoKey::Dated(y, None),
            ReceiptDate::Unparseable => ChronoKey::Undated,
        }
    }

    pub fn year(&self) -> Option<i32> {
        match *self {
            ReceiptDate::Full(d) => Some(d.year()),
            ReceiptDate::YearOnly(y) => Some(y),
            ReceiptDate::Unparseable => None,
        }
    }

    /// (год, месяц) есть только у полной даты.
    pub fn year_month(&self) -> Option<(i32, u32)> {
        match *self {
            ReceiptDate::Full(d) => Some((d.year(), d.month())),
            _ => None,
        }
    }

    /// Каноническая форма: `YYYY-MM-DD` или `YYYY`.
    pub fn canonical(&self) -> Option<String> {
        match *self {
            ReceiptDate::Full(d) => Some(d.format("%Y-%m-%d").to_string()),
            ReceiptDate::YearOnly(y) => Some(format!("{y:04}")),
            ReceiptDate::Unparseable => None,
        }
    }

    /// Форма для показа: `DD/MM/YYYY`, год как есть, иначе исходная строка.
    pub fn display_or<'a>(&self, raw: &'a str) -> std::borrow::Cow<'a, str> {
        match *self {
            ReceiptDate::Full(d) => d.format("%d/%m/%Y").to_string().into(),
            ReceiptDate::YearOnly(y) => format!("{y:04}").into(),
            ReceiptDate::Unparseable => raw.into(),
        }
    }
}

impl fmt::Display for ReceiptDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

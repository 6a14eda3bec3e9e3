//! Доменные модели: строки ledger (bon de livraison), компании, журнал истории.

use crate::error::{BonError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Одна строка ledger.
///
/// `total` производное поле: его пишет только пересчёт ledger, вручную он не задаётся.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub id: String,
    pub company_id: String,
    /// `YYYY-MM-DD`, `DD/MM/YYYY`, голый год `YYYY` или пусто.
    #[serde(default)]
    pub date: String,
    /// Номер накладной (NB).
    #[serde(default)]
    pub nb: Option<String>,
    #[serde(default)]
    pub billed_amount: Option<Decimal>,
    #[serde(default)]
    pub advance_amount: Option<Decimal>,
    #[serde(default)]
    pub total: Decimal,
    /// Сохранённый порядок строки внутри компании.
    #[serde(default)]
    pub position: u32,
}

/// Поля новой строки: без id и без total.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewReceipt {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub nb: Option<String>,
    #[serde(default)]
    pub billed_amount: Option<Decimal>,
    #[serde(default)]
    pub advance_amount: Option<Decimal>,
}

/// Частичное обновление. Внешний `None` — поле не трогаем, `Some(None)` — очищаем.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptPatch {
    pub date: Option<String>,
    pub nb: Option<Option<String>>,
    pub billed_amount: Option<Option<Decimal>>,
    pub advance_amount: Option<Option<Decimal>>,
}

impl ReceiptPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.nb.is_none()
            && self.billed_amount.is_none()
            && self.advance_amount.is_none()
    }

    pub fn apply(&self, r: &mut Receipt) {
        if let Some(d) = &self.date {
            r.date = d.clone();
        }
        if let Some(nb) = &self.nb {
            r.nb = nb.clone();
        }
        if let Some(b) = self.billed_amount {
            r.billed_amount = b;
        }
        if let Some(a) = self.advance_amount {
            r.advance_amount = a;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    /// Порядок по нормализованной дате.
    #[default]
    Chronological,
    /// Порядок задан пользователем перетаскиванием, до явного resort.
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnColors {
    pub date: String,
    pub nb: String,
    pub billed_amount: String,
    pub advance_amount: String,
    pub total: String,
}

impl Default for ColumnColors {
    fn default() -> Self {
        Self {
            date: "#09008a".into(),
            nb: "#09008a".into(),
            billed_amount: "#0ea5e9".into(),
            advance_amount: "#f97316".into(),
            total: "#22c55e".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowColors {
    pub even: String,
    pub odd: String,
    pub header: String,
}

impl Default for RowColors {
    fn default() -> Self {
        Self {
            even: "#ffffff".into(),
            odd: "#f3f4f6".into(),
            header: "#f8fafc".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub column_colors: ColumnColors,
    #[serde(default)]
    pub row_colors: RowColors,
    #[serde(default)]
    pub order_mode: OrderMode,
}

impl Company {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            logo: None,
            column_colors: ColumnColors::default(),
            row_colors: RowColors::default(),
            order_mode: OrderMode::Chronological,
        }
    }

    /// Цвет колонки (`date`, `nb`, `billed_amount`, `advance_amount`, `total`)
    /// или строки (`even`, `odd`, `header`). Значение — `#rrggbb`.
    pub fn set_color(&mut self, slot: &str, hex: &str) -> Result<()> {
        let ok = hex.len() == 7 && hex.starts_with('#') && hex[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !ok {
            return Err(BonError::Validation(format!("color {hex:?} is not #rrggbb")));
        }
        let target = match slot {
            "date" => &mut self.column_colors.date,
            "nb" => &mut self.column_colors.nb,
            "billed_amount" => &mut self.column_colors.billed_amount,
            "advance_amount" => &mut self.column_colors.advance_amount,
            "total" => &mut self.column_colors.total,
            "even" => &mut self.row_colors.even,
            "odd" => &mut self.row_colors.odd,
            "header" => &mut self.row_colors.header,
            other => return Err(BonError::Validation(format!("unknown color slot {other:?}"))),
        };
        *target = hex.to_ascii_lowercase();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Add,
    Update,
    Delete,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Add => "add",
            HistoryAction::Update => "update",
            HistoryAction::Delete => "delete",
        }
    }
}

/// Снимок полей строки на момент действия. Все поля необязательны.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReceiptSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billed_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

impl From<&Receipt> for ReceiptSnapshot {
    fn from(r: &Receipt) -> Self {
        Self {
            date: Some(r.date.clone()),
            nb: r.nb.clone(),
            billed_amount: r.billed_amount,
            advance_amount: r.advance_amount,
            total: Some(r.total),
        }
    }
}

impl ReceiptSnapshot {
    /// Поля из `other` перекрывают наши, если заданы.
    pub fn merge(&mut self, other: &ReceiptSnapshot) {
        if other.date.is_some() {
            self.date = other.date.clone();
        }
        if other.nb.is_some() {
            self.nb = other.nb.clone();
        }
        if other.billed_amount.is_some() {
            self.billed_amount = other.billed_amount;
        }
        if other.advance_amount.is_some() {
            self.advance_amount = other.advance_amount;
        }
        if other.total.is_some() {
            self.total = other.total;
        }
    }

    pub fn to_new_receipt(&self) -> NewReceipt {
        NewReceipt {
            date: self.date.clone().unwrap_or_default(),
            nb: self.nb.clone(),
            billed_amount: self.billed_amount,
            advance_amount: self.advance_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub action: HistoryAction,
    pub receipt_id: String,
    pub details: ReceiptSnapshot,
    pub company_id: String,
}

/// То, что уходит в экспорт: имя для заголовка и пересчитанные строки.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSheet {
    pub company_name: String,
    pub receipts: Vec<Receipt>,
}

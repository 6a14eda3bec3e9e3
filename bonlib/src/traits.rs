//! Швы с внешним миром: хранилище строк, реестр компаний, журнал истории и форматы файлов.

use crate::{
    error::Result,
    model::{Company, HistoryAction, HistoryEntry, LedgerSheet, NewReceipt, OrderMode, Receipt, ReceiptPatch, ReceiptSnapshot},
};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};

/// Хранилище строк ledger. Один писатель на компанию: вызывающий сериализует мутации.
pub trait EntryStore {
    fn company(&self, company_id: &str) -> Result<Company>;
    fn set_order_mode(&mut self, company_id: &str, mode: OrderMode) -> Result<()>;

    /// Строки компании в сохранённом порядке (`position`).
    fn list_entries(&self, company_id: &str) -> Result<Vec<Receipt>>;
    fn get_entry(&self, id: &str) -> Result<Receipt>;
    /// Новая строка получает свежий id, нулевой total и позицию в конце.
    fn insert_entry(&mut self, company_id: &str, new: NewReceipt) -> Result<Receipt>;
    fn update_entry_fields(&mut self, id: &str, patch: &ReceiptPatch) -> Result<()>;
    fn delete_entry(&mut self, id: &str) -> Result<()>;
    fn persist_total(&mut self, id: &str, total: Decimal) -> Result<()>;
    fn persist_position(&mut self, id: &str, position: u32) -> Result<()>;
}

pub trait CompanyRegistry {
    fn companies(&self) -> Result<Vec<Company>>;
    fn add_company(&mut self, name: &str) -> Result<Company>;
    /// Перезаписывает имя, логотип и цвета. `order_mode` меняется только через `EntryStore`.
    fn save_company(&mut self, company: &Company) -> Result<()>;
    /// Удаляет компанию вместе со строками и историей.
    fn remove_company(&mut self, company_id: &str) -> Result<()>;
}

/// Журнал действий. Информационный: на корректность ledger не влияет.
pub trait HistoryLog {
    fn record_action(
        &mut self,
        action: HistoryAction,
        receipt_id: &str,
        details: ReceiptSnapshot,
        company_id: &str,
    ) -> Result<()>;
    /// Новые записи первыми.
    fn history(&self, company_id: Option<&str>) -> Result<Vec<HistoryEntry>>;
    /// Вливает поля во все записи строки, возвращает число затронутых записей.
    fn update_details(&mut self, receipt_id: &str, details: &ReceiptSnapshot) -> Result<usize>;
    fn delete_for_entries(&mut self, receipt_ids: &[String]) -> Result<usize>;
    fn clear(&mut self, company_id: Option<&str>) -> Result<usize>;

    /// Самая свежая запись по строке.
    fn latest_for(&self, receipt_id: &str) -> Result<Option<HistoryEntry>> {
        Ok(self.history(None)?.into_iter().find(|h| h.receipt_id == receipt_id))
    }
}

pub trait ReadFormat {
    fn read<R: BufRead>(r: R) -> Result<Vec<NewReceipt>>;
}

pub trait WriteFormat {
    fn write<W: Write>(w: W, sheet: &LedgerSheet) -> Result<()>;
}

pub trait Format: ReadFormat + WriteFormat {}
impl<T: ReadFormat + WriteFormat> Format for T {}

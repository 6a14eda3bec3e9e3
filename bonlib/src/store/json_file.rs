//! Хранилище в JSON-файле: `MemoryStore`, который сбрасывается на диск после каждой успешной записи.
//!
//! Запись атомарная: сначала во временный файл рядом, потом rename.
//! Если файл записать не удалось, состояние в памяти откатывается к последнему сохранённому.

use super::memory::{MemoryStore, Snapshot};
use crate::{
    error::{BonError, Result},
    model::{Company, HistoryAction, HistoryEntry, NewReceipt, OrderMode, Receipt, ReceiptPatch, ReceiptSnapshot},
    traits::{CompanyRegistry, EntryStore, HistoryLog},
};
use rust_decimal::Decimal;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Открывает файл; если его нет, начинаем с пустого состояния (файл появится при первой записи).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let f = fs::File::open(&path)?;
            let data: Snapshot = serde_json::from_reader(BufReader::new(f))?;
            debug!(path = %path.display(), receipts = data.receipts.len(), "store loaded");
            MemoryStore::from_snapshot(data)
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.inner.snapshot()
    }

    fn save(&self, op: &'static str) -> Result<()> {
        self.write_file().map_err(|e| BonError::Store { op, reason: e.to_string() })
    }

    fn write_file(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut w = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut w, self.inner.snapshot())?;
            w.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Применяет `f` к копии в памяти и сохраняет. При ошибке записи прежнее состояние возвращается.
    fn mutate<T>(&mut self, op: &'static str, f: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let saved = self.inner.clone();
        let value = f(&mut self.inner)?;
        if let Err(e) = self.save(op) {
            warn!(op, path = %self.path.display(), error = %e, "write failed, rolled back");
            self.inner = saved;
            return Err(e);
        }
        Ok(value)
    }
}

impl EntryStore for JsonFileStore {
    fn company(&self, company_id: &str) -> Result<Company> {
        self.inner.company(company_id)
    }

    fn set_order_mode(&mut self, company_id: &str, mode: OrderMode) -> Result<()> {
        self.mutate("set_order_mode", |m| m.set_order_mode(company_id, mode))
    }

    fn list_entries(&self, company_id: &str) -> Result<Vec<Receipt>> {
        self.inner.list_entries(company_id)
    }

    fn get_entry(&self, id: &str) -> Result<Receipt> {
        self.inner.get_entry(id)
    }

    fn insert_entry(&mut self, company_id: &str, new: NewReceipt) -> Result<Receipt> {
        self.mutate("insert_entry", |m| m.insert_entry(company_id, new))
    }

    fn update_entry_fields(&mut self, id: &str, patch: &ReceiptPatch) -> Result<()> {
        self.mutate("update_entry_fields", |m| m.update_entry_fields(id, patch))
    }

    fn delete_entry(&mut self, id: &str) -> Result<()> {
        self.mutate("delete_entry", |m| m.delete_entry(id))
    }

    fn persist_total(&mut self, id: &str, total: Decimal) -> Result<()> {
        self.mutate("persist_total", |m| m.persist_total(id, total))
    }

    fn persist_position(&mut self, id: &str, position: u32) -> Result<()> {
        self.mutate("persist_position", |m| m.persist_position(id, position))
    }
}

impl CompanyRegistry for JsonFileStore {
    fn companies(&self) -> Result<Vec<Company>> {
        self.inner.companies()
    }

    fn add_company(&mut self, name: &str) -> Result<Company> {
        self.mutate("add_company", |m| m.add_company(name))
    }

    fn save_company(&mut self, company: &Company) -> Result<()> {
        self.mutate("save_company", |m| m.save_company(company))
    }

    fn remove_company(&mut self, company_id: &str) -> Result<()> {
        self.mutate("remove_company", |m| m.remove_company(company_id))
    }
}

impl HistoryLog for JsonFileStore {
    fn record_action(
        &mut self,
        action: HistoryAction,
        receipt_id: &str,
        details: ReceiptSnapshot,
        company_id: &str,
    ) -> Result<()> {
        self.mutate("record_action", |m| m.record_action(action, receipt_id, details, company_id))
    }

    fn history(&self, company_id: Option<&str>) -> Result<Vec<HistoryEntry>> {
        self.inner.history(company_id)
    }

    fn update_details(&mut self, receipt_id: &str, details: &ReceiptSnapshot) -> Result<usize> {
        self.mutate("update_details", |m| m.update_details(receipt_id, details))
    }

    fn delete_for_entries(&mut self, receipt_ids: &[String]) -> Result<usize> {
        self.mutate("delete_history", |m| m.delete_for_entries(receipt_ids))
    }

    fn clear(&mut self, company_id: Option<&str>) -> Result<usize> {
        self.mutate("clear_history", |m| m.clear(company_id))
    }
}

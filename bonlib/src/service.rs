//! Конвейер мутаций ledger.
//!
//! Любое изменение строк компании идёт одинаково: проверка, запись в хранилище,
//! полное перечитывание строк, пересчёт, запись изменившихся итогов и позиций, запись в историю.
//! Инкрементальных правок итогов нет.

use crate::{
    aggregate::{period_balances, Granularity, PeriodBalance},
    date::{normalize, ReceiptDate},
    error::{BonError, Result},
    ledger::{changed_totals, recalculate_in_sequence, recalculate_ledger},
    model::{HistoryAction, LedgerSheet, NewReceipt, OrderMode, Receipt, ReceiptPatch, ReceiptSnapshot},
    traits::{EntryStore, HistoryLog},
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strictness {
    /// Ручной ввод: сумма BL обязательна, дата должна разбираться.
    Form,
    /// Импорт и восстановление: берём как есть, проверяем только знак сумм.
    Relaxed,
}

pub struct LedgerService<S> {
    store: S,
}

impl<S: EntryStore + HistoryLog> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Строки компании в порядке ledger, как они сохранены.
    pub fn ledger(&self, company_id: &str) -> Result<Vec<Receipt>> {
        self.store.list_entries(company_id)
    }

    /// Пересчитанный ledger и имя компании, для экспорта.
    pub fn sheet(&mut self, company_id: &str) -> Result<LedgerSheet> {
        let receipts = self.refresh(company_id)?;
        let company = self.store.company(company_id)?;
        Ok(LedgerSheet { company_name: company.name, receipts })
    }

    /// Балансы по периодам. Сначала пересчёт, чтобы итоги, оставшиеся после сбоя записи, не попали в сводку.
    pub fn summary(&mut self, company_id: &str, g: Granularity) -> Result<Vec<PeriodBalance>> {
        let ledger = self.refresh(company_id)?;
        Ok(period_balances(&ledger, g))
    }

    /// Полный пересчёт и запись того, что изменилось. После ошибки хранилища
    /// достаточно вызвать ещё раз: результат от старых итогов не зависит.
    pub fn refresh(&mut self, company_id: &str) -> Result<Vec<Receipt>> {
        let mode = self.store.company(company_id)?.order_mode;
        let before = self.store.list_entries(company_id)?;
        let mut after = match mode {
            OrderMode::Chronological => recalculate_ledger(before.clone())?,
            OrderMode::Manual => recalculate_in_sequence(before.clone())?,
        };

        for (pos, r) in after.iter_mut().enumerate() {
            let pos = pos as u32;
            if r.position != pos {
                self.store.persist_position(&r.id, pos)?;
                r.position = pos;
            }
        }

        let changed = changed_totals(&before, &after);
        for (written, (id, total)) in changed.iter().enumerate() {
            if let Err(e) = self.store.persist_total(id, *total) {
                warn!(company = company_id, written, pending = changed.len() - written, error = %e,
                    "persisting totals failed mid-way");
                return Err(e);
            }
        }
        debug!(company = company_id, ?mode, rows = after.len(), changed = changed.len(), "ledger refreshed");
        Ok(after)
    }

    pub fn add(&mut self, company_id: &str, new: NewReceipt) -> Result<Receipt> {
        validate_new(&new, Strictness::Form)?;
        self.insert_and_refresh(company_id, new)
    }

    pub fn update(&mut self, id: &str, patch: &ReceiptPatch) -> Result<Receipt> {
        validate_patch(patch)?;
        let current = self.store.get_entry(id)?;
        if patch.is_empty() {
            return Ok(current);
        }
        self.store.update_entry_fields(id, patch)?;
        let ledger = self.refresh(&current.company_id)?;
        let updated = find(ledger, id)?;

        self.note(HistoryAction::Update, &updated);
        info!(id, company = %updated.company_id, "receipt updated");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let current = self.store.get_entry(id)?;
        self.store.delete_entry(id)?;
        // строки уже нет: запись в историю нужна для restore, даже если пересчёт упадёт
        self.note(HistoryAction::Delete, &current);
        info!(id, company = %current.company_id, "receipt deleted");

        self.refresh(&current.company_id)?;
        Ok(())
    }

    /// Перетаскивание строки на позицию `new_index` текущего порядка.
    /// Компания переходит в ручной порядок до явного `resort`.
    pub fn reorder(&mut self, company_id: &str, id: &str, new_index: usize) -> Result<Vec<Receipt>> {
        let mut seq = self.store.list_entries(company_id)?;
        let from = seq
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| BonError::NotFound(id.to_string()))?;
        let moved = seq.remove(from);
        let to = new_index.min(seq.len());
        seq.insert(to, moved);

        for (pos, r) in seq.iter().enumerate() {
            if r.position != pos as u32 {
                self.store.persist_position(&r.id, pos as u32)?;
            }
        }
        self.store.set_order_mode(company_id, OrderMode::Manual)?;
        info!(company = company_id, id, from, to, "receipt moved, manual order in effect");
        self.refresh(company_id)
    }

    /// Возврат к порядку по датам.
    pub fn resort(&mut self, company_id: &str) -> Result<Vec<Receipt>> {
        self.store.set_order_mode(company_id, OrderMode::Chronological)?;
        info!(company = company_id, "chronological order restored");
        self.refresh(company_id)
    }

    /// Пакетный импорт: либо все строки проходят проверку, либо ничего не пишется.
    /// Один пересчёт на весь пакет.
    pub fn import(&mut self, company_id: &str, rows: Vec<NewReceipt>) -> Result<Vec<Receipt>> {
        self.store.company(company_id)?;
        for (i, r) in rows.iter().enumerate() {
            validate_new(r, Strictness::Relaxed)
                .map_err(|e| BonError::Validation(format!("row {}: {e}", i + 1)))?;
        }

        let mut ids = Vec::with_capacity(rows.len());
        for r in rows {
            ids.push(self.store.insert_entry(company_id, r)?.id);
        }
        let ledger = self.refresh(company_id)?;

        for r in ledger.iter().filter(|r| ids.contains(&r.id)) {
            self.note(HistoryAction::Add, r);
        }
        info!(company = company_id, imported = ids.len(), "receipts imported");
        Ok(ledger)
    }

    /// Вставляет заново последнюю сохранённую в истории версию строки (новый id).
    pub fn restore(&mut self, receipt_id: &str) -> Result<Receipt> {
        let entry = self
            .store
            .latest_for(receipt_id)?
            .ok_or_else(|| BonError::NotFound(format!("history for {receipt_id}")))?;
        let new = entry.details.to_new_receipt();
        validate_new(&new, Strictness::Relaxed)?;
        self.insert_and_refresh(&entry.company_id, new)
    }

    fn insert_and_refresh(&mut self, company_id: &str, new: NewReceipt) -> Result<Receipt> {
        let inserted = self.store.insert_entry(company_id, new)?;
        let ledger = self.refresh(company_id)?;
        let added = find(ledger, &inserted.id)?;

        self.note(HistoryAction::Add, &added);
        info!(id = %added.id, company = company_id, total = %added.total, "receipt added");
        Ok(added)
    }

    /// История не влияет на ledger, поэтому её сбой только логируется.
    fn note(&mut self, action: HistoryAction, r: &Receipt) {
        if let Err(e) = self.store.record_action(action, &r.id, ReceiptSnapshot::from(r), &r.company_id) {
            warn!(id = %r.id, action = action.as_str(), error = %e, "history not recorded");
        }
    }
}

fn find(ledger: Vec<Receipt>, id: &str) -> Result<Receipt> {
    ledger
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| BonError::NotFound(id.to_string()))
}

fn check_amount(field: &str, v: Option<Decimal>) -> Result<()> {
    match v {
        Some(a) if a.is_sign_negative() && !a.is_zero() => {
            Err(BonError::Validation(format!("{field} must not be negative: {a}")))
        }
        _ => Ok(()),
    }
}

fn check_date(raw: &str) -> Result<()> {
    if !raw.trim().is_empty() && normalize(raw) == ReceiptDate::Unparseable {
        return Err(BonError::Validation(format!(
            "date {raw:?} is not YYYY-MM-DD, DD/MM/YYYY or YYYY"
        )));
    }
    Ok(())
}

fn validate_new(new: &NewReceipt, strictness: Strictness) -> Result<()> {
    check_amount("billed amount", new.billed_amount)?;
    check_amount("advance", new.advance_amount)?;
    if strictness == Strictness::Form {
        if new.billed_amount.is_none() {
            return Err(BonError::Validation("billed amount is required".into()));
        }
        check_date(&new.date)?;
    }
    Ok(())
}

fn validate_patch(patch: &ReceiptPatch) -> Result<()> {
    check_amount("billed amount", patch.billed_amount.flatten())?;
    check_amount("advance", patch.advance_amount.flatten())?;
    if let Some(d) = &patch.date {
        check_date(d)?;
    }
    Ok(())
}

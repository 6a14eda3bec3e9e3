//! Хранилище в памяти. Всё состояние лежит в одном `Snapshot`, который можно сериализовать целиком.

use crate::{
    error::{BonError, Result},
    model::{Company, HistoryAction, HistoryEntry, NewReceipt, OrderMode, Receipt, ReceiptPatch, ReceiptSnapshot},
    traits::{CompanyRegistry, EntryStore, HistoryLog},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    /// Новые записи в начале.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(data: Snapshot) -> Self {
        Self { data }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    fn receipt_mut(&mut self, id: &str) -> Result<&mut Receipt> {
        self.data
            .receipts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| BonError::NotFound(id.to_string()))
    }

    fn company_mut(&mut self, company_id: &str) -> Result<&mut Company> {
        self.data
            .companies
            .iter_mut()
            .find(|c| c.id == company_id)
            .ok_or_else(|| BonError::UnknownCompany(company_id.to_string()))
    }
}

impl EntryStore for MemoryStore {
    fn company(&self, company_id: &str) -> Result<Company> {
        self.data
            .companies
            .iter()
            .find(|c| c.id == company_id)
            .cloned()
            .ok_or_else(|| BonError::UnknownCompany(company_id.to_string()))
    }

    fn set_order_mode(&mut self, company_id: &str, mode: OrderMode) -> Result<()> {
        self.company_mut(company_id)?.order_mode = mode;
        Ok(())
    }

    fn list_entries(&self, company_id: &str) -> Result<Vec<Receipt>> {
        let mut out: Vec<Receipt> = self
            .data
            .receipts
            .iter()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.position);
        Ok(out)
    }

    fn get_entry(&self, id: &str) -> Result<Receipt> {
        self.data
            .receipts
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| BonError::NotFound(id.to_string()))
    }

    fn insert_entry(&mut self, company_id: &str, new: NewReceipt) -> Result<Receipt> {
        // строки без компании не бывает
        self.company(company_id)?;
        let position = self
            .data
            .receipts
            .iter()
            .filter(|r| r.company_id == company_id)
            .map(|r| r.position + 1)
            .max()
            .unwrap_or(0);

        let r = Receipt {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            date: new.date,
            nb: new.nb,
            billed_amount: new.billed_amount,
            advance_amount: new.advance_amount,
            total: Decimal::ZERO,
            position,
        };
        self.data.receipts.push(r.clone());
        Ok(r)
    }

    fn update_entry_fields(&mut self, id: &str, patch: &ReceiptPatch) -> Result<()> {
        patch.apply(self.receipt_mut(id)?);
        Ok(())
    }

    fn delete_entry(&mut self, id: &str) -> Result<()> {
        let before = self.data.receipts.len();
        self.data.receipts.retain(|r| r.id != id);
        if self.data.receipts.len() == before {
            return Err(BonError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn persist_total(&mut self, id: &str, total: Decimal) -> Result<()> {
        self.receipt_mut(id)?.total = total;
        Ok(())
    }

    fn persist_position(&mut self, id: &str, position: u32) -> Result<()> {
        self.receipt_mut(id)?.position = position;
        Ok(())
    }
}

impl CompanyRegistry for MemoryStore {
    fn companies(&self) -> Result<Vec<Company>> {
        Ok(self.data.companies.clone())
    }

    fn add_company(&mut self, name: &str) -> Result<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BonError::Validation("company name is empty".into()));
        }
        let c = Company::new(Uuid::new_v4().to_string(), name);
        self.data.companies.push(c.clone());
        Ok(c)
    }

    fn save_company(&mut self, company: &Company) -> Result<()> {
        let slot = self.company_mut(&company.id)?;
        let mode = slot.order_mode;
        *slot = Company { order_mode: mode, ..company.clone() };
        Ok(())
    }

    fn remove_company(&mut self, company_id: &str) -> Result<()> {
        self.company(company_id)?;
        self.data.companies.retain(|c| c.id != company_id);
        self.data.receipts.retain(|r| r.company_id != company_id);
        self.data.history.retain(|h| h.company_id != company_id);
        Ok(())
    }
}

impl HistoryLog for MemoryStore {
    fn record_action(
        &mut self,
        action: HistoryAction,
        receipt_id: &str,
        details: ReceiptSnapshot,
        company_id: &str,
    ) -> Result<()> {
        self.data.history.insert(
            0,
            HistoryEntry {
                at: Utc::now(),
                action,
                receipt_id: receipt_id.to_string(),
                details,
                company_id: company_id.to_string(),
            },
        );
        Ok(())
    }

    fn history(&self, company_id: Option<&str>) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .data
            .history
            .iter()
            .filter(|h| company_id.map_or(true, |c| h.company_id == c))
            .cloned()
            .collect())
    }

    fn update_details(&mut self, receipt_id: &str, details: &ReceiptSnapshot) -> Result<usize> {
        let mut n = 0;
        for h in self.data.history.iter_mut().filter(|h| h.receipt_id == receipt_id) {
            h.details.merge(details);
            n += 1;
        }
        Ok(n)
    }

    fn delete_for_entries(&mut self, receipt_ids: &[String]) -> Result<usize> {
        let before = self.data.history.len();
        self.data.history.retain(|h| !receipt_ids.contains(&h.receipt_id));
        Ok(before - self.data.history.len())
    }

    fn clear(&mut self, company_id: Option<&str>) -> Result<usize> {
        let before = self.data.history.len();
        match company_id {
            Some(c) => self.data.history.retain(|h| h.company_id != c),
            None => self.data.history.clear(),
        }
        Ok(before - self.data.history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_company() -> (MemoryStore, String) {
        let mut s = MemoryStore::new();
        let c = s.add_company("Sarl Atlas").unwrap();
        (s, c.id)
    }

    #[test]
    fn insert_appends_at_the_end() {
        let (mut s, c) = store_with_company();
        let a = s.insert_entry(&c, NewReceipt::default()).unwrap();
        let b = s.insert_entry(&c, NewReceipt::default()).unwrap();
        assert_eq!((a.position, b.position), (0, 1));
        assert_ne!(a.id, b.id);
        assert_eq!(a.total, Decimal::ZERO);
    }

    #[test]
    fn insert_requires_company() {
        let mut s = MemoryStore::new();
        let err = s.insert_entry("nope", NewReceipt::default()).unwrap_err();
        assert!(matches!(err, BonError::UnknownCompany(_)));
    }

    #[test]
    fn list_is_per_company_in_position_order() {
        let (mut s, c1) = store_with_company();
        let c2 = s.add_company("Other").unwrap().id;
        let a = s.insert_entry(&c1, NewReceipt::default()).unwrap();
        let b = s.insert_entry(&c1, NewReceipt::default()).unwrap();
        s.insert_entry(&c2, NewReceipt::default()).unwrap();

        s.persist_position(&a.id, 5).unwrap();
        let ids: Vec<_> = s.list_entries(&c1).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (mut s, _) = store_with_company();
        assert!(matches!(s.delete_entry("x"), Err(BonError::NotFound(_))));
        assert!(matches!(s.persist_total("x", Decimal::ONE), Err(BonError::NotFound(_))));
        assert!(matches!(s.get_entry("x"), Err(BonError::NotFound(_))));
    }

    #[test]
    fn removing_company_cascades() {
        let (mut s, c) = store_with_company();
        let r = s.insert_entry(&c, NewReceipt::default()).unwrap();
        s.record_action(HistoryAction::Add, &r.id, ReceiptSnapshot::from(&r), &c).unwrap();

        s.remove_company(&c).unwrap();
        assert!(s.snapshot().receipts.is_empty());
        assert!(s.snapshot().history.is_empty());
        assert!(s.companies().unwrap().is_empty());
    }

    #[test]
    fn save_company_keeps_order_mode() {
        let (mut s, c) = store_with_company();
        s.set_order_mode(&c, OrderMode::Manual).unwrap();
        let mut company = s.company(&c).unwrap();
        company.name = "Renamed".into();
        company.order_mode = OrderMode::Chronological;
        s.save_company(&company).unwrap();

        let stored = s.company(&c).unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.order_mode, OrderMode::Manual);
    }

    #[test]
    fn blank_company_name_rejected() {
        let mut s = MemoryStore::new();
        assert!(matches!(s.add_company("  "), Err(BonError::Validation(_))));
    }
}

//! Пересчёт ledger: нарастающий итог по хронологическому порядку строк.
//!
//! `total[i] = total[i-1] + contribution(i)`, аккумулятор стартует с нуля, поэтому
//! первая строка получает ровно свой вклад. Предыдущие значения `total` никогда не читаются,
//! так что повторный пересчёт даёт тот же результат.

use crate::{
    calc::contribution,
    date::{normalize, ReceiptDate},
    error::{BonError, Result},
    model::Receipt,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Индексы `entries` в хронологическом порядке. Сортировка стабильная:
/// равные даты и все неразобранные даты сохраняют входной порядок, неразобранные идут в конце.
pub fn chronological_order(entries: &[Receipt]) -> Vec<usize> {
    let keys: Vec<_> = entries.iter().map(|r| normalize(&r.date).chrono_key()).collect();
    let mut idx: Vec<usize> = (0..entries.len()).collect();
    idx.sort_by_key(|&i| keys[i]);
    idx
}

/// Сортирует по дате и пересчитывает итоги. Результат в хронологическом порядке.
pub fn recalculate_ledger(entries: Vec<Receipt>) -> Result<Vec<Receipt>> {
    check_ids(&entries)?;

    let odd = entries
        .iter()
        .filter(|r| !r.date.trim().is_empty() && normalize(&r.date) == ReceiptDate::Unparseable)
        .count();
    if odd > 0 {
        warn!(count = odd, "unparseable receipt dates, placed after dated rows");
    }

    let order = chronological_order(&entries);
    let mut slots: Vec<Option<Receipt>> = entries.into_iter().map(Some).collect();
    let sorted = order.into_iter().filter_map(|i| slots[i].take()).collect();
    Ok(accumulate(sorted))
}

/// Пересчёт в заданном порядке, без сортировки (ручной порядок после перетаскивания).
pub fn recalculate_in_sequence(entries: Vec<Receipt>) -> Result<Vec<Receipt>> {
    check_ids(&entries)?;
    Ok(accumulate(entries))
}

fn check_ids(entries: &[Receipt]) -> Result<()> {
    match entries.iter().position(|r| r.id.trim().is_empty()) {
        Some(pos) => Err(BonError::MissingId(pos)),
        None => Ok(()),
    }
}

fn accumulate(mut entries: Vec<Receipt>) -> Vec<Receipt> {
    let mut running = Decimal::ZERO;
    for r in entries.iter_mut() {
        running += contribution(r.billed_amount, r.advance_amount);
        r.total = running;
    }
    debug!(rows = entries.len(), closing = %running, "ledger recalculated");
    entries
}

/// Пары (id, новый total) для строк, у которых итог изменился относительно `before`.
/// Строки, которых не было в `before`, считаются изменившимися.
pub fn changed_totals(before: &[Receipt], after: &[Receipt]) -> Vec<(String, Decimal)> {
    let old: HashMap<&str, Decimal> = before.iter().map(|r| (r.id.as_str(), r.total)).collect();
    after
        .iter()
        .filter(|r| old.get(r.id.as_str()) != Some(&r.total))
        .map(|r| (r.id.clone(), r.total))
        .collect()
}

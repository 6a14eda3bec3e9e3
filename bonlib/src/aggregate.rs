//! Сводки по годам и месяцам поверх уже пересчитанного ledger. Только чтение.
//!
//! Баланс периода — `total` последней строки периода, а не сумма вкладов периода.

use crate::{calc::contribution, date::normalize, model::Receipt};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Year,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Period {
    Year(i32),
    Month(i32, u32),
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(y) => write!(f, "{y:04}"),
            Period::Month(y, m) => write!(f, "{y:04}-{m:02}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBalance {
    pub period: Period,
    /// Итог последней строки периода.
    pub balance: Decimal,
    pub rows: usize,
    /// Сумма вкладов строк периода (для справки).
    pub net: Decimal,
}

fn period_of(r: &Receipt, g: Granularity) -> Option<Period> {
    let d = normalize(&r.date);
    match g {
        Granularity::Year => d.year().map(Period::Year),
        Granularity::Month => d.year_month().map(|(y, m)| Period::Month(y, m)),
    }
}

/// `ledger` должен быть в порядке пересчёта. Строки без даты пропускаются,
/// строки-заглушки года попадают только в годовые периоды.
/// В ручном порядке баланс периода берётся у последней строки периода в этом порядке, а не у самой поздней по дате.
pub fn period_balances(ledger: &[Receipt], g: Granularity) -> Vec<PeriodBalance> {
    let mut buckets: BTreeMap<Period, PeriodBalance> = BTreeMap::new();
    for r in ledger {
        let Some(period) = period_of(r, g) else { continue };
        let b = buckets.entry(period).or_insert_with(|| PeriodBalance {
            period,
            balance: Decimal::ZERO,
            rows: 0,
            net: Decimal::ZERO,
        });
        b.balance = r.total;
        b.rows += 1;
        b.net += contribution(r.billed_amount, r.advance_amount);
    }
    buckets.into_values().collect()
}

/// Строки одного периода, в порядке ledger.
pub fn rows_in_period(ledger: &[Receipt], period: Period) -> Vec<&Receipt> {
    let g = match period {
        Period::Year(_) => Granularity::Year,
        Period::Month(..) => Granularity::Month,
    };
    ledger.iter().filter(|r| period_of(r, g) == Some(period)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{recalculate_in_sequence, recalculate_ledger};

    fn row(id: &str, date: &str, billed: i64, advance: i64) -> Receipt {
        Receipt {
            id: id.into(),
            company_id: "c1".into(),
            date: date.into(),
            nb: None,
            billed_amount: Some(Decimal::new(billed, 0)),
            advance_amount: Some(Decimal::new(advance, 0)),
            total: Decimal::ZERO,
            position: 0,
        }
    }

    #[test]
    fn month_reports_last_total_not_sum() {
        let ledger = recalculate_ledger(vec![
            row("a", "2025-03-01", 100, 0),
            row("b", "2025-03-10", 150, 0),
            row("c", "2025-03-20", 0, 70),
        ])
        .unwrap();
        assert_eq!(
            ledger.iter().map(|r| r.total).collect::<Vec<_>>(),
            vec![Decimal::new(100, 0), Decimal::new(250, 0), Decimal::new(180, 0)]
        );

        let months = period_balances(&ledger, Granularity::Month);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].period, Period::Month(2025, 3));
        assert_eq!(months[0].balance, Decimal::new(180, 0));
        assert_eq!(months[0].rows, 3);
    }

    #[test]
    fn balance_carries_history_from_earlier_periods() {
        let ledger = recalculate_ledger(vec![
            row("y", "2024", 1000, 0),
            row("a", "2024-11-05", 200, 0),
            row("b", "2025-01-16", 50, 0),
            row("c", "2025-02-01", 0, 500),
            row("n", "", 9, 0),
        ])
        .unwrap();

        let years = period_balances(&ledger, Granularity::Year);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].period, Period::Year(2024));
        assert_eq!(years[0].balance, Decimal::new(1200, 0));
        assert_eq!(years[0].rows, 2);
        assert_eq!(years[1].balance, Decimal::new(750, 0));
        assert_eq!(years[1].net, Decimal::new(-450, 0));

        let months = period_balances(&ledger, Granularity::Month);
        let labels: Vec<_> = months.iter().map(|m| m.period.to_string()).collect();
        assert_eq!(labels, vec!["2024-11", "2025-01", "2025-02"]);
        assert_eq!(months[1].balance, Decimal::new(1250, 0));
    }

    #[test]
    fn rows_of_a_period() {
        let ledger = recalculate_ledger(vec![
            row("y", "2025", 1, 0),
            row("a", "2025-01-16", 1, 0),
            row("b", "2025-02-01", 1, 0),
        ])
        .unwrap();
        let jan: Vec<_> = rows_in_period(&ledger, Period::Month(2025, 1)).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(jan, vec!["a"]);
        assert_eq!(rows_in_period(&ledger, Period::Year(2025)).len(), 3);
    }

    #[test]
    fn manual_order_takes_last_row_of_the_sequence() {
        // пользователь поставил мартовскую строку от 20-го раньше строки от 1-го
        let ledger = recalculate_in_sequence(vec![
            row("late", "2025-03-20", 100, 0),
            row("early", "2025-03-01", 0, 30),
        ])
        .unwrap();
        assert_eq!(ledger[1].id, "early");

        let months = period_balances(&ledger, Granularity::Month);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].balance, Decimal::new(70, 0));
        assert_eq!(months[0].net, Decimal::new(70, 0));
    }
}

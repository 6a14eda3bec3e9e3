//! Вклад одной строки в баланс.

use rust_decimal::Decimal;

/// `billed - advance`, отсутствующие суммы считаются нулём.
pub fn contribution(billed: Option<Decimal>, advance: Option<Decimal>) -> Decimal {
    billed.unwrap_or(Decimal::ZERO) - advance.unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_are_zero() {
        assert_eq!(contribution(None, None), Decimal::ZERO);
        assert_eq!(contribution(Some(Decimal::new(1870, 0)), None), Decimal::new(1870, 0));
        assert_eq!(contribution(None, Some(Decimal::new(1900, 0))), Decimal::new(-1900, 0));
    }

    #[test]
    fn exact_decimal_difference() {
        let c = contribution(Some(Decimal::new(1010, 2)), Some(Decimal::new(1000, 2)));
        assert_eq!(c, Decimal::new(10, 2));
    }
}

//! Money arithmetic with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the engine is a `rust_decimal::Decimal`; the helpers here
//! cover the operations that need a shared definition (percentages, rounding,
//! and lenient coercion of query-layer values).

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer};

/// Number of decimal places used for presented money values.
pub const CENT_PLACES: u32 = 2;

/// Money arithmetic helpers.
///
/// All functions are pure and never fail. Malformed input is coerced to zero
/// so aggregation paths always produce a number.
pub struct MoneyMath;

impl MoneyMath {
    /// Adds two amounts.
    #[must_use]
    pub fn add(a: Decimal, b: Decimal) -> Decimal {
        a + b
    }

    /// Subtracts `b` from `a`.
    #[must_use]
    pub fn sub(a: Decimal, b: Decimal) -> Decimal {
        a - b
    }

    /// Sums a sequence of amounts. An empty sequence sums to zero.
    pub fn sum<I>(amounts: I) -> Decimal
    where
        I: IntoIterator<Item = Decimal>,
    {
        amounts.into_iter().fold(Decimal::ZERO, Self::add)
    }

    /// Returns `percentage` percent of `amount` (e.g. 25% of 80 = 20).
    #[must_use]
    pub fn percent_of(amount: Decimal, percentage: Decimal) -> Decimal {
        amount * percentage / Decimal::ONE_HUNDRED
    }

    /// Returns `part` as a percentage of `whole`.
    ///
    /// A zero `whole` yields zero rather than a division error.
    #[must_use]
    pub fn ratio_percent(part: Decimal, whole: Decimal) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }
        part / whole * Decimal::ONE_HUNDRED
    }

    /// Rounds to cents using Banker's Rounding.
    #[must_use]
    pub fn round_cents(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(CENT_PLACES, RoundingStrategy::MidpointNearestEven)
    }

    /// Returns true if `a` and `b` differ by at most `tolerance`.
    #[must_use]
    pub fn within(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
        (a - b).abs() <= tolerance
    }

    /// Parses a decimal string, treating malformed input as zero.
    ///
    /// Accepts surrounding whitespace and scientific notation.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Decimal {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Decimal::ZERO;
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .unwrap_or_else(|_| {
                tracing::debug!(raw = %trimmed, "coercing malformed amount to zero");
                Decimal::ZERO
            })
    }
}

/// Serde helper accepting a number, a numeric string, or null.
///
/// Anything that does not parse becomes zero. Use with
/// `#[serde(deserialize_with = "lenient_decimal")]`.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => MoneyMath::parse_lenient(&s),
        serde_json::Value::Number(n) => MoneyMath::parse_lenient(&n.to_string()),
        _ => Decimal::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "lenient_decimal")]
        total: Decimal,
    }

    #[test]
    fn test_add_sub_are_exact() {
        assert_eq!(MoneyMath::add(dec!(0.1), dec!(0.2)), dec!(0.3));
        assert_eq!(MoneyMath::sub(dec!(100.00), dec!(0.01)), dec!(99.99));
    }

    #[test]
    fn test_sum_empty_is_zero() {
        assert_eq!(MoneyMath::sum(Vec::new()), Decimal::ZERO);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(MoneyMath::percent_of(dec!(80), dec!(25)), dec!(20));
        assert_eq!(MoneyMath::percent_of(dec!(1000), dec!(18)), dec!(180));
    }

    #[test]
    fn test_ratio_percent_zero_whole() {
        assert_eq!(MoneyMath::ratio_percent(dec!(60), dec!(100)), dec!(60));
        assert_eq!(MoneyMath::ratio_percent(dec!(5), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_round_cents_bankers() {
        assert_eq!(MoneyMath::round_cents(dec!(1.005)), dec!(1.00));
        assert_eq!(MoneyMath::round_cents(dec!(1.015)), dec!(1.02));
        assert_eq!(MoneyMath::round_cents(dec!(1066.1854)), dec!(1066.19));
    }

    #[test]
    fn test_within_tolerance() {
        assert!(MoneyMath::within(dec!(109.99), dec!(100), dec!(10)));
        assert!(!MoneyMath::within(dec!(110.01), dec!(100), dec!(10)));
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(MoneyMath::parse_lenient("12.50"), dec!(12.50));
        assert_eq!(MoneyMath::parse_lenient(" -3 "), dec!(-3));
        assert_eq!(MoneyMath::parse_lenient("1e2"), dec!(100));
        assert_eq!(MoneyMath::parse_lenient("abc"), Decimal::ZERO);
        assert_eq!(MoneyMath::parse_lenient(""), Decimal::ZERO);
    }

    #[test]
    fn test_lenient_deserialize() {
        let rows: Vec<Row> = serde_json::from_str(
            r#"[{"total": "42.10"}, {"total": 7}, {"total": "n/a"}, {"total": null}]"#,
        )
        .unwrap();
        let totals: Vec<Decimal> = rows.into_iter().map(|r| r.total).collect();
        assert_eq!(totals, vec![dec!(42.10), dec!(7), Decimal::ZERO, Decimal::ZERO]);
    }

    proptest! {
        /// Long summation chains stay exact: summing N copies of one cent is N cents.
        #[test]
        fn prop_sum_of_cents_is_exact(n in 0usize..5_000) {
            let total = MoneyMath::sum(std::iter::repeat_n(dec!(0.01), n));
            prop_assert_eq!(total, Decimal::new(i64::try_from(n).unwrap(), 2));
        }
    }
}

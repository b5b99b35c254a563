//! Lead package pricing.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::funnel::Recommendation;
use crate::funnel::prompts::DEFAULT_QUANTITY;

/// Largest order accepted through the chat funnel.
pub const MAX_QUANTITY: u32 = 500;

/// Price per lead in euros.
pub fn unit_price(package: Recommendation) -> Decimal {
    match package {
        Recommendation::Exclusieve => dec!(42.50),
        Recommendation::Gedeelde => dec!(15.00),
        // Half exclusive, half shared.
        Recommendation::Mixed => (dec!(42.50) + dec!(15.00)) / dec!(2),
    }
}

/// A priced order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub package: Recommendation,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
    /// Total in cents.
    pub amount_minor: i64,
}

/// Price `quantity` leads of `package`. A missing quantity falls back to the
/// default starter order; the quantity is clamped to `1..=MAX_QUANTITY`.
pub fn quote(package: Recommendation, quantity: Option<u32>) -> Quote {
    let quantity = quantity.unwrap_or(DEFAULT_QUANTITY).clamp(1, MAX_QUANTITY);
    let unit_price = unit_price(package);
    let total = (unit_price * Decimal::from(quantity)).round_dp(2);
    let amount_minor = (total * dec!(100)).round().to_i64().unwrap_or(0);

    Quote {
        package,
        quantity,
        unit_price,
        total,
        amount_minor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_quote() {
        let q = quote(Recommendation::Exclusieve, Some(10));
        assert_eq!(q.total, dec!(425.00));
        assert_eq!(q.amount_minor, 42_500);
    }

    #[test]
    fn shared_quote_uses_default_quantity() {
        let q = quote(Recommendation::Gedeelde, None);
        assert_eq!(q.quantity, DEFAULT_QUANTITY);
        assert_eq!(q.amount_minor, 37_500);
    }

    #[test]
    fn mixed_is_average_price() {
        assert_eq!(unit_price(Recommendation::Mixed), dec!(28.75));
        let q = quote(Recommendation::Mixed, Some(4));
        assert_eq!(q.amount_minor, 11_500);
    }

    #[test]
    fn quantity_is_clamped() {
        assert_eq!(quote(Recommendation::Gedeelde, Some(0)).quantity, 1);
        assert_eq!(
            quote(Recommendation::Gedeelde, Some(10_000)).quantity,
            MAX_QUANTITY
        );
    }

    #[test]
    fn amounts_are_always_positive() {
        for package in [
            Recommendation::Gedeelde,
            Recommendation::Exclusieve,
            Recommendation::Mixed,
        ] {
            assert!(quote(package, Some(1)).amount_minor > 0);
        }
    }
}

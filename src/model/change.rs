//! Detected price changes

use super::Quote;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price transition for one quote key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// The quote carrying the new price
    pub quote: Quote,
    pub old_price: Decimal,
    pub new_price: Decimal,
    /// `new_price - old_price`
    pub change_amount: Decimal,
    /// Relative change in percent, zero when the old price was zero
    pub change_percent: Decimal,
    pub detected_at: DateTime<Utc>,
}

impl Change {
    /// Build a change from the previous price to `quote.price`
    pub fn between(old_price: Decimal, quote: Quote, detected_at: DateTime<Utc>) -> Self {
        let new_price = quote.price;
        let change_amount = new_price - old_price;
        let change_percent = if old_price.is_zero() {
            Decimal::ZERO
        } else {
            change_amount / old_price * Decimal::ONE_HUNDRED
        };

        Self {
            quote,
            old_price,
            new_price,
            change_amount,
            change_percent,
            detected_at,
        }
    }

    pub fn is_increase(&self) -> bool {
        self.change_amount > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::quote::fixtures::quote;
    use rust_decimal_macros::dec;

    #[test]
    fn test_change_amount_and_percent() {
        let change = Change::between(dec!(10.00), quote("UPS", "UPS Ground", dec!(12.50)), Utc::now());
        assert_eq!(change.change_amount, dec!(2.50));
        assert_eq!(change.change_percent, dec!(25));
        assert!(change.is_increase());
    }

    #[test]
    fn test_decrease() {
        let change = Change::between(dec!(20.00), quote("UPS", "UPS Ground", dec!(15.00)), Utc::now());
        assert_eq!(change.change_amount, dec!(-5.00));
        assert_eq!(change.change_percent, dec!(-25));
        assert!(!change.is_increase());
    }

    #[test]
    fn test_zero_old_price_has_zero_percent() {
        let change = Change::between(Decimal::ZERO, quote("UPS", "UPS Ground", dec!(5.00)), Utc::now());
        assert_eq!(change.change_amount, dec!(5.00));
        assert_eq!(change.change_percent, Decimal::ZERO);
    }
}

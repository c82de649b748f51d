//! Per-trader account balances.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Address;

/// Margin and position balances for one trader.
///
/// `position` is signed: positive long, negative short. `index_value` and
/// `index_timestamp` capture the funding index the account was last settled
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub owner: Address,
    pub margin: Decimal,
    pub position: Decimal,
    pub index_value: Decimal,
    pub index_timestamp: DateTime<Utc>,
}

impl AccountState {
    /// Account equity when the position is marked at `price`.
    #[must_use]
    pub fn equity_at(&self, price: Decimal) -> Decimal {
        self.margin + self.position * price
    }

    #[must_use]
    pub fn is_long(&self) -> bool {
        self.position > Decimal::ZERO
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AccountState {
    pub fn dummy(margin: Decimal, position: Decimal) -> Self {
        Self {
            owner: Address::dummy(),
            margin,
            position,
            index_value: Decimal::ZERO,
            index_timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equity_marks_position_at_price() {
        let long = AccountState::dummy(Decimal::new(1_000, 0), Decimal::new(2, 0));
        assert_eq!(long.equity_at(Decimal::new(100, 0)), Decimal::new(1_200, 0));
        assert!(long.is_long());

        let short = AccountState::dummy(Decimal::new(1_000, 0), Decimal::new(-2, 0));
        assert_eq!(short.equity_at(Decimal::new(100, 0)), Decimal::new(800, 0));
        assert!(!short.is_long());
    }
}

//! Domain events the bus distributes.

use perpmatch_types::{AccountState, OrderRecord, PerpmatchError, Result, TradeHistoryRecord};

use crate::channel::Channel;
use crate::subscription::SubscriptionFilter;

/// Something that happened in the engine and is worth telling clients.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// An order was created, filled, or cancelled.
    OrderUpserted(OrderRecord),
    /// A trade settled on-chain and entered the history.
    TradeSettled(TradeHistoryRecord),
    /// A trader's balances changed.
    AccountUpdated(AccountState),
}

impl FeedEvent {
    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            Self::OrderUpserted(_) => Channel::Orders,
            Self::TradeSettled(_) => Channel::TradeHistory,
            Self::AccountUpdated(_) => Channel::AccountState,
        }
    }

    /// Whether `filter` selects this event.
    #[must_use]
    pub fn matches(&self, filter: &SubscriptionFilter) -> bool {
        match self {
            Self::OrderUpserted(record) => filter.matches_order(record),
            Self::TradeSettled(record) => filter.matches_trade(record),
            Self::AccountUpdated(account) => filter.matches_account(account),
        }
    }

    /// Serialize the payload for an update message.
    ///
    /// # Errors
    /// `Serialization` if the payload cannot be represented as JSON.
    pub fn payload(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::OrderUpserted(record) => serde_json::to_value(record),
            Self::TradeSettled(record) => serde_json::to_value(record),
            Self::AccountUpdated(account) => serde_json::to_value(account),
        };
        value.map_err(|err| PerpmatchError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perpmatch_types::{Order, Side};
    use rust_decimal::Decimal;

    #[test]
    fn events_map_to_their_channels() {
        let order = FeedEvent::OrderUpserted(OrderRecord::new(
            Order::dummy_limit(Side::Buy, Decimal::new(100, 0), Decimal::ONE),
            Decimal::ZERO,
            chrono::Utc::now(),
        ));
        assert_eq!(order.channel(), Channel::Orders);

        let account =
            FeedEvent::AccountUpdated(AccountState::dummy(Decimal::ONE, Decimal::ZERO));
        assert_eq!(account.channel(), Channel::AccountState);
    }

    #[test]
    fn order_payload_serializes_wire_shape() {
        let record = OrderRecord::new(
            Order::dummy_limit(Side::Sell, Decimal::new(100, 0), Decimal::new(2, 0)),
            Decimal::ZERO,
            chrono::Utc::now(),
        );
        let payload = FeedEvent::OrderUpserted(record.clone()).payload().unwrap();
        assert_eq!(payload["hash"], serde_json::json!(record.hash.to_string()));
        assert_eq!(payload["order"]["side"], serde_json::json!("SELL"));
    }
}

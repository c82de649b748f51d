//! Subscription filters and their matching rules.

use perpmatch_types::{AccountState, Address, ConnectionId, OrderRecord, TradeHistoryRecord};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// Optional address filter carried on a subscribe request.
///
/// An empty filter matches every event on the channel. When fields are set,
/// the subscription matches an event if *any* of them does: `maker`/`taker`
/// against the event's corresponding field, `trader` against either side.
/// Addresses compare case-insensitively; [`Address`] normalizes to
/// lowercase on construction, so plain equality suffices here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionFilter {
    pub maker: Option<Address>,
    pub taker: Option<Address>,
    pub trader: Option<Address>,
}

impl SubscriptionFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maker.is_none() && self.taker.is_none() && self.trader.is_none()
    }

    #[must_use]
    pub fn matches_order(&self, record: &OrderRecord) -> bool {
        self.matches_pair(&record.order.maker, &record.order.taker)
    }

    #[must_use]
    pub fn matches_trade(&self, record: &TradeHistoryRecord) -> bool {
        self.matches_pair(&record.maker, &record.taker)
    }

    #[must_use]
    pub fn matches_account(&self, account: &AccountState) -> bool {
        if self.is_empty() {
            return true;
        }
        [&self.maker, &self.taker, &self.trader]
            .into_iter()
            .flatten()
            .any(|address| *address == account.owner)
    }

    fn matches_pair(&self, maker: &Address, taker: &Address) -> bool {
        if self.is_empty() {
            return true;
        }
        self.maker.as_ref() == Some(maker)
            || self.taker.as_ref() == Some(taker)
            || self
                .trader
                .as_ref()
                .is_some_and(|t| t == maker || t == taker)
    }
}

/// One live subscription: a channel plus filter, owned by a connection and
/// addressed by the client-chosen request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub request_id: String,
    pub channel: Channel,
    pub filter: SubscriptionFilter,
    pub connection: ConnectionId,
}

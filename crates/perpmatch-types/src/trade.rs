//! Settled trade history rows.
//!
//! Each settlement batch produces one row per maker order touched plus a
//! single aggregate row for the incoming taker side, all sharing the batch's
//! transaction hash.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Side, TxHash};

/// Price precision for recorded trade rows.
const TRADE_PRICE_DP: u32 = 2;

/// One row of settled trade history.
///
/// Maker-leg rows carry the maker address with a zero taker; the aggregate
/// taker row carries the incoming trader as `taker` with a zero maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryRecord {
    pub maker: Address,
    pub taker: Address,
    pub side: Side,
    pub amount: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: TxHash,
    pub block_number: u64,
}

impl TradeHistoryRecord {
    /// Row for a single maker order's fill, priced at that maker's limit.
    #[must_use]
    pub fn maker_leg(
        maker: Address,
        side: Side,
        amount: Decimal,
        price: Decimal,
        tx_hash: TxHash,
        block_number: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            maker,
            taker: Address::zero(),
            side,
            amount,
            price: price.round_dp(TRADE_PRICE_DP),
            timestamp,
            tx_hash,
            block_number,
        }
    }

    /// Aggregate row for the incoming side of a batch, priced at the
    /// volume-weighted average across its maker legs.
    #[must_use]
    pub fn taker_aggregate(
        taker: Address,
        side: Side,
        amount: Decimal,
        notional: Decimal,
        tx_hash: TxHash,
        block_number: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let price = if amount.is_zero() {
            Decimal::ZERO
        } else {
            (notional / amount).round_dp(TRADE_PRICE_DP)
        };
        Self {
            maker: Address::zero(),
            taker,
            side,
            amount,
            price,
            timestamp,
            tx_hash,
            block_number,
        }
    }

    /// Traded value of this row.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.amount * self.price
    }
}

//! The order book service.
//!
//! Owns the stores and the settlement client, feeds snapshots into the
//! pure matching core, and enforces the settle-then-persist discipline:
//! nothing is written and no event published until the settlement batch
//! for a fulfilment has confirmed.

use chrono::{DateTime, Duration, Utc};
use perpmatch_feed::{BackfillSource, EventBus, FeedEvent, SubscriptionFilter};
use perpmatch_matchcore::{
    estimate_funding_rate, is_fresh, plan_fills, quote_snapshot, select_crossable, select_quotable,
    sort_snapshot, Quote,
};
use perpmatch_settlement::{SettlementClient, TradeBatch};
use perpmatch_types::{
    EngineConfig, FundingEstimate, Order, OrderHash, OrderRecord, OrderState, Paginated,
    PerpmatchError, Result, Side, TradeHistoryRecord,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::store::{OrderFilter, OrderStore, TradeStore};

/// How much of an incoming order crossed, and whether all of it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillOutcome {
    pub filled_amount: Decimal,
    pub is_fulfilled: bool,
}

/// Both sides of the live book, paginated independently.
#[derive(Debug, Clone, Serialize)]
pub struct OrderBookView {
    pub bids: Paginated<OrderRecord>,
    pub asks: Paginated<OrderRecord>,
}

/// The order book service: matching, settlement wiring, and queries over
/// pluggable order/trade stores.
///
/// Each call runs against a snapshot of the stores read at call start.
/// There is no lock spanning read-match-commit, so overlapping fulfilment
/// calls from multiple service instances can select the same resting
/// liquidity; the settlement layer is the backstop for such races.
#[derive(Debug)]
pub struct OrderBookService<S, T, C> {
    config: EngineConfig,
    orders: S,
    trades: T,
    settlement: C,
}

impl<S, T, C> OrderBookService<S, T, C>
where
    S: OrderStore,
    T: TradeStore,
    C: SettlementClient,
{
    pub fn new(config: EngineConfig, orders: S, trades: T, settlement: C) -> Self {
        Self {
            config,
            orders,
            trades,
            settlement,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The injected settlement client, for callers that settle outside the
    /// book (liquidations, deleveraging) or inspect it in tests.
    pub fn settlement(&self) -> &C {
        &self.settlement
    }

    /// Persist `order` as a resting record. `initial_filled` carries volume
    /// already crossed during intake, so the record rests with only its
    /// remainder available.
    ///
    /// No event is published here; announcing the order is the caller's
    /// decision (a fully crossed order is persisted but never announced).
    pub fn add_order(&mut self, order: Order, initial_filled: Decimal) -> OrderRecord {
        let record = OrderRecord::new(order, initial_filled, Utc::now());
        tracing::debug!(hash = %record.hash, filled = %record.filled_amount, "Order saved");
        self.orders.save(record.clone());
        record
    }

    /// # Errors
    /// `OrderNotFound` when no record exists under `hash`.
    pub fn get_order(&self, hash: &OrderHash) -> Result<OrderRecord> {
        self.orders
            .get(hash)
            .ok_or(PerpmatchError::OrderNotFound(*hash))
    }

    /// Query stored orders, freshest-bound and paginated.
    ///
    /// The freshness bound (`expiration >= now + buffer`) is stamped onto
    /// the filter here so every query variant, including the trader
    /// expansion, excludes orders about to lapse. Records come back in
    /// ascending hash order.
    pub fn orders(
        &self,
        mut filter: OrderFilter,
        page: usize,
        per_page: usize,
    ) -> Paginated<OrderRecord> {
        filter.min_expiration = Some(self.fresh_bound(Utc::now()));
        Paginated::paginate(self.orders.find(&filter), page, per_page)
    }

    /// Snapshot of both sides of the book, best price first.
    ///
    /// Only freshness is checked: a fully filled but unexpired order still
    /// appears, matching what subscribers were sent when it was placed.
    pub fn order_book(&self, page: usize, per_page: usize) -> OrderBookView {
        let now = Utc::now();
        let mut bids = Vec::new();
        let mut asks = Vec::new();
        for record in self.orders.find(&OrderFilter::default()) {
            if !is_fresh(&record, now, self.config.expiration_buffer_secs) {
                continue;
            }
            match record.order.side {
                Side::Buy => bids.push(record),
                Side::Sell => asks.push(record),
            }
        }
        sort_snapshot(&mut bids, Side::Buy);
        sort_snapshot(&mut asks, Side::Sell);
        OrderBookView {
            bids: Paginated::paginate(bids, page, per_page),
            asks: Paginated::paginate(asks, page, per_page),
        }
    }

    /// Settled trades, ascending by transaction hash.
    pub fn trade_history(&self, page: usize, per_page: usize) -> Paginated<TradeHistoryRecord> {
        Paginated::from_page(
            self.trades.page(page, per_page),
            self.trades.count(),
            page,
            per_page,
        )
    }

    /// Delete orders by hash and tell subscribers to drop them.
    ///
    /// Idempotent: unknown hashes are skipped. Each record that existed is
    /// published once more as cancelled with `filled_amount` forced to the
    /// full amount, which is the signal clients use to clear it locally.
    pub fn cancel_orders(&mut self, hashes: &[OrderHash], bus: &mut EventBus) {
        let mut events = Vec::new();
        for hash in hashes {
            let Some(mut record) = self.orders.get(hash) else {
                continue;
            };
            record.state = OrderState::Canceled;
            record.filled_amount = record.order.amount;
            events.push(FeedEvent::OrderUpserted(record));
        }
        self.orders.delete(hashes);
        if !events.is_empty() {
            tracing::info!(cancelled = events.len(), "Orders cancelled");
            bus.publish(&events);
        }
    }

    /// Price a hypothetical order of `amount` on `side` against the resting
    /// liquidity it would consume.
    pub fn quote(&self, amount: Decimal, side: Side) -> Quote {
        let snapshot = self.orders.find(&OrderFilter::default());
        let book = select_quotable(
            snapshot,
            side.opposite(),
            Utc::now(),
            self.config.expiration_buffer_secs,
        );
        quote_snapshot(&book, amount)
    }

    /// Match `incoming` against the book and settle every fill atomically.
    ///
    /// Crossable resting orders are consumed best price first. Each planned
    /// fill becomes two settlement legs, one against the resting order and
    /// one against `incoming`, both at the *resting* order's price and fee,
    /// with the operator account standing in as settlement taker. The whole
    /// batch commits as one transaction; only after confirmation are filled
    /// amounts persisted, trade rows appended (one per resting order plus a
    /// volume-weighted aggregate for `incoming`), and order/trade events
    /// published in a single pass.
    ///
    /// `incoming` itself is not persisted here; see [`Self::submit_order`].
    ///
    /// # Errors
    /// Any commit failure propagates with the book untouched and nothing
    /// published; the batch is safe to retry.
    pub fn fulfill_order(&mut self, incoming: &Order, bus: &mut EventBus) -> Result<FulfillOutcome> {
        let snapshot = self.orders.find(&OrderFilter::default());
        let book = select_crossable(
            snapshot,
            incoming,
            Utc::now(),
            self.config.expiration_buffer_secs,
        );
        let plan = plan_fills(&book, incoming.amount);
        if plan.is_empty() {
            return Ok(FulfillOutcome {
                filled_amount: Decimal::ZERO,
                is_fulfilled: false,
            });
        }

        let mut batch = TradeBatch::new(self.config.modules.clone());
        for fill in &plan.fills {
            batch.fill(
                &self.config.operator,
                &fill.record.order,
                fill.amount,
                fill.price,
                fill.fee,
            )?;
            batch.fill(
                &self.config.operator,
                incoming,
                fill.amount,
                fill.price,
                fill.fee,
            )?;
        }
        let receipt = batch.commit(&self.settlement, &self.config.operator)?;

        // Confirmed. Everything below is post-settlement bookkeeping.
        let settled_at = Utc::now();
        let mut events = Vec::with_capacity(plan.fills.len() * 2 + 1);
        for fill in &plan.fills {
            let mut record = fill.record.clone();
            record.record_fill(fill.amount)?;
            self.orders.save(record.clone());

            let row = TradeHistoryRecord::maker_leg(
                record.order.maker.clone(),
                record.order.side,
                fill.amount,
                fill.price,
                receipt.tx_hash,
                receipt.block_number,
                settled_at,
            );
            self.trades.append(row.clone());
            events.push(FeedEvent::OrderUpserted(record));
            events.push(FeedEvent::TradeSettled(row));
        }
        let aggregate = TradeHistoryRecord::taker_aggregate(
            incoming.maker.clone(),
            incoming.side,
            plan.filled_amount,
            plan.notional,
            receipt.tx_hash,
            receipt.block_number,
            settled_at,
        );
        self.trades.append(aggregate.clone());
        events.push(FeedEvent::TradeSettled(aggregate));
        bus.publish(&events);

        let is_fulfilled = plan.filled_amount == incoming.amount;
        tracing::info!(
            hash = %incoming.hash(),
            filled = %plan.filled_amount,
            fulfilled = is_fulfilled,
            tx = %receipt.tx_hash,
            "Incoming order fulfilled"
        );
        Ok(FulfillOutcome {
            filled_amount: plan.filled_amount,
            is_fulfilled,
        })
    }

    /// Full intake path for a new order: cross and settle what matches,
    /// then persist the order with whatever filled. The order is announced
    /// to subscribers only when it still has resting volume.
    ///
    /// # Errors
    /// Propagates [`Self::fulfill_order`] failures before anything is
    /// persisted.
    pub fn submit_order(
        &mut self,
        order: Order,
        bus: &mut EventBus,
    ) -> Result<(OrderRecord, FulfillOutcome)> {
        let outcome = self.fulfill_order(&order, bus)?;
        let record = self.add_order(order, outcome.filled_amount);
        if !outcome.is_fulfilled {
            bus.publish(&[FeedEvent::OrderUpserted(record.clone())]);
        }
        Ok((record, outcome))
    }

    /// Funding rate implied by the current book around `index_price`.
    ///
    /// Quotes a notional-sized amount on both sides and runs the estimator
    /// on the two quote prices plus the index as single-sample sequences.
    ///
    /// # Errors
    /// `Internal` when `index_price` is not positive.
    pub fn funding_estimate(&self, index_price: Decimal) -> Result<FundingEstimate> {
        if index_price <= Decimal::ZERO {
            return Err(PerpmatchError::Internal(
                "funding index price must be positive".to_string(),
            ));
        }
        let amount = self.config.funding_notional / index_price;
        let ask = self.quote(amount, Side::Buy);
        let bid = self.quote(amount, Side::Sell);
        let rate = estimate_funding_rate(&[ask.price], &[bid.price], &[index_price])?;
        Ok(FundingEstimate::at(rate, Utc::now()))
    }

    fn fresh_bound(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.config.expiration_buffer_secs)
    }
}

impl<S, T, C> BackfillSource for OrderBookService<S, T, C>
where
    S: OrderStore,
    T: TradeStore,
    C: SettlementClient,
{
    fn resting_orders(&self, filter: &SubscriptionFilter, limit: usize) -> Vec<OrderRecord> {
        self.orders
            .find(&OrderFilter::default())
            .into_iter()
            .filter(OrderRecord::is_fillable)
            .filter(|record| filter.matches_order(record))
            .take(limit)
            .collect()
    }

    fn recent_trades(&self, filter: &SubscriptionFilter, limit: usize) -> Vec<TradeHistoryRecord> {
        self.trades
            .page(1, self.trades.count())
            .into_iter()
            .filter(|row| filter.matches_trade(row))
            .take(limit)
            .collect()
    }
}

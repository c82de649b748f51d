//! Greedy fill planning and price quoting over sorted snapshots.
//!
//! The planner walks a best-first snapshot consuming remaining volume until
//! the requested amount is covered or the snapshot runs dry. It never
//! mutates the records it reads; applying a plan is the engine's job, after
//! settlement confirms.

use chrono::{DateTime, Utc};
use perpmatch_types::{Order, OrderRecord, Side};
use rust_decimal::Decimal;

use crate::fillability::is_fillable;
use crate::priority::sort_snapshot;

/// Price answer for a hypothetical fill of `amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Volume-weighted average price over the consumed orders; zero when
    /// nothing could be consumed.
    pub price: Decimal,
    pub filled_amount: Decimal,
    pub fulfilled: bool,
}

/// One planned consumption of a resting order.
#[derive(Debug, Clone)]
pub struct PlannedFill {
    /// Snapshot copy of the resting order, pre-fill.
    pub record: OrderRecord,
    /// Volume to take from it.
    pub amount: Decimal,
    /// Maker's limit price; the trade settles at this price.
    pub price: Decimal,
    /// Maker's fee terms, carried into the settlement leg.
    pub fee: Decimal,
}

/// The full result of planning a fill against a snapshot.
#[derive(Debug, Clone, Default)]
pub struct FillPlan {
    pub fills: Vec<PlannedFill>,
    pub filled_amount: Decimal,
    /// Sum of `amount × price` across fills.
    pub notional: Decimal,
}

impl FillPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Volume-weighted average price, zero when nothing filled.
    #[must_use]
    pub fn vw_price(&self) -> Decimal {
        if self.filled_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.notional / self.filled_amount
        }
    }
}

/// Walk an already-filtered, best-first snapshot and plan fills for
/// `amount`. Each step takes `min(remaining, record.remaining())` at the
/// resting order's limit price.
#[must_use]
pub fn plan_fills(snapshot: &[OrderRecord], amount: Decimal) -> FillPlan {
    let mut plan = FillPlan::default();
    let mut remaining = amount;
    for record in snapshot {
        if remaining <= Decimal::ZERO {
            break;
        }
        let available = record.remaining();
        if available <= Decimal::ZERO {
            continue;
        }
        let traded = remaining.min(available);
        plan.notional += traded * record.order.limit_price;
        remaining -= traded;
        plan.fills.push(PlannedFill {
            record: record.clone(),
            amount: traded,
            price: record.order.limit_price,
            fee: record.order.limit_fee,
        });
    }
    plan.filled_amount = amount - remaining;
    plan
}

/// Quote the price of filling `amount` against a sorted snapshot.
#[must_use]
pub fn quote_snapshot(snapshot: &[OrderRecord], amount: Decimal) -> Quote {
    let plan = plan_fills(snapshot, amount);
    Quote {
        price: plan.vw_price(),
        fulfilled: plan.filled_amount == amount,
        filled_amount: plan.filled_amount,
    }
}

/// Filter one resting side of a snapshot down to fillable orders and sort
/// it best-first, ready for [`quote_snapshot`].
#[must_use]
pub fn select_quotable(
    snapshot: Vec<OrderRecord>,
    resting_side: Side,
    now: DateTime<Utc>,
    buffer_secs: i64,
) -> Vec<OrderRecord> {
    let mut quotable: Vec<OrderRecord> = snapshot
        .into_iter()
        .filter(|r| r.order.side == resting_side)
        .filter(|r| is_fillable(r, now, buffer_secs))
        .collect();
    sort_snapshot(&mut quotable, resting_side);
    quotable
}

/// Filter a snapshot down to the resting orders an incoming order may
/// cross: opposite side, fillable, and priced within the incoming limit.
/// Sorted best-first, ready for [`plan_fills`].
#[must_use]
pub fn select_crossable(
    snapshot: Vec<OrderRecord>,
    incoming: &Order,
    now: DateTime<Utc>,
    buffer_secs: i64,
) -> Vec<OrderRecord> {
    let resting_side = incoming.side.opposite();
    let mut crossable: Vec<OrderRecord> = snapshot
        .into_iter()
        .filter(|r| r.order.side == resting_side)
        .filter(|r| is_fillable(r, now, buffer_secs))
        .filter(|r| incoming.accepts_price(r.order.limit_price))
        .collect();
    sort_snapshot(&mut crossable, resting_side);
    crossable
}

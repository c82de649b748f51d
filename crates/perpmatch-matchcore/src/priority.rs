//! Price-time priority ordering for book snapshots.

use std::cmp::Ordering;

use perpmatch_types::{OrderRecord, Side};

/// Compare two resting orders of the same side, best-first.
///
/// Bids rank by descending limit price, asks by ascending. Equal prices
/// fall back to submission time, then to order hash so the ordering is
/// total and stable across passes.
#[must_use]
pub fn book_priority(a: &OrderRecord, b: &OrderRecord, resting_side: Side) -> Ordering {
    let by_price = match resting_side {
        Side::Buy => b.order.limit_price.cmp(&a.order.limit_price),
        Side::Sell => a.order.limit_price.cmp(&b.order.limit_price),
    };
    by_price
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.hash.cmp(&b.hash))
}

/// Sort a snapshot of same-side resting orders into match priority.
pub fn sort_snapshot(records: &mut [OrderRecord], resting_side: Side) {
    records.sort_by(|a, b| book_priority(a, b, resting_side));
}

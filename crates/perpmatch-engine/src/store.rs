//! Persistence seams for orders and settled trades.
//!
//! The service is generic over [`OrderStore`] and [`TradeStore`] so the
//! matching pipeline can run against anything keyed like a table. The
//! in-memory implementations here back the tests and any single-process
//! deployment; both iterate in the same order a hash-indexed table would,
//! so pagination is reproducible.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use perpmatch_types::{Address, OrderHash, OrderRecord, Side, TradeHistoryRecord};

/// Query predicate over stored orders.
///
/// All set fields must hold, except that `trader` widens the party check:
/// the maker/taker constraints are evaluated once with `maker` pinned to
/// the trader and once with `taker` pinned, and either variant matching
/// suffices. This is how "all orders this address participates in" composes
/// with the remaining constraints.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub side: Option<Side>,
    pub maker: Option<Address>,
    pub taker: Option<Address>,
    /// Matches records where the address appears as either maker or taker.
    pub trader: Option<Address>,
    /// Only records expiring at or after this instant.
    pub min_expiration: Option<DateTime<Utc>>,
}

impl OrderFilter {
    #[must_use]
    pub fn matches(&self, record: &OrderRecord) -> bool {
        if self.side.is_some_and(|side| record.order.side != side) {
            return false;
        }
        if self
            .min_expiration
            .is_some_and(|min| record.order.expiration < min)
        {
            return false;
        }
        self.matches_parties(record)
    }

    fn matches_parties(&self, record: &OrderRecord) -> bool {
        let base = |maker: Option<&Address>, taker: Option<&Address>| {
            maker.is_none_or(|m| record.order.maker == *m)
                && taker.is_none_or(|t| record.order.taker == *t)
        };
        match &self.trader {
            None => base(self.maker.as_ref(), self.taker.as_ref()),
            Some(trader) => {
                base(Some(trader), self.taker.as_ref())
                    || base(self.maker.as_ref(), Some(trader))
            }
        }
    }
}

/// Keyed storage of order records.
pub trait OrderStore {
    /// All records matching `filter`, ordered by ascending hash.
    fn find(&self, filter: &OrderFilter) -> Vec<OrderRecord>;

    fn get(&self, hash: &OrderHash) -> Option<OrderRecord>;

    /// Insert or overwrite the record under its hash.
    fn save(&mut self, record: OrderRecord);

    /// Remove the given hashes; unknown hashes are ignored.
    fn delete(&mut self, hashes: &[OrderHash]);

    fn count(&self, filter: &OrderFilter) -> usize;
}

/// Append-only storage of settled trade rows.
pub trait TradeStore {
    fn append(&mut self, record: TradeHistoryRecord);

    /// One page, ordered by ascending transaction hash. Rows sharing a
    /// hash keep their insertion order.
    fn page(&self, page: usize, per_page: usize) -> Vec<TradeHistoryRecord>;

    fn count(&self) -> usize;
}

/// [`OrderStore`] over a `BTreeMap`; iteration order is hash order, which
/// gives `find` its ascending-hash guarantee for free.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    records: BTreeMap<OrderHash, OrderRecord>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl OrderStore for MemoryOrderStore {
    fn find(&self, filter: &OrderFilter) -> Vec<OrderRecord> {
        self.records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    fn get(&self, hash: &OrderHash) -> Option<OrderRecord> {
        self.records.get(hash).cloned()
    }

    fn save(&mut self, record: OrderRecord) {
        self.records.insert(record.hash, record);
    }

    fn delete(&mut self, hashes: &[OrderHash]) {
        for hash in hashes {
            self.records.remove(hash);
        }
    }

    fn count(&self, filter: &OrderFilter) -> usize {
        self.records
            .values()
            .filter(|record| filter.matches(record))
            .count()
    }
}

/// [`TradeStore`] over a plain vector, sorted on read.
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    records: Vec<TradeHistoryRecord>,
}

impl MemoryTradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeStore for MemoryTradeStore {
    fn append(&mut self, record: TradeHistoryRecord) {
        self.records.push(record);
    }

    fn page(&self, page: usize, per_page: usize) -> Vec<TradeHistoryRecord> {
        let mut rows = self.records.clone();
        // Stable, so rows from one batch stay in insertion order.
        rows.sort_by(|a, b| a.tx_hash.cmp(&b.tx_hash));
        let skip = page.saturating_sub(1).saturating_mul(per_page);
        rows.into_iter().skip(skip).take(per_page).collect()
    }

    fn count(&self) -> usize {
        self.records.len()
    }
}

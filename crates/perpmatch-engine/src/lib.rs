//! # perpmatch-engine
//!
//! Order book service tying the pure matching core to storage, settlement,
//! and the live feed:
//!
//! - [`OrderBookService`]: quote / fulfil / query / cancel operations over
//!   pluggable stores and a settlement client
//! - [`OrderStore`] / [`TradeStore`]: persistence seams with in-memory
//!   implementations
//! - [`OrderFilter`]: query predicate with maker/taker/trader expansion
//!
//! Fulfilment follows a strict settle-then-persist discipline: every fill
//! planned against the book is committed as one settlement batch, and order
//! state, trade history, and feed events are written only after the batch
//! confirms. A failed commit leaves the book exactly as it was.

pub mod orderbook;
pub mod store;

pub use orderbook::{FulfillOutcome, OrderBookService, OrderBookView};
pub use store::{MemoryOrderStore, MemoryTradeStore, OrderFilter, OrderStore, TradeStore};

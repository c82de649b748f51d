//! # perpmatch-types
//!
//! Shared types, errors, and configuration for the **perpmatch** exchange
//! core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`OrderHash`], [`TxHash`], [`ConnectionId`]
//! - **Order model**: [`Order`], [`OrderRecord`], [`Side`], [`OrderState`]
//! - **Trade model**: [`TradeHistoryRecord`]
//! - **Settlement model**: [`Receipt`]
//! - **Account model**: [`AccountState`]
//! - **Funding model**: [`FundingEstimate`]
//! - **Pagination**: [`Paginated`]
//! - **Configuration**: [`EngineConfig`], [`SettlementModules`], [`FeedConfig`]
//! - **Errors**: [`PerpmatchError`] with `PM_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod account;
pub mod config;
pub mod constants;
pub mod error;
pub mod funding;
pub mod ids;
pub mod order;
pub mod pagination;
pub mod receipt;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use perpmatch_types::{Order, OrderRecord, Side, Address, ...};

pub use account::*;
pub use config::*;
pub use error::*;
pub use funding::*;
pub use ids::*;
pub use order::*;
pub use pagination::*;
pub use receipt::*;
pub use trade::*;

// Constants are accessed via `perpmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).

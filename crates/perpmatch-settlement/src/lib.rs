//! Settlement batch construction and submission.
//!
//! Matched fills, liquidations, and deleveragings become legs of a
//! [`TradeBatch`]. Committing a batch encodes its participants into a
//! canonical account list, packs each leg into fixed-width instruction
//! words, and pushes the whole thing through a [`SettlementClient`] as one
//! atomic transaction.
//!
//! - [`batch`]: the builder and its open/committed state machine
//! - [`encode`]: fixed-width instruction encoding per settlement module
//! - [`client`]: the submission contract and a scriptable in-memory fake

pub mod batch;
pub mod client;
pub mod encode;

pub use batch::*;
pub use client::*;
pub use encode::*;

//! Pure matching and funding math over order snapshots.
//!
//! Everything here is a function of its inputs: the caller hands in a
//! snapshot of resting orders and a clock reading, and gets back a plan or
//! a number. No storage, no settlement, no events.
//!
//! - [`fillability`]: which resting orders a pass may consume
//! - [`priority`]: price-time ordering of a snapshot
//! - [`plan`]: greedy fill planning and price quoting
//! - [`funding`]: premium-based funding rate estimation

pub mod fillability;
pub mod funding;
pub mod plan;
pub mod priority;

pub use fillability::*;
pub use funding::*;
pub use plan::*;
pub use priority::*;

//! Live event distribution for orders, trades, and account balances.
//!
//! An [`EventBus`] owns a set of connections, each with its own
//! subscriptions. Domain events flow in through [`EventBus::publish`];
//! matching subscriptions receive coalesced update messages within the same
//! pass. New subscriptions get one backfill message before any live update.
//! The bus is an explicit instance owned by the composing layer; nothing
//! here is global.
//!
//! - [`channel`]: the three wire channels
//! - [`message`]: typed inbound decoding and outbound envelopes
//! - [`subscription`]: filters and their matching rules
//! - [`event`]: the domain events the bus fans out
//! - [`sink`]: the outbound transport seam (and a recording test double)
//! - [`bus`]: the bus itself

pub mod bus;
pub mod channel;
pub mod event;
pub mod message;
pub mod sink;
pub mod subscription;

pub use bus::*;
pub use channel::*;
pub use event::*;
pub use message::*;
pub use sink::*;
pub use subscription::*;

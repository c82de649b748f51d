//! Runtime configuration for the engine and the event feed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EXPIRATION_BUFFER_SECS, DEFAULT_HEARTBEAT_INTERVAL_MS, FUNDING_NOTIONAL,
};
use crate::Address;

/// Addresses of the on-chain settlement modules legs are routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementModules {
    pub orders: Address,
    pub liquidation: Address,
    pub deleveraging: Address,
}

impl Default for SettlementModules {
    fn default() -> Self {
        Self {
            orders: Address::zero(),
            liquidation: Address::zero(),
            deleveraging: Address::zero(),
        }
    }
}

/// Engine-side knobs: who settles, how stale an order may be, and how much
/// notional funding quotes sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Operator account that stands in as settlement taker for matched fills.
    pub operator: Address,
    /// Orders expiring within this many seconds are treated as stale.
    pub expiration_buffer_secs: i64,
    /// Quote notional sampled when estimating funding.
    pub funding_notional: Decimal,
    pub modules: SettlementModules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            operator: Address::zero(),
            expiration_buffer_secs: DEFAULT_EXPIRATION_BUFFER_SECS,
            funding_notional: FUNDING_NOTIONAL,
            modules: SettlementModules::default(),
        }
    }
}

/// Event feed knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Interval between liveness pings to connected clients.
    pub heartbeat_interval_ms: u64,
    /// Records per backfill message sent to a fresh subscription.
    pub backfill_page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            backfill_page_size: crate::constants::BACKFILL_PAGE_SIZE,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl SettlementModules {
    /// Three distinct module addresses so routing mistakes show up in tests.
    pub fn dummy() -> Self {
        Self {
            orders: Address::from("0x1111111111111111111111111111111111111111"),
            liquidation: Address::from("0x2222222222222222222222222222222222222222"),
            deleveraging: Address::from("0x3333333333333333333333333333333333333333"),
        }
    }
}

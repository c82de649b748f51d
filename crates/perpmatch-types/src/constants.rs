//! System-wide constants for the perpmatch exchange core.

use rust_decimal::Decimal;

/// The all-zero account address: "no counterparty" on trade-history rows,
/// "any taker" on orders.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Default pagination page (1-based).
pub const DEFAULT_PAGE: usize = 1;

/// Default pagination page size.
pub const DEFAULT_PER_PAGE: usize = 20;

/// Page size for the backfill message pushed on new subscriptions.
pub const BACKFILL_PAGE_SIZE: usize = 10;

/// Orders expiring within this many seconds are excluded from matching.
pub const DEFAULT_EXPIRATION_BUFFER_SECS: i64 = 10;

/// Interval between feed heartbeat passes, in milliseconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5_000;

/// Notional (in quote units) used to size funding-rate sample quotes.
pub const FUNDING_NOTIONAL: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);

/// Nominal number of funding samples per hour (one per minute).
pub const FUNDING_SAMPLES_PER_HOUR: usize = 60;

/// Funding epoch length in hours.
pub const FUNDING_EPOCH_HOURS: i64 = 8;

/// Seconds in one hour; funding rates are normalized per second.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Hourly interest-rate component of the funding rate (1.25e-5).
pub const INTEREST_RATE_PER_HOUR: Decimal = Decimal::from_parts(125, 0, 0, false, 7);

/// Decimal scale applied when packing prices/amounts into settlement
/// instruction words (10^18, mirroring on-chain fixed-point).
pub const SETTLEMENT_VALUE_SCALE: u32 = 18;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name.
pub const SERVICE_NAME: &str = "perpmatch";

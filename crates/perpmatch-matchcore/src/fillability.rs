//! Fillability rules: which resting orders a matching pass may touch.

use chrono::{DateTime, Duration, Utc};
use perpmatch_types::{OrderRecord, OrderState};

/// True when the order expires strictly after `now` plus the buffer.
/// The buffer guards against orders that would expire while a settlement
/// batch is in flight.
#[must_use]
pub fn is_fresh(record: &OrderRecord, now: DateTime<Utc>, buffer_secs: i64) -> bool {
    record.order.expiration > now + Duration::seconds(buffer_secs)
}

/// Full fillability check: fresh, not cancelled, with volume remaining.
#[must_use]
pub fn is_fillable(record: &OrderRecord, now: DateTime<Utc>, buffer_secs: i64) -> bool {
    record.state != OrderState::Canceled && record.is_fillable() && is_fresh(record, now, buffer_secs)
}

//! Funding rate estimate returned to clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A per-second funding rate stamped with its estimation time.
///
/// `timestamp` is a unix-seconds string to match the wire format clients
/// already parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingEstimate {
    pub funding_rate_per_second: Decimal,
    pub timestamp: String,
}

impl FundingEstimate {
    #[must_use]
    pub fn at(funding_rate_per_second: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            funding_rate_per_second,
            timestamp: now.timestamp().to_string(),
        }
    }
}

//! Feed channels.

use serde::{Deserialize, Serialize};

/// The three event channels a client may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "orders")]
    Orders,
    #[serde(rename = "tradeHistory")]
    TradeHistory,
    #[serde(rename = "accountState")]
    AccountState,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Orders => write!(f, "orders"),
            Self::TradeHistory => write!(f, "tradeHistory"),
            Self::AccountState => write!(f, "accountState"),
        }
    }
}

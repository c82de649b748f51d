//! Settlement confirmation receipt.

use serde::{Deserialize, Serialize};

use crate::TxHash;

/// Confirmation returned by the settlement layer for a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

impl Receipt {
    #[must_use]
    pub fn new(tx_hash: TxHash, block_number: u64) -> Self {
        Self {
            tx_hash,
            block_number,
        }
    }
}

//! Error types for the perpmatch exchange core.
//!
//! All errors use the `PM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Settlement batch errors
//! - 3xx: Settlement client errors
//! - 4xx: Funding estimator errors
//! - 5xx: Feed / transport errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::OrderHash;

/// Central error enum for all perpmatch operations.
#[derive(Debug, Error)]
pub enum PerpmatchError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order was not found in the store.
    #[error("PM_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderHash),

    /// The order failed validation (bad amounts, bad signature, etc.).
    #[error("PM_ERR_101: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// A fill would push `filled_amount` past the order's amount.
    #[error("PM_ERR_102: Fill exceeds order amount for {0}")]
    Overfill(OrderHash),

    // =================================================================
    // Settlement Batch Errors (2xx)
    // =================================================================
    /// The batch has already been committed; batches are single-use.
    #[error("PM_ERR_200: Operation already committed")]
    AlreadyCommitted,

    /// Commit was invoked on a batch with no legs.
    #[error("PM_ERR_201: No legs have been added to the batch")]
    NoLegsToCommit,

    // =================================================================
    // Settlement Client Errors (3xx)
    // =================================================================
    /// The settlement transaction was rejected or not confirmed.
    #[error("PM_ERR_300: Settlement rejected: {reason}")]
    SettlementRejected { reason: String },

    // =================================================================
    // Funding Estimator Errors (4xx)
    // =================================================================
    /// A funding input sequence does not match the ask-sequence length.
    #[error("PM_ERR_400: Funding {sequence} length {actual} does not match ask length {expected}")]
    DataLengthMismatch {
        sequence: &'static str,
        expected: usize,
        actual: usize,
    },

    // =================================================================
    // Feed / Transport Errors (5xx)
    // =================================================================
    /// An inbound subscription message failed schema validation.
    #[error("PM_ERR_500: Malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// A connection sink could not deliver an outbound frame.
    #[error("PM_ERR_501: Transport failure: {reason}")]
    Transport { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (disk, network).
    #[error("PM_ERR_902: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PerpmatchError>;

// Conversion from std::io::Error
impl From<std::io::Error> for PerpmatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

//! Submission contract between the batch builder and the settlement layer.

use perpmatch_types::{Address, Receipt, Result};

use crate::batch::EncodedLeg;

/// One-transaction settlement submission.
///
/// `submit` blocks until the settlement layer has accepted or rejected the
/// transaction; there is no partial acceptance. Implementations surface
/// rejection and confirmation failures as `SettlementRejected`.
pub trait SettlementClient {
    /// Submit a batch from `sender` covering `accounts`, carrying `legs`.
    ///
    /// # Errors
    /// `SettlementRejected` when the transaction reverts or fails to
    /// confirm; transport-level failures may surface as other variants.
    fn submit(&self, sender: &Address, accounts: &[Address], legs: &[EncodedLeg])
        -> Result<Receipt>;
}

#[cfg(any(test, feature = "test-helpers"))]
pub use fake::{FakeSettlementClient, RecordedSubmission};

#[cfg(any(test, feature = "test-helpers"))]
mod fake {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use perpmatch_types::{Address, PerpmatchError, Receipt, Result, TxHash};
    use sha2::{Digest, Sha256};

    use super::SettlementClient;
    use crate::batch::EncodedLeg;

    /// Everything one `submit` call carried.
    #[derive(Debug, Clone)]
    pub struct RecordedSubmission {
        pub sender: Address,
        pub accounts: Vec<Address>,
        pub legs: Vec<EncodedLeg>,
    }

    /// In-memory settlement double: records every submission, confirms with
    /// deterministic receipts, and fails on request.
    #[derive(Debug, Default)]
    pub struct FakeSettlementClient {
        submissions: RefCell<Vec<RecordedSubmission>>,
        scripted_failures: RefCell<VecDeque<String>>,
        block_number: Cell<u64>,
    }

    impl FakeSettlementClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the next `submit` call to fail with `SettlementRejected`.
        /// Multiple calls queue up failures in order.
        pub fn fail_next(&self, reason: &str) {
            self.scripted_failures
                .borrow_mut()
                .push_back(reason.to_string());
        }

        pub fn submissions(&self) -> Vec<RecordedSubmission> {
            self.submissions.borrow().clone()
        }

        pub fn submission_count(&self) -> usize {
            self.submissions.borrow().len()
        }

        fn tx_hash(&self, sender: &Address, legs: &[EncodedLeg], block: u64) -> TxHash {
            let mut hasher = Sha256::new();
            hasher.update(b"perpmatch:fake-tx:v1:");
            hasher.update(sender.as_str().as_bytes());
            hasher.update(block.to_le_bytes());
            for leg in legs {
                hasher.update(leg.data.as_bytes());
            }
            TxHash(hasher.finalize().into())
        }
    }

    impl SettlementClient for FakeSettlementClient {
        fn submit(
            &self,
            sender: &Address,
            accounts: &[Address],
            legs: &[EncodedLeg],
        ) -> Result<Receipt> {
            if let Some(reason) = self.scripted_failures.borrow_mut().pop_front() {
                return Err(PerpmatchError::SettlementRejected { reason });
            }
            let block = self.block_number.get() + 1;
            self.block_number.set(block);
            let tx_hash = self.tx_hash(sender, legs, block);
            self.submissions.borrow_mut().push(RecordedSubmission {
                sender: sender.clone(),
                accounts: accounts.to_vec(),
                legs: legs.to_vec(),
            });
            Ok(Receipt::new(tx_hash, block))
        }
    }
}

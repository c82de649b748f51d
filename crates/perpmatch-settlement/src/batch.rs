//! The settlement batch builder.
//!
//! Legs accumulate while the batch is Open; `commit` canonicalizes the
//! participant list, encodes every leg against it, and submits the whole
//! batch as one transaction. A batch commits at most once: failure reopens
//! it so the same legs can be retried, success freezes it.

use std::collections::BTreeSet;

use perpmatch_types::{Address, Order, PerpmatchError, Receipt, Result, SettlementModules};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::client::SettlementClient;
use crate::encode::{encode_deleverage, encode_fill, encode_liquidate};

/// One instruction within a batch, before account-index resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementLeg {
    pub maker: Address,
    pub taker: Address,
    /// Settlement module that interprets `data`.
    pub module: Address,
    /// Hex-encoded instruction words, `0x`-prefixed.
    pub data: String,
}

/// A leg with its participants resolved to indexes into the canonical
/// account list submitted alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedLeg {
    pub maker_index: usize,
    pub taker_index: usize,
    pub module: Address,
    pub data: String,
}

/// Builder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchState {
    Open,
    Committed,
}

/// Accumulates settlement legs and submits them atomically.
#[derive(Debug)]
pub struct TradeBatch {
    modules: SettlementModules,
    legs: Vec<SettlementLeg>,
    state: BatchState,
}

impl TradeBatch {
    #[must_use]
    pub fn new(modules: SettlementModules) -> Self {
        Self {
            modules,
            legs: Vec::new(),
            state: BatchState::Open,
        }
    }

    #[must_use]
    pub fn state(&self) -> BatchState {
        self.state
    }

    #[must_use]
    pub fn legs(&self) -> &[SettlementLeg] {
        &self.legs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Append an orders-module leg filling `amount` of `order` at `price`,
    /// with `taker` on the other side.
    ///
    /// # Errors
    /// `AlreadyCommitted` once the batch has committed; encoding range
    /// failures from the instruction packer.
    pub fn fill(
        &mut self,
        taker: &Address,
        order: &Order,
        amount: Decimal,
        price: Decimal,
        fee: Decimal,
    ) -> Result<&mut Self> {
        let data = encode_fill(order, amount, price, fee)?;
        self.push_leg(SettlementLeg {
            maker: order.maker.clone(),
            taker: taker.clone(),
            module: self.modules.orders.clone(),
            data,
        })
    }

    /// Append a liquidation-module leg closing `amount` of `maker`'s
    /// position into `taker`.
    ///
    /// # Errors
    /// Same failure modes as [`TradeBatch::fill`].
    pub fn liquidate(
        &mut self,
        maker: &Address,
        taker: &Address,
        amount: Decimal,
        is_buy: bool,
        all_or_nothing: bool,
    ) -> Result<&mut Self> {
        let data = encode_liquidate(amount, is_buy, all_or_nothing)?;
        self.push_leg(SettlementLeg {
            maker: maker.clone(),
            taker: taker.clone(),
            module: self.modules.liquidation.clone(),
            data,
        })
    }

    /// Append a deleveraging-module leg.
    ///
    /// # Errors
    /// Same failure modes as [`TradeBatch::fill`].
    pub fn deleverage(
        &mut self,
        maker: &Address,
        taker: &Address,
        amount: Decimal,
        is_buy: bool,
        all_or_nothing: bool,
    ) -> Result<&mut Self> {
        let data = encode_deleverage(amount, is_buy, all_or_nothing)?;
        self.push_leg(SettlementLeg {
            maker: maker.clone(),
            taker: taker.clone(),
            module: self.modules.deleveraging.clone(),
            data,
        })
    }

    fn push_leg(&mut self, leg: SettlementLeg) -> Result<&mut Self> {
        if self.state == BatchState::Committed {
            return Err(PerpmatchError::AlreadyCommitted);
        }
        self.legs.push(leg);
        Ok(self)
    }

    /// Canonical participant list: every maker and taker across all legs,
    /// deduplicated and sorted ascending. Leg encoding indexes into this
    /// list, so its order must not depend on leg insertion order.
    #[must_use]
    pub fn accounts(&self) -> Vec<Address> {
        let set: BTreeSet<Address> = self
            .legs
            .iter()
            .flat_map(|leg| [leg.maker.clone(), leg.taker.clone()])
            .collect();
        set.into_iter().collect()
    }

    /// Resolve every leg's participants against `accounts`.
    ///
    /// # Errors
    /// `Internal` if a leg references an address missing from `accounts`;
    /// cannot happen when `accounts` came from [`TradeBatch::accounts`].
    pub fn encoded_legs(&self, accounts: &[Address]) -> Result<Vec<EncodedLeg>> {
        let index_of = |address: &Address| {
            accounts.iter().position(|a| a == address).ok_or_else(|| {
                PerpmatchError::Internal(format!("account {address} missing from canonical list"))
            })
        };
        self.legs
            .iter()
            .map(|leg| {
                Ok(EncodedLeg {
                    maker_index: index_of(&leg.maker)?,
                    taker_index: index_of(&leg.taker)?,
                    module: leg.module.clone(),
                    data: leg.data.clone(),
                })
            })
            .collect()
    }

    /// Submit the batch as one transaction from `sender` and await
    /// confirmation.
    ///
    /// On failure the batch reopens with its legs intact so the caller can
    /// retry; on success it is frozen as Committed.
    ///
    /// # Errors
    /// `AlreadyCommitted` on a second successful commit, `NoLegsToCommit`
    /// for an empty batch, and whatever the client surfaces (typically
    /// `SettlementRejected`).
    pub fn commit(&mut self, client: &dyn SettlementClient, sender: &Address) -> Result<Receipt> {
        if self.state == BatchState::Committed {
            return Err(PerpmatchError::AlreadyCommitted);
        }
        if self.legs.is_empty() {
            return Err(PerpmatchError::NoLegsToCommit);
        }

        self.state = BatchState::Committed;
        let accounts = self.accounts();
        let encoded = self.encoded_legs(&accounts)?;
        match client.submit(sender, &accounts, &encoded) {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                self.state = BatchState::Open;
                tracing::warn!(error = %err, legs = self.legs.len(), "Settlement batch commit failed, batch reopened");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeSettlementClient;
    use perpmatch_types::{Order, Side};

    fn addr(tag: &str) -> Address {
        Address::from(format!("0x{}", tag.repeat(40 / tag.len())))
    }

    fn batch() -> TradeBatch {
        TradeBatch::new(SettlementModules::dummy())
    }

    #[test]
    fn commit_succeeds_once_then_fails() {
        let client = FakeSettlementClient::new();
        let sender = addr("e");
        let mut batch = batch();
        batch
            .liquidate(&addr("a"), &addr("b"), Decimal::ONE, true, false)
            .unwrap();

        let receipt = batch.commit(&client, &sender).unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(batch.state(), BatchState::Committed);

        let err = batch.commit(&client, &sender).unwrap_err();
        assert!(matches!(err, PerpmatchError::AlreadyCommitted));
        assert_eq!(client.submission_count(), 1);
    }

    #[test]
    fn empty_batch_refuses_commit() {
        let client = FakeSettlementClient::new();
        let err = batch().commit(&client, &addr("e")).unwrap_err();
        assert!(matches!(err, PerpmatchError::NoLegsToCommit));
        assert_eq!(client.submission_count(), 0);
    }

    #[test]
    fn accounts_are_sorted_regardless_of_insertion_order() {
        let (a, b, c) = (addr("a"), addr("b"), addr("c"));
        let mut batch = batch();
        batch
            .liquidate(&c, &c, Decimal::ONE, true, false)
            .unwrap()
            .liquidate(&a, &a, Decimal::ONE, true, false)
            .unwrap()
            .liquidate(&b, &b, Decimal::ONE, true, false)
            .unwrap();

        assert_eq!(batch.accounts(), vec![a.clone(), b, c.clone()]);

        let encoded = batch.encoded_legs(&batch.accounts()).unwrap();
        // first inserted leg references c, which sorts last
        assert_eq!(encoded[0].maker_index, 2);
        assert_eq!(encoded[1].maker_index, 0);
        assert_eq!(encoded[2].maker_index, 1);
    }

    #[test]
    fn accounts_deduplicate_shared_participants() {
        let (a, b) = (addr("a"), addr("b"));
        let mut batch = batch();
        batch
            .liquidate(&a, &b, Decimal::ONE, true, false)
            .unwrap()
            .liquidate(&b, &a, Decimal::ONE, false, false)
            .unwrap();
        assert_eq!(batch.accounts().len(), 2);
    }

    #[test]
    fn failed_commit_reopens_for_retry() {
        let client = FakeSettlementClient::new();
        let sender = addr("e");
        let mut batch = batch();
        batch
            .liquidate(&addr("a"), &addr("b"), Decimal::ONE, true, false)
            .unwrap();

        client.fail_next("reverted");
        let err = batch.commit(&client, &sender).unwrap_err();
        assert!(matches!(err, PerpmatchError::SettlementRejected { .. }));
        assert_eq!(batch.state(), BatchState::Open);
        assert_eq!(batch.legs().len(), 1);

        // same legs go through on retry
        let receipt = batch.commit(&client, &sender).unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(client.submissions()[0].legs.len(), 1);
    }

    #[test]
    fn no_appends_after_commit() {
        let client = FakeSettlementClient::new();
        let mut batch = batch();
        batch
            .liquidate(&addr("a"), &addr("b"), Decimal::ONE, true, false)
            .unwrap();
        batch.commit(&client, &addr("e")).unwrap();

        let err = batch
            .liquidate(&addr("a"), &addr("b"), Decimal::ONE, true, false)
            .unwrap_err();
        assert!(matches!(err, PerpmatchError::AlreadyCommitted));
    }

    #[test]
    fn legs_route_to_their_modules() {
        let modules = SettlementModules::dummy();
        let taker = addr("d");
        let order = Order::dummy_limit(Side::Buy, Decimal::new(100, 0), Decimal::new(2, 0));
        let mut batch = TradeBatch::new(modules.clone());
        batch
            .fill(&taker, &order, Decimal::ONE, Decimal::new(100, 0), Decimal::ZERO)
            .unwrap()
            .liquidate(&addr("a"), &taker, Decimal::ONE, true, false)
            .unwrap()
            .deleverage(&addr("b"), &taker, Decimal::ONE, false, true)
            .unwrap();

        let legs = batch.legs();
        assert_eq!(legs[0].module, modules.orders);
        assert_eq!(legs[1].module, modules.liquidation);
        assert_eq!(legs[2].module, modules.deleveraging);
        assert_eq!(legs[0].maker, order.maker);
        assert_eq!(legs[0].taker, taker);
    }

    #[test]
    fn fill_leg_carries_the_fill_instruction() {
        let order = Order::dummy_limit(Side::Sell, Decimal::new(101, 0), Decimal::new(5, 0));
        let mut batch = batch();
        batch
            .fill(
                &addr("d"),
                &order,
                Decimal::new(2, 0),
                Decimal::new(101, 0),
                Decimal::new(5, 4),
            )
            .unwrap();
        let expected = crate::encode::encode_fill(
            &order,
            Decimal::new(2, 0),
            Decimal::new(101, 0),
            Decimal::new(5, 4),
        )
        .unwrap();
        assert_eq!(batch.legs()[0].data, expected);
    }
}

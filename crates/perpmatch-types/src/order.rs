//! Order types for the perpmatch exchange core.
//!
//! An [`Order`]'s economic terms are immutable and identified by a
//! deterministic hash; mutable fill state lives on [`OrderRecord`].
//! The hash is the order's identity everywhere: store keys, cancel
//! requests, and settlement fill instructions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, OrderHash, PerpmatchError, Result};

/// Which side of the book an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    #[must_use]
    pub fn is_buy(self) -> bool {
        self == Self::Buy
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle state of a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Default state on submission; eligible for matching.
    Null,
    /// Approved on-chain ahead of settlement.
    Approved,
    /// Cancelled; excluded from matching.
    Canceled,
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// Immutable economic terms of a perpetual limit order.
///
/// `taker` set to the zero address means "any taker". `signature` is an
/// ed25519 signature over [`Order::signing_payload`]; key distribution and
/// wallet management are outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub maker: Address,
    pub taker: Address,
    pub side: Side,
    pub amount: Decimal,
    pub limit_price: Decimal,
    pub limit_fee: Decimal,
    /// Conditional activation price for stop-style orders; zero when unused.
    pub trigger_price: Decimal,
    /// When set, settlement only allows fills that reduce the position.
    pub is_decrease_only: bool,
    pub expiration: DateTime<Utc>,
    pub salt: u64,
    pub signature: Vec<u8>,
}

impl Order {
    /// Deterministic identity hash over the economic terms.
    ///
    /// SHA-256 of a domain-tagged, `:`-separated field encoding. The
    /// signature is excluded so that signing and hashing don't circle.
    #[must_use]
    pub fn hash(&self) -> OrderHash {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"perpmatch:order:v1");
        for field in [
            self.maker.as_str(),
            self.taker.as_str(),
            if self.side.is_buy() { "buy" } else { "sell" },
            &self.amount.to_string(),
            &self.limit_price.to_string(),
            &self.limit_fee.to_string(),
            &self.trigger_price.to_string(),
        ] {
            hasher.update(b":");
            hasher.update(field.as_bytes());
        }
        hasher.update(b":");
        hasher.update([u8::from(self.is_decrease_only)]);
        hasher.update(self.expiration.timestamp().to_le_bytes());
        hasher.update(self.salt.to_le_bytes());
        OrderHash(hasher.finalize().into())
    }

    /// Canonical bytes the maker signs: a domain tag over the identity hash.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(64);
        payload.extend_from_slice(b"perpmatch:order-sig:v1:");
        payload.extend_from_slice(self.hash().as_bytes());
        payload
    }

    /// Verify the order's ed25519 signature against the maker's key.
    #[must_use]
    pub fn verify_signature(&self, key: &ed25519_dalek::VerifyingKey) -> bool {
        use ed25519_dalek::Verifier;
        let Ok(sig) = ed25519_dalek::Signature::from_slice(&self.signature) else {
            return false;
        };
        key.verify(&self.signing_payload(), &sig).is_ok()
    }

    /// True when `price` satisfies this order's limit: a buy accepts prices
    /// at or below its limit, a sell at or above.
    #[must_use]
    pub fn accepts_price(&self, price: Decimal) -> bool {
        match self.side {
            Side::Buy => price <= self.limit_price,
            Side::Sell => price >= self.limit_price,
        }
    }
}

/// A persisted order plus its mutable fill metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order: Order,
    pub hash: OrderHash,
    pub filled_amount: Decimal,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Wrap a freshly submitted order. `filled_amount` may be non-zero when
    /// the order was partially crossed before being persisted as resting.
    #[must_use]
    pub fn new(order: Order, filled_amount: Decimal, created_at: DateTime<Utc>) -> Self {
        let hash = order.hash();
        Self {
            order,
            hash,
            filled_amount,
            state: OrderState::Null,
            created_at,
        }
    }

    /// Unfilled volume still available for matching.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.order.amount - self.filled_amount
    }

    #[must_use]
    pub fn is_fillable(&self) -> bool {
        self.filled_amount < self.order.amount
    }

    /// Record a confirmed fill.
    ///
    /// # Errors
    /// `Overfill` if the fill would push `filled_amount` past `amount`; the
    /// record is left untouched in that case.
    pub fn record_fill(&mut self, amount: Decimal) -> Result<()> {
        if self.filled_amount + amount > self.order.amount {
            return Err(PerpmatchError::Overfill(self.hash));
        }
        self.filled_amount += amount;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy_limit(side: Side, limit_price: Decimal, amount: Decimal) -> Self {
        Self {
            maker: Address::dummy(),
            taker: Address::zero(),
            side,
            amount,
            limit_price,
            limit_fee: Decimal::ZERO,
            trigger_price: Decimal::ZERO,
            is_decrease_only: false,
            expiration: Utc::now() + chrono::Duration::hours(1),
            salt: rand::random::<u64>(),
            signature: vec![0u8; 64],
        }
    }

    pub fn dummy_limit_for_maker(
        maker: Address,
        side: Side,
        limit_price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            maker,
            ..Self::dummy_limit(side, limit_price, amount)
        }
    }

    /// Dummy order carrying a real signature from `key`.
    pub fn dummy_signed(
        key: &ed25519_dalek::SigningKey,
        side: Side,
        limit_price: Decimal,
        amount: Decimal,
    ) -> Self {
        use ed25519_dalek::Signer;
        let mut order = Self::dummy_limit(side, limit_price, amount);
        order.signature = key.sign(&order.signing_payload()).to_bytes().to_vec();
        order
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl OrderRecord {
    /// Fresh unfilled resting order for tests.
    pub fn dummy_resting(side: Side, limit_price: Decimal, amount: Decimal) -> Self {
        Self::new(
            Order::dummy_limit(side, limit_price, amount),
            Decimal::ZERO,
            Utc::now(),
        )
    }
}

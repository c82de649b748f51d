//! Identifiers used throughout perpmatch.
//!
//! Account addresses are lowercase-normalised hex strings; order identity is
//! a deterministic SHA-256 over the order's economic terms; settlement
//! confirmations carry the transaction hash reported by the settlement
//! layer. Feed connections use UUIDv7 for time-ordered sorting.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An account address: `0x`-prefixed hex, normalised to lowercase.
///
/// Every comparison, sort, and map key in the system relies on the lowercase
/// form, so both the constructor and deserialisation normalise eagerly.
/// Sorting `Address` values sorts the canonical settlement account list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Address(String);

impl Address {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    /// The all-zero address: "no counterparty" / "any taker".
    #[must_use]
    pub fn zero() -> Self {
        Self(constants::ZERO_ADDRESS.to_string())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == constants::ZERO_ADDRESS
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// Random well-formed address for tests.
    #[must_use]
    pub fn dummy() -> Self {
        let bytes: [u8; 20] = rand::random();
        Self(format!("0x{}", hex::encode(bytes)))
    }
}

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// Deterministic order identity: SHA-256 over the order's economic terms.
///
/// Serialised as a `0x`-prefixed hex string. The ascending byte order of
/// hashes is the stable sort key for order queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct OrderHash(pub [u8; 32]);

impl OrderHash {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex form without the `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form for log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for OrderHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OrderHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let stripped = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("order hash must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// Hash of a settlement transaction, as reported by the settlement layer.
///
/// Trade-history rows carry the hash of the batch transaction that settled
/// them; all legs of one batch share one `TxHash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Abbreviated form for log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let stripped = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("tx hash must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

// ---------------------------------------------------------------------------
// ConnectionId
// ---------------------------------------------------------------------------

/// Unique identifier for one feed transport connection. Uses UUIDv7 for
/// time-ordered sorting of connection registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Globally unique identifiers used throughout OpenRamp.
//!
//! All entity IDs use UUIDv7: a high-resolution timestamp plus random
//! suffix, so identifier issuance is collision-resistant and time-ordered
//! without coupling it to any business logic.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Globally unique order identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Unique identifier for an end user (the buy/sell initiator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CounterpartyId
// ---------------------------------------------------------------------------

/// Unique identifier for a counterparty (merchant / agent liquidity provider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CounterpartyId(pub Uuid);

impl CounterpartyId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for CounterpartyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CounterpartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cp:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SettlementId
// ---------------------------------------------------------------------------

/// Unique identifier for a settlement receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Deterministic `SettlementId` derived from the order being settled.
    ///
    /// An order settles at most once, so its id fully determines the
    /// receipt id. Replays of the same settlement produce the same id,
    /// which makes receipts safe to deduplicate downstream.
    #[must_use]
    pub fn for_order(order_id: OrderId) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"openramp:settlement_id:v1:");
        hasher.update(order_id.0.as_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }

    /// Short hex fingerprint for logs and external references.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stl:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TradePair
// ---------------------------------------------------------------------------

/// A ramp pair: stablecoin base asset against a fiat quote currency
/// (e.g., USDC/KES).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TradePair {
    pub base: String,
    pub fiat: String,
}

impl TradePair {
    #[must_use]
    pub fn new(base: impl Into<String>, fiat: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            fiat: fiat.into(),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.fiat)
    }
}

impl fmt::Display for TradePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.fiat)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Counterparty (merchant / agent) model.
//!
//! A counterparty is a tradeable liquidity provider. Its per-asset
//! `max_amount` doubles as live capacity: the matching engine only reads
//! it, and only the settlement ledger ever mutates it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CounterpartyId, OrderSide};

/// Review status of a counterparty. Only `Approved` is matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterpartyStatus {
    Draft,
    UnderReview,
    Approved,
    Suspended,
    Blocked,
}

impl std::fmt::Display for CounterpartyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::UnderReview => write!(f, "UNDER_REVIEW"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Suspended => write!(f, "SUSPENDED"),
            Self::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// Payment rails a counterparty can transact over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethodKind {
    BankTransfer,
    MobileMoney,
    CryptoWallet,
}

impl std::fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BankTransfer => write!(f, "BANK_TRANSFER"),
            Self::MobileMoney => write!(f, "MOBILE_MONEY"),
            Self::CryptoWallet => write!(f, "CRYPTO_WALLET"),
        }
    }
}

/// A payment method a counterparty offers, with the instruction template
/// handed to users at match time (account number, paybill, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodTemplate {
    pub kind: PaymentMethodKind,
    pub instructions: serde_json::Value,
}

/// One asset a counterparty trades, with its live capacity and spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetOffering {
    /// Canonical asset symbol (e.g., "USDC").
    pub asset: String,
    /// Networks the counterparty supports for this asset.
    pub networks: Vec<String>,
    /// Minimum per-order amount.
    pub min_amount: Decimal,
    /// Maximum per-order amount, doubling as available tradeable
    /// capacity. Never negative; mutated only by settlement.
    pub max_amount: Decimal,
    /// Price spread the counterparty charges, as a fraction (0.01 = 1%).
    pub spread: Decimal,
}

/// Daily/monthly usage caps and their used-so-far counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLimits {
    /// Total-amount cap per day. Zero = uncapped.
    pub daily_cap: Decimal,
    pub daily_used: Decimal,
    /// Total-amount cap per month. Zero = uncapped.
    pub monthly_cap: Decimal,
    pub monthly_used: Decimal,
    /// Transaction-count cap per day. Zero = uncapped.
    pub daily_tx_cap: u32,
    pub daily_tx_count: u32,
    /// Per-transaction bounds.
    pub per_tx_min: Decimal,
    pub per_tx_max: Decimal,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            daily_cap: Decimal::ZERO,
            daily_used: Decimal::ZERO,
            monthly_cap: Decimal::ZERO,
            monthly_used: Decimal::ZERO,
            daily_tx_cap: 0,
            daily_tx_count: 0,
            per_tx_min: Decimal::ZERO,
            per_tx_max: Decimal::MAX,
        }
    }
}

impl UsageLimits {
    /// Whether `amount` fits within per-transaction and daily/monthly
    /// headroom.
    #[must_use]
    pub fn admits(&self, amount: Decimal) -> bool {
        if amount < self.per_tx_min || amount > self.per_tx_max {
            return false;
        }
        if !self.daily_cap.is_zero() && self.daily_used + amount > self.daily_cap {
            return false;
        }
        if !self.monthly_cap.is_zero() && self.monthly_used + amount > self.monthly_cap {
            return false;
        }
        if self.daily_tx_cap != 0 && self.daily_tx_count >= self.daily_tx_cap {
            return false;
        }
        true
    }

    /// Fraction of the daily amount cap still unused, in [0, 1].
    /// Uncapped counterparties report full headroom.
    #[must_use]
    pub fn daily_remaining_fraction(&self) -> Decimal {
        if self.daily_cap.is_zero() {
            return Decimal::ONE;
        }
        let remaining = (self.daily_cap - self.daily_used).max(Decimal::ZERO);
        remaining / self.daily_cap
    }

    /// Consume headroom after a settled order.
    pub fn record_use(&mut self, amount: Decimal) {
        self.daily_used += amount;
        self.monthly_used += amount;
        self.daily_tx_count += 1;
    }
}

/// Performance attributes feeding the matching score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    /// Rating on a 0–5 scale.
    pub rating: Decimal,
    pub completed_trades: u64,
    /// Completed / attempted, as a fraction.
    pub success_rate: Decimal,
    /// Average time to first response, in seconds.
    pub avg_response_secs: u64,
    /// Disputed / completed, as a fraction.
    pub dispute_rate: Decimal,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            rating: Decimal::ZERO,
            completed_trades: 0,
            success_rate: Decimal::ZERO,
            avg_response_secs: 0,
            dispute_rate: Decimal::ZERO,
        }
    }
}

/// A merchant/agent record in the counterparty directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: CounterpartyId,
    pub name: String,
    pub status: CounterpartyStatus,
    /// Order sides (from the user's perspective) this counterparty serves.
    pub services: Vec<OrderSide>,
    pub offerings: Vec<AssetOffering>,
    pub payment_methods: Vec<PaymentMethodTemplate>,
    pub limits: UsageLimits,
    pub performance: Performance,
}

impl Counterparty {
    /// Whether this counterparty may appear in matching at all.
    #[must_use]
    pub fn is_matchable(&self) -> bool {
        self.status == CounterpartyStatus::Approved
    }

    /// Find this counterparty's offering for an asset, if any.
    #[must_use]
    pub fn offering(&self, asset: &str) -> Option<&AssetOffering> {
        self.offerings.iter().find(|o| o.asset == asset)
    }

    /// The first payment method template of the given kind, falling back
    /// to the first offered method when `kind` is `None`.
    #[must_use]
    pub fn payment_template(&self, kind: Option<PaymentMethodKind>) -> Option<&PaymentMethodTemplate> {
        match kind {
            Some(k) => self.payment_methods.iter().find(|m| m.kind == k),
            None => self.payment_methods.first(),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Counterparty {
    #[must_use]
    pub fn dummy(asset: &str, capacity: Decimal, rating: Decimal) -> Self {
        Self {
            id: CounterpartyId::new(),
            name: "dummy".to_string(),
            status: CounterpartyStatus::Approved,
            services: vec![OrderSide::Buy, OrderSide::Sell],
            offerings: vec![AssetOffering {
                asset: asset.to_string(),
                networks: vec!["celo".to_string()],
                min_amount: Decimal::ONE,
                max_amount: capacity,
                spread: Decimal::new(1, 2),
            }],
            payment_methods: vec![PaymentMethodTemplate {
                kind: PaymentMethodKind::MobileMoney,
                instructions: serde_json::json!({ "phone": "+254700000000" }),
            }],
            limits: UsageLimits::default(),
            performance: Performance {
                rating,
                completed_trades: 25,
                success_rate: Decimal::new(95, 2),
                avg_response_secs: 45,
                dispute_rate: Decimal::ZERO,
            },
        }
    }
}

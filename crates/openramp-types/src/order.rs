//! Order model for the OpenRamp engine.
//!
//! An order freezes its conversion rate and amounts at creation time.
//! Re-pricing is explicitly a new order — nothing here is recomputed
//! after the order exists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CounterpartyId, OrderId, PaymentMethodKind, TradePair, UserId};

/// Which side of the ramp the initiating user is on.
///
/// `Buy` = user buys stablecoin for fiat (counterparty supplies crypto).
/// `Sell` = user sells stablecoin for fiat (counterparty receives crypto).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of an order.
///
/// `Completed`, `Expired`, and `Cancelled` are terminal; no transition
/// leaves them. The legality table lives in the lifecycle crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    PendingMerchants,
    MerchantAssigned,
    AwaitingPayment,
    PaymentReceived,
    PaymentVerified,
    Disputed,
    Completed,
    Expired,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition may leave this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Cancelled)
    }

    /// Whether the order is still expirable: anything before the payment
    /// confirmation chain finishes. `PaymentVerified` and `Disputed` orders
    /// have confirmed funds in flight and are excluded from expiry.
    #[must_use]
    pub fn is_expirable(self) -> bool {
        matches!(
            self,
            Self::Created
                | Self::PendingMerchants
                | Self::MerchantAssigned
                | Self::AwaitingPayment
                | Self::PaymentReceived
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::PendingMerchants => write!(f, "PENDING_MERCHANTS"),
            Self::MerchantAssigned => write!(f, "MERCHANT_ASSIGNED"),
            Self::AwaitingPayment => write!(f, "AWAITING_PAYMENT"),
            Self::PaymentReceived => write!(f, "PAYMENT_RECEIVED"),
            Self::PaymentVerified => write!(f, "PAYMENT_VERIFIED"),
            Self::Disputed => write!(f, "DISPUTED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Fee breakdown captured at order creation. All components may be zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub platform: Decimal,
    pub network: Decimal,
    pub counterparty: Decimal,
}

impl FeeBreakdown {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.platform + self.network + self.counterparty
    }
}

/// Selection criteria the matcher applies on behalf of this order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCriteria {
    /// Minimum counterparty rating (0–5 scale).
    pub min_rating: Decimal,
    /// Maximum acceptable average response time in seconds.
    pub max_response_secs: u64,
    /// Payment methods the user can use. Empty = any.
    pub payment_methods: Vec<PaymentMethodKind>,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            min_rating: Decimal::ZERO,
            max_response_secs: crate::constants::DEFAULT_MAX_RESPONSE_SECS,
            payment_methods: Vec::new(),
        }
    }
}

/// Record of what the matcher saw and decided for this order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Candidates considered, in ranked order.
    pub considered: Vec<CounterpartyId>,
    /// The counterparty ultimately selected.
    pub selected: Option<CounterpartyId>,
    /// Name of the assignment strategy that produced the selection.
    pub strategy: String,
}

/// Payment instructions resolved from the counterparty at match time.
/// Details are method-specific and opaque to the engine (bank account,
/// mobile-money number, wallet address).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub method: PaymentMethodKind,
    pub details: serde_json::Value,
}

/// The unit of work: one buy/sell request linking a user, an asset, a
/// fiat amount, and (once matched) a counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Assigned counterparty. `None` until matched.
    pub counterparty_id: Option<CounterpartyId>,
    pub side: OrderSide,
    pub pair: TradePair,
    /// Network the base asset moves on (e.g., "celo"). `None` = any.
    pub network: Option<String>,
    /// Fiat-per-unit-asset price frozen at creation. Never re-queried.
    pub rate: Decimal,
    /// Amount of the base asset (stablecoin).
    pub base_amount: Decimal,
    /// Amount of fiat: `base_amount * rate`, adjusted by fees.
    pub quote_amount: Decimal,
    pub fees: FeeBreakdown,
    pub status: OrderStatus,
    pub criteria: MatchCriteria,
    pub match_outcome: MatchOutcome,
    pub payment: Option<PaymentInstructions>,
    /// How many merchant-assignment passes have run for this order.
    pub assignment_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order's pricing fields are mutually consistent:
    /// `|quote_amount - base_amount * rate| <= fees.total()`.
    #[must_use]
    pub fn pricing_consistent(&self) -> bool {
        let gross = self.base_amount * self.rate;
        let drift = (self.quote_amount - gross).abs();
        drift <= self.fees.total()
    }

    /// Whether the order's expiry timestamp has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Touch the update timestamp. Called by the state machine on every
    /// mutation; never by readers.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    #[must_use]
    pub fn dummy(side: OrderSide, base_amount: Decimal, rate: Decimal) -> Self {
        Self::dummy_for_user(UserId::new(), side, base_amount, rate)
    }

    #[must_use]
    pub fn dummy_for_user(
        user_id: UserId,
        side: OrderSide,
        base_amount: Decimal,
        rate: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            counterparty_id: None,
            side,
            pair: TradePair::new("USDC", "KES"),
            network: None,
            rate,
            base_amount,
            quote_amount: base_amount * rate,
            fees: FeeBreakdown::default(),
            status: OrderStatus::Created,
            criteria: MatchCriteria::default(),
            match_outcome: MatchOutcome::default(),
            payment: None,
            assignment_attempts: 0,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(1800),
            updated_at: now,
        }
    }
}

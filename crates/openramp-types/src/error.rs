//! Error types for the OpenRamp engine.
//!
//! All errors use the `RAMP_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Ledger errors
//! - 3xx: Counterparty errors
//! - 4xx: Lifecycle errors
//! - 5xx: Matching errors
//! - 6xx: Settlement errors
//! - 7xx: Oracle errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{CounterpartyId, OrderId, OrderStatus};

/// Central error enum for all OpenRamp operations.
#[derive(Debug, Error)]
pub enum OpenrampError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order was not found in the store.
    #[error("RAMP_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order request failed validation (missing fields, bad values).
    #[error("RAMP_ERR_101: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// An order with this ID already exists.
    #[error("RAMP_ERR_102: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order has passed its expiry timestamp.
    #[error("RAMP_ERR_103: Order expired: {0}")]
    OrderExpired(OrderId),

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// A SELL-side debit would drive the user's balance negative and the
    /// shortfall policy is HardFail.
    #[error("RAMP_ERR_200: Insufficient user balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// A ledger operation would produce a negative value.
    #[error("RAMP_ERR_201: Ledger underflow")]
    LedgerUnderflow,

    // =================================================================
    // Counterparty Errors (3xx)
    // =================================================================
    /// The requested counterparty was not found in the directory.
    #[error("RAMP_ERR_300: Counterparty not found: {0}")]
    CounterpartyNotFound(CounterpartyId),

    /// The counterparty lacks tradeable capacity for the settling amount.
    /// Expected under concurrency: capacity may have been consumed by a
    /// concurrently settled order since matching time.
    #[error("RAMP_ERR_301: Insufficient counterparty capacity: need {needed}, have {available}")]
    InsufficientCounterpartyCapacity { needed: Decimal, available: Decimal },

    /// The counterparty does not offer the requested asset.
    #[error("RAMP_ERR_302: Counterparty {counterparty} has no offering for asset {asset}")]
    OfferingNotFound {
        counterparty: CounterpartyId,
        asset: String,
    },

    // =================================================================
    // Lifecycle Errors (4xx)
    // =================================================================
    /// The requested status transition is not legal from the order's
    /// current state, or a concurrent event won the transition race.
    /// Duplicate / late confirmation events land here — no side effects.
    #[error("RAMP_ERR_400: Invalid state transition for {order}: {from} -> {to}")]
    InvalidStateTransition {
        order: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Merchant assignment exhausted its bounded retry budget.
    #[error("RAMP_ERR_401: Assignment attempts exhausted for {order} after {attempts} tries")]
    AssignmentExhausted { order: OrderId, attempts: u32 },

    // =================================================================
    // Matching Errors (5xx)
    // =================================================================
    /// No eligible counterparty for the order's requirements. A normal,
    /// expected outcome — callers surface "try again later".
    #[error("RAMP_ERR_500: No liquidity: no eligible counterparty for {asset} amount {amount}")]
    NoLiquidity { asset: String, amount: Decimal },

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// Settlement of an order failed.
    #[error("RAMP_ERR_600: Settlement failed: {reason}")]
    SettlementFailed { reason: String },

    /// An order has already been settled (idempotency guard).
    #[error("RAMP_ERR_601: Order already settled: {0}")]
    OrderAlreadySettled(OrderId),

    /// Conservation invariant violated — critical safety alert.
    #[error("RAMP_ERR_602: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Oracle Errors (7xx)
    // =================================================================
    /// The price oracle returned no rate for the requested pair.
    #[error("RAMP_ERR_700: Rate unavailable for {base}/{fiat}")]
    RateUnavailable { base: String, fiat: String },

    /// The asset symbol or address could not be resolved.
    #[error("RAMP_ERR_701: Unsupported asset: {0}")]
    UnsupportedAsset(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("RAMP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("RAMP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config, missing fields, etc.).
    #[error("RAMP_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenrampError>;

impl OpenrampError {
    /// Whether this error is an expected, retryable business outcome
    /// rather than a caller bug or internal fault.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoLiquidity { .. }
                | Self::InsufficientCounterpartyCapacity { .. }
                | Self::RateUnavailable { .. }
        )
    }
}

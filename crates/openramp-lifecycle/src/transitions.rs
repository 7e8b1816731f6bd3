//! The order status legality table.
//!
//! ```text
//! CREATED -> PENDING_MERCHANTS -> MERCHANT_ASSIGNED -> AWAITING_PAYMENT
//!         -> PAYMENT_RECEIVED -> PAYMENT_VERIFIED -> COMPLETED
//! ```
//!
//! Side branches: any pre-completion state may go to `DISPUTED` (which
//! resolves to `COMPLETED` or `CANCELLED`); any expirable state may go
//! to `EXPIRED`; any pre-completion state may go to `CANCELLED`.
//! `COMPLETED`, `EXPIRED`, and `CANCELLED` are terminal.
//!
//! The expected-status slices below are the single source of truth for
//! the compare-and-set guards the state machine issues; every guard is
//! checked against [`is_legal`] in debug builds.

use openramp_types::OrderStatus;

/// States from which merchant assignment may run.
pub const ASSIGNABLE: &[OrderStatus] = &[OrderStatus::Created, OrderStatus::PendingMerchants];

/// States from which either party may raise a dispute.
pub const DISPUTABLE: &[OrderStatus] = &[
    OrderStatus::Created,
    OrderStatus::PendingMerchants,
    OrderStatus::MerchantAssigned,
    OrderStatus::AwaitingPayment,
    OrderStatus::PaymentReceived,
    OrderStatus::PaymentVerified,
];

/// States from which cancellation is allowed.
pub const CANCELLABLE: &[OrderStatus] = &[
    OrderStatus::Created,
    OrderStatus::PendingMerchants,
    OrderStatus::MerchantAssigned,
    OrderStatus::AwaitingPayment,
    OrderStatus::PaymentReceived,
    OrderStatus::PaymentVerified,
    OrderStatus::Disputed,
];

/// States subject to expiry: everything before the payment confirmation
/// chain finishes. Mirrors [`OrderStatus::is_expirable`].
pub const EXPIRABLE: &[OrderStatus] = &[
    OrderStatus::Created,
    OrderStatus::PendingMerchants,
    OrderStatus::MerchantAssigned,
    OrderStatus::AwaitingPayment,
    OrderStatus::PaymentReceived,
];

/// The only states from which an order may complete — and therefore the
/// only transitions permitted to trigger settlement.
pub const SETTLEABLE: &[OrderStatus] = &[OrderStatus::PaymentVerified, OrderStatus::Disputed];

/// Whether `from -> to` is a legal transition.
#[must_use]
pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus as S;

    if from.is_terminal() {
        return false;
    }
    match to {
        S::Created => false,
        // The self-loop is a bounded assignment retry.
        S::PendingMerchants => matches!(from, S::Created | S::PendingMerchants),
        S::MerchantAssigned => ASSIGNABLE.contains(&from),
        S::AwaitingPayment => from == S::MerchantAssigned,
        S::PaymentReceived => from == S::AwaitingPayment,
        S::PaymentVerified => from == S::PaymentReceived,
        S::Disputed => DISPUTABLE.contains(&from),
        S::Completed => SETTLEABLE.contains(&from),
        S::Expired => from.is_expirable(),
        S::Cancelled => CANCELLABLE.contains(&from),
    }
}

//! # openramp-settlement
//!
//! **Finality plane**: the settlement ledger that performs each order's
//! one balance mutation pair, plus its safety rails.
//!
//! ## Settlement sequence
//!
//! The [`Settler`] receives an order that reached a settling transition
//! and:
//! 1. Validates idempotency (no double-settlement)
//! 2. Re-checks and atomically adjusts counterparty capacity
//! 3. Atomically credits/debits the user ledger (with a compensating
//!    rollback if the second mutation fails)
//! 4. Records counterparty usage against daily/monthly caps
//! 5. Feeds the conservation audit and emits a receipt
//!
//! Capacity never goes negative; the user ledger never goes negative
//! (the SELL shortfall policy is explicit configuration).

pub mod conservation;
pub mod idempotency;
pub mod settler;

pub use conservation::ConservationAudit;
pub use idempotency::IdempotencyGuard;
pub use settler::Settler;

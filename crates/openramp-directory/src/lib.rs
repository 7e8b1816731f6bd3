//! # openramp-directory
//!
//! **Store plane**: repository traits and in-memory implementations for
//! the three shared-state stores of the engine:
//!
//! - [`CounterpartyDirectory`] — merchant records with atomic capacity
//!   increment/decrement
//! - [`OrderStore`] — orders with compare-and-set status transitions
//! - [`LedgerStore`] — per-(user, asset) balances with atomic
//!   credit/debit
//!
//! Every conditional update ("compare status then update", "check
//! capacity then consume") is a single critical section. Concurrent
//! request handlers share these stores via `Arc<dyn Trait>`; a lost race
//! surfaces as a typed error for the caller to retry, never a silent
//! overwrite.

pub mod counterparty_dir;
pub mod ledger;
pub mod order_store;

pub use counterparty_dir::{CounterpartyDirectory, InMemoryDirectory};
pub use ledger::{DebitOutcome, InMemoryLedger, LedgerStore};
pub use order_store::{InMemoryOrderStore, OrderStore};

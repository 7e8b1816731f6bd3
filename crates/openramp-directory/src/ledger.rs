//! User ledger store — per-(user, asset) available balances.
//!
//! A ledger entry is mutated exactly once per settling order, and every
//! mutation is a single atomic update. There is no read-modify-write
//! across lock boundaries.

use std::collections::HashMap;
use std::sync::Mutex;

use openramp_types::{Asset, OpenrampError, Result, ShortfallPolicy, UserId};
use rust_decimal::Decimal;

/// Result of a ledger debit: what was actually taken and what remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitOutcome {
    /// Amount actually removed from the balance.
    pub applied: Decimal,
    /// Balance after the debit.
    pub balance_after: Decimal,
    /// Requested minus applied, when the clamp policy absorbed a gap.
    pub shortfall: Option<Decimal>,
}

/// Repository contract for the user ledger.
pub trait LedgerStore: Send + Sync {
    /// Current balance for a (user, asset) pair. Missing entries are zero.
    fn balance(&self, user: UserId, asset: &str) -> Decimal;

    /// Atomically credit a balance. Returns the balance after.
    fn credit(&self, user: UserId, asset: &str, amount: Decimal) -> Decimal;

    /// Atomically debit a balance. Under `ClampToZero` a shortfall is
    /// absorbed and reported in the outcome; under `HardFail` the debit
    /// fails with `InsufficientBalance` and mutates nothing.
    fn debit(
        &self,
        user: UserId,
        asset: &str,
        amount: Decimal,
        policy: ShortfallPolicy,
    ) -> Result<DebitOutcome>;
}

/// In-memory ledger backed by a single mutex.
pub struct InMemoryLedger {
    balances: Mutex<HashMap<(UserId, Asset), Decimal>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Total balance of an asset across all users. Used by conservation
    /// checks in tests.
    #[must_use]
    pub fn total_supply(&self, asset: &str) -> Decimal {
        let balances = self.balances.lock().expect("ledger lock poisoned");
        balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedger {
    fn balance(&self, user: UserId, asset: &str) -> Decimal {
        let balances = self.balances.lock().expect("ledger lock poisoned");
        balances
            .get(&(user, asset.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn credit(&self, user: UserId, asset: &str, amount: Decimal) -> Decimal {
        let mut balances = self.balances.lock().expect("ledger lock poisoned");
        let entry = balances
            .entry((user, asset.to_string()))
            .or_insert(Decimal::ZERO);
        *entry += amount;
        *entry
    }

    fn debit(
        &self,
        user: UserId,
        asset: &str,
        amount: Decimal,
        policy: ShortfallPolicy,
    ) -> Result<DebitOutcome> {
        let mut balances = self.balances.lock().expect("ledger lock poisoned");
        let entry = balances
            .entry((user, asset.to_string()))
            .or_insert(Decimal::ZERO);

        if *entry >= amount {
            *entry -= amount;
            return Ok(DebitOutcome {
                applied: amount,
                balance_after: *entry,
                shortfall: None,
            });
        }

        match policy {
            ShortfallPolicy::HardFail => Err(OpenrampError::InsufficientBalance {
                needed: amount,
                available: *entry,
            }),
            ShortfallPolicy::ClampToZero => {
                let applied = *entry;
                let shortfall = amount - applied;
                *entry = Decimal::ZERO;
                tracing::warn!(
                    user = %user,
                    asset,
                    requested = %amount,
                    %applied,
                    %shortfall,
                    "Ledger debit clamped to zero"
                );
                Ok(DebitOutcome {
                    applied,
                    balance_after: Decimal::ZERO,
                    shortfall: Some(shortfall),
                })
            }
        }
    }
}

//! Counterparty directory — the shared pool of merchant records.
//!
//! The directory replaces ad hoc read-then-write call pairs with atomic
//! operations: capacity adjustment is a single check-and-apply step under
//! one lock, so two orders settling concurrently against the same
//! counterparty can never double-spend capacity or drive it negative.
//!
//! Matching only ever reads (via [`CounterpartyDirectory::snapshot`]);
//! capacity and usage counters are mutated exclusively by settlement.

use std::collections::HashMap;
use std::sync::Mutex;

use openramp_types::{Counterparty, CounterpartyId, OpenrampError, Result};
use rust_decimal::Decimal;

/// Repository contract for counterparty records.
pub trait CounterpartyDirectory: Send + Sync {
    /// Insert or replace a counterparty record.
    fn upsert(&self, counterparty: Counterparty);

    /// Fetch a counterparty by id.
    fn get(&self, id: CounterpartyId) -> Result<Counterparty>;

    /// A point-in-time clone of every matchable counterparty. The snapshot
    /// may be slightly stale relative to concurrent settlements; settlement
    /// re-checks capacity before mutating.
    fn snapshot(&self) -> Vec<Counterparty>;

    /// Atomically adjust the counterparty's tradeable capacity for an
    /// asset by `delta` (negative = consume). Fails without mutation if
    /// the result would be negative. Returns the capacity after the
    /// adjustment.
    fn adjust_capacity(&self, id: CounterpartyId, asset: &str, delta: Decimal) -> Result<Decimal>;

    /// Record settled usage against the counterparty's daily/monthly caps.
    fn record_usage(&self, id: CounterpartyId, amount: Decimal) -> Result<()>;
}

/// In-memory directory backed by a single mutex. Every trait operation is
/// one critical section, which is what makes `adjust_capacity` atomic.
pub struct InMemoryDirectory {
    records: Mutex<HashMap<CounterpartyId, Counterparty>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of records in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().expect("directory lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterpartyDirectory for InMemoryDirectory {
    fn upsert(&self, counterparty: Counterparty) {
        let mut records = self.records.lock().expect("directory lock poisoned");
        records.insert(counterparty.id, counterparty);
    }

    fn get(&self, id: CounterpartyId) -> Result<Counterparty> {
        let records = self.records.lock().expect("directory lock poisoned");
        records
            .get(&id)
            .cloned()
            .ok_or(OpenrampError::CounterpartyNotFound(id))
    }

    fn snapshot(&self) -> Vec<Counterparty> {
        let records = self.records.lock().expect("directory lock poisoned");
        let mut matchable: Vec<Counterparty> = records
            .values()
            .filter(|cp| cp.is_matchable())
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; sort by id so identical
        // directory contents always produce an identical snapshot.
        matchable.sort_by_key(|cp| cp.id);
        matchable
    }

    fn adjust_capacity(&self, id: CounterpartyId, asset: &str, delta: Decimal) -> Result<Decimal> {
        let mut records = self.records.lock().expect("directory lock poisoned");
        let cp = records
            .get_mut(&id)
            .ok_or(OpenrampError::CounterpartyNotFound(id))?;
        let offering = cp
            .offerings
            .iter_mut()
            .find(|o| o.asset == asset)
            .ok_or_else(|| OpenrampError::OfferingNotFound {
                counterparty: id,
                asset: asset.to_string(),
            })?;

        let next = offering.max_amount + delta;
        if next < Decimal::ZERO {
            return Err(OpenrampError::InsufficientCounterpartyCapacity {
                needed: -delta,
                available: offering.max_amount,
            });
        }

        offering.max_amount = next;
        tracing::debug!(
            counterparty = %id,
            asset,
            %delta,
            capacity_after = %next,
            "Capacity adjusted"
        );
        Ok(next)
    }

    fn record_usage(&self, id: CounterpartyId, amount: Decimal) -> Result<()> {
        let mut records = self.records.lock().expect("directory lock poisoned");
        let cp = records
            .get_mut(&id)
            .ok_or(OpenrampError::CounterpartyNotFound(id))?;
        cp.limits.record_use(amount);
        Ok(())
    }
}

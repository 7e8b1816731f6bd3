//! Settlement idempotency guard — prevents double-settlement.
//!
//! The lifecycle state machine's status compare-and-set is the primary
//! exactly-once mechanism; this guard is the settlement-local second
//! line of defense. It works as a reservation: [`IdempotencyGuard::begin`]
//! claims the order id before any balance mutation, so two concurrent
//! settlements of the same order cannot both proceed — the loser fails
//! immediately with [`OpenrampError::OrderAlreadySettled`]. A successful
//! settlement [`IdempotencyGuard::commit`]s the reservation; a failed one
//! [`IdempotencyGuard::abort`]s it, keeping the order replayable.
//!
//! The guard maintains an LRU-style bounded cache so memory usage stays
//! predictable in long-running processes.

use std::collections::{HashSet, VecDeque};

use openramp_types::{OpenrampError, OrderId, Result};

/// Prevents double-settlement of the same order.
///
/// Internally stores the set of in-flight reservations plus a bounded
/// set of settled `OrderId`s with LRU eviction. When the settled set
/// reaches `max_size`, the oldest entry is evicted to make room.
pub struct IdempotencyGuard {
    /// Order IDs currently being settled (reserved, not yet committed).
    in_flight: HashSet<OrderId>,
    /// Set of order IDs that have already been settled.
    settled: HashSet<OrderId>,
    /// Insertion order for LRU eviction (front = oldest).
    order: VecDeque<OrderId>,
    /// Maximum number of settled entries before eviction kicks in.
    max_size: usize,
}

impl IdempotencyGuard {
    /// Create a new guard with the given maximum cache size.
    ///
    /// # Panics
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "IdempotencyGuard max_size must be > 0");
        Self {
            in_flight: HashSet::new(),
            settled: HashSet::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Reserve an order id for settlement. Called before any balance
    /// mutation; must be paired with [`Self::commit`] or [`Self::abort`].
    ///
    /// # Errors
    /// Returns [`OpenrampError::OrderAlreadySettled`] if the order was
    /// already settled or is currently being settled.
    pub fn begin(&mut self, order_id: OrderId) -> Result<()> {
        if self.settled.contains(&order_id) || !self.in_flight.insert(order_id) {
            return Err(OpenrampError::OrderAlreadySettled(order_id));
        }
        Ok(())
    }

    /// Promote a reservation to settled. Called only after both balance
    /// mutations have been applied.
    pub fn commit(&mut self, order_id: OrderId) {
        self.in_flight.remove(&order_id);

        // Evict oldest if at capacity.
        if self.settled.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.settled.remove(&oldest);
            }
        }

        self.settled.insert(order_id);
        self.order.push_back(order_id);
    }

    /// Release a reservation after a failed settlement so the order
    /// stays retryable.
    pub fn abort(&mut self, order_id: OrderId) {
        self.in_flight.remove(&order_id);
    }

    /// Check whether an order has already been settled.
    #[must_use]
    pub fn is_settled(&self, order_id: &OrderId) -> bool {
        self.settled.contains(order_id)
    }

    /// Number of settled orders currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    /// Whether the guard is empty (no orders settled).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_settle_ok() {
        let mut guard = IdempotencyGuard::new(100);
        let order_id = OrderId::new();
        guard.begin(order_id).unwrap();
        guard.commit(order_id);
        assert!(guard.is_settled(&order_id));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn double_settle_blocked() {
        let mut guard = IdempotencyGuard::new(100);
        let order_id = OrderId::new();
        guard.begin(order_id).unwrap();
        guard.commit(order_id);

        let err = guard.begin(order_id).unwrap_err();
        assert!(
            matches!(err, OpenrampError::OrderAlreadySettled(id) if id == order_id),
            "Expected OrderAlreadySettled, got: {err:?}"
        );
    }

    #[test]
    fn in_flight_reservation_blocks_duplicate() {
        let mut guard = IdempotencyGuard::new(100);
        let order_id = OrderId::new();
        guard.begin(order_id).unwrap();

        // A second settlement of the same order arriving while the first
        // is still mutating balances must not pass the guard.
        let err = guard.begin(order_id).unwrap_err();
        assert!(matches!(err, OpenrampError::OrderAlreadySettled(_)));
        assert!(!guard.is_settled(&order_id));
    }

    #[test]
    fn abort_keeps_order_retryable() {
        let mut guard = IdempotencyGuard::new(100);
        let order_id = OrderId::new();
        guard.begin(order_id).unwrap();
        guard.abort(order_id);

        assert!(!guard.is_settled(&order_id));
        guard.begin(order_id).unwrap();
        guard.commit(order_id);
        assert!(guard.is_settled(&order_id));
    }

    #[test]
    fn evicts_oldest() {
        let mut guard = IdempotencyGuard::new(3);
        let ids: Vec<OrderId> = (0..4).map(|_| OrderId::new()).collect();

        for id in &ids[..3] {
            guard.begin(*id).unwrap();
            guard.commit(*id);
        }
        assert_eq!(guard.len(), 3);

        // Adding the fourth should evict the first (the oldest).
        guard.begin(ids[3]).unwrap();
        guard.commit(ids[3]);
        assert_eq!(guard.len(), 3);
        assert!(!guard.is_settled(&ids[0]), "oldest should have been evicted");
        assert!(guard.is_settled(&ids[1]));
        assert!(guard.is_settled(&ids[2]));
        assert!(guard.is_settled(&ids[3]));
    }

    #[test]
    fn empty_guard() {
        let guard = IdempotencyGuard::new(10);
        assert!(guard.is_empty());
        assert_eq!(guard.len(), 0);
        assert!(!guard.is_settled(&OrderId::new()));
    }

    #[test]
    #[should_panic(expected = "max_size must be > 0")]
    fn zero_max_size_panics() {
        let _ = IdempotencyGuard::new(0);
    }
}

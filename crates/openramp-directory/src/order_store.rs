//! Order store with compare-and-set status transitions.
//!
//! "Compare status, then update status" is a single atomic step here:
//! [`OrderStore::transition`] checks the current status and applies the
//! new one inside one critical section. Two concurrent confirmation
//! events for the same order can therefore never both pass the guard —
//! the loser surfaces `InvalidStateTransition` with no side effects.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use openramp_types::{OpenrampError, Order, OrderId, OrderStatus, Result};

/// Repository contract for orders.
pub trait OrderStore: Send + Sync {
    /// Persist a new order. Rejects duplicates.
    fn create(&self, order: Order) -> Result<()>;

    /// Fetch an order by id.
    fn get(&self, id: OrderId) -> Result<Order>;

    /// Atomic conditional transition: if the order's current status is in
    /// `expected`, set it to `next`, run `apply` on the order, stamp
    /// `updated_at`, and return the updated order. Otherwise fail with
    /// `InvalidStateTransition` and mutate nothing.
    fn transition(
        &self,
        id: OrderId,
        expected: &[OrderStatus],
        next: OrderStatus,
        apply: &mut dyn FnMut(&mut Order),
    ) -> Result<Order>;

    /// All orders whose status currently satisfies `pred`. Used by the
    /// expiry sweep.
    fn matching_status(&self, pred: &dyn Fn(OrderStatus) -> bool) -> Vec<Order>;
}

/// In-memory order store backed by a single mutex.
pub struct InMemoryOrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
        }
    }

    /// Number of orders stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.lock().expect("order store lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn create(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.lock().expect("order store lock poisoned");
        if orders.contains_key(&order.id) {
            return Err(OpenrampError::DuplicateOrder(order.id));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    fn get(&self, id: OrderId) -> Result<Order> {
        let orders = self.orders.lock().expect("order store lock poisoned");
        orders
            .get(&id)
            .cloned()
            .ok_or(OpenrampError::OrderNotFound(id))
    }

    fn transition(
        &self,
        id: OrderId,
        expected: &[OrderStatus],
        next: OrderStatus,
        apply: &mut dyn FnMut(&mut Order),
    ) -> Result<Order> {
        let mut orders = self.orders.lock().expect("order store lock poisoned");
        let order = orders.get_mut(&id).ok_or(OpenrampError::OrderNotFound(id))?;

        if !expected.contains(&order.status) {
            return Err(OpenrampError::InvalidStateTransition {
                order: id,
                from: order.status,
                to: next,
            });
        }

        let from = order.status;
        order.status = next;
        apply(order);
        order.touch(Utc::now());
        tracing::info!(order = %id, %from, to = %next, "Order transition");
        Ok(order.clone())
    }

    fn matching_status(&self, pred: &dyn Fn(OrderStatus) -> bool) -> Vec<Order> {
        let orders = self.orders.lock().expect("order store lock poisoned");
        orders
            .values()
            .filter(|o| pred(o.status))
            .cloned()
            .collect()
    }
}

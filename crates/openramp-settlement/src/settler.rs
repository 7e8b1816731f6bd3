//! Atomic settlement of a completed order.
//!
//! Settlement is the one place requiring true atomicity across two
//! stores: the counterparty capacity move and the user ledger move must
//! both apply or neither. Each side's fallible mutation runs first, so
//! the second mutation either cannot fail or fails only when the
//! counterparty record vanished mid-settlement — that residual case is
//! compensated before the error propagates.
//!
//! Capacity is re-checked here, not only at matching time: a concurrent
//! settlement may have consumed it since the snapshot was taken, and
//! that is an expected, retryable outcome.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use openramp_types::{
    constants, CounterpartyId, OpenrampError, Order, OrderSide, Result, SettlementId,
    SettlementReceipt, ShortfallPolicy,
};
use openramp_directory::{CounterpartyDirectory, LedgerStore};
use rust_decimal::Decimal;

use crate::conservation::ConservationAudit;
use crate::idempotency::IdempotencyGuard;

/// Applies the balance mutation pair for orders reaching a settling
/// transition. Invoked at most once per order by the lifecycle state
/// machine; internally guarded a second time by order id.
pub struct Settler {
    directory: Arc<dyn CounterpartyDirectory>,
    ledger: Arc<dyn LedgerStore>,
    policy: ShortfallPolicy,
    idempotency: Mutex<IdempotencyGuard>,
    audit: Mutex<ConservationAudit>,
}

impl Settler {
    #[must_use]
    pub fn new(
        directory: Arc<dyn CounterpartyDirectory>,
        ledger: Arc<dyn LedgerStore>,
        policy: ShortfallPolicy,
    ) -> Self {
        Self {
            directory,
            ledger,
            policy,
            idempotency: Mutex::new(IdempotencyGuard::new(
                constants::SETTLEMENT_IDEMPOTENCY_CACHE_SIZE,
            )),
            audit: Mutex::new(ConservationAudit::new()),
        }
    }

    /// Settle one order: move `base_amount` between the counterparty's
    /// capacity and the user's ledger, in the direction the order side
    /// dictates.
    ///
    /// # Errors
    /// - `SettlementFailed` if the order has no assigned counterparty
    /// - `OrderAlreadySettled` on a duplicate or concurrent invocation
    /// - `InsufficientCounterpartyCapacity` if capacity was consumed
    ///   since matching (retryable)
    /// - `InsufficientBalance` on a SELL debit under `HardFail`
    pub fn settle(&self, order: &Order) -> Result<SettlementReceipt> {
        let counterparty_id =
            order
                .counterparty_id
                .ok_or_else(|| OpenrampError::SettlementFailed {
                    reason: format!("order {} has no assigned counterparty", order.id),
                })?;

        // Reserve the order id before any mutation, so a concurrent
        // duplicate fails here instead of racing the balance moves.
        self.idempotency
            .lock()
            .expect("idempotency lock poisoned")
            .begin(order.id)?;

        let (capacity_after, balance_after, shortfall) =
            match self.apply(order, counterparty_id) {
                Ok(applied) => applied,
                Err(err) => {
                    self.idempotency
                        .lock()
                        .expect("idempotency lock poisoned")
                        .abort(order.id);
                    return Err(err);
                }
            };

        self.idempotency
            .lock()
            .expect("idempotency lock poisoned")
            .commit(order.id);

        let settlement_id = SettlementId::for_order(order.id);
        tracing::info!(
            order = %order.id,
            settlement = %settlement_id.fingerprint(),
            counterparty = %counterparty_id,
            side = %order.side,
            asset = order.pair.base.as_str(),
            amount = %order.base_amount,
            %capacity_after,
            %balance_after,
            "Order settled"
        );

        Ok(SettlementReceipt {
            id: settlement_id,
            order_id: order.id,
            user_id: order.user_id,
            counterparty_id,
            asset: order.pair.base.clone(),
            side: order.side,
            amount: order.base_amount,
            counterparty_capacity_after: capacity_after,
            user_balance_after: balance_after,
            clamped_shortfall: shortfall,
            settled_at: Utc::now(),
        })
    }

    /// Apply the balance mutation pair. Returns
    /// `(capacity_after, balance_after, shortfall)` on success; on
    /// failure every partial mutation has been compensated away.
    fn apply(
        &self,
        order: &Order,
        counterparty_id: CounterpartyId,
    ) -> Result<(Decimal, Decimal, Option<Decimal>)> {
        let asset = order.pair.base.as_str();
        let amount = order.base_amount;

        let (capacity_after, balance_after, ledger_delta, shortfall) = match order.side {
            // BUY: counterparty supplies crypto to the user. The capacity
            // debit is the fallible step; the ledger credit cannot fail.
            OrderSide::Buy => {
                let capacity_after =
                    self.directory
                        .adjust_capacity(counterparty_id, asset, -amount)?;
                let balance_after = self.ledger.credit(order.user_id, asset, amount);
                (capacity_after, balance_after, amount, None)
            }
            // SELL: counterparty receives crypto from the user. The
            // ledger debit is the fallible step, so it runs first; the
            // capacity credit after it can only fail if the counterparty
            // or its offering disappeared, in which case the debit is
            // compensated back.
            OrderSide::Sell => {
                let outcome = self
                    .ledger
                    .debit(order.user_id, asset, amount, self.policy)?;
                let capacity_after =
                    match self.directory.adjust_capacity(counterparty_id, asset, amount) {
                        Ok(capacity_after) => capacity_after,
                        Err(err) => {
                            self.ledger.credit(order.user_id, asset, outcome.applied);
                            return Err(err);
                        }
                    };
                (
                    capacity_after,
                    outcome.balance_after,
                    -outcome.applied,
                    outcome.shortfall,
                )
            }
        };

        self.directory.record_usage(counterparty_id, amount)?;

        let capacity_delta = match order.side {
            OrderSide::Buy => -amount,
            OrderSide::Sell => amount,
        };
        self.audit.lock().expect("audit lock poisoned").record(
            asset,
            capacity_delta,
            ledger_delta,
            shortfall.unwrap_or(Decimal::ZERO),
        );

        Ok((capacity_after, balance_after, shortfall))
    }

    /// Whether an order has been settled by this settler.
    #[must_use]
    pub fn is_settled(&self, order: &Order) -> bool {
        self.idempotency
            .lock()
            .expect("idempotency lock poisoned")
            .is_settled(&order.id)
    }

    /// Verify the conservation identity for an asset.
    pub fn verify_conservation(&self, asset: &str) -> Result<()> {
        self.audit.lock().expect("audit lock poisoned").verify(asset)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use openramp_types::{Counterparty, UserId};
    use openramp_directory::{InMemoryDirectory, InMemoryLedger};

    fn setup(
        capacity: Decimal,
        policy: ShortfallPolicy,
    ) -> (Settler, Arc<InMemoryDirectory>, Arc<InMemoryLedger>, Counterparty) {
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let cp = Counterparty::dummy("USDC", capacity, Decimal::new(45, 1));
        directory.upsert(cp.clone());
        let settler = Settler::new(
            Arc::clone(&directory) as Arc<dyn CounterpartyDirectory>,
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            policy,
        );
        (settler, directory, ledger, cp)
    }

    fn assigned_order(side: OrderSide, amount: Decimal, cp: &Counterparty) -> Order {
        let mut order = Order::dummy(side, amount, Decimal::new(160, 0));
        order.counterparty_id = Some(cp.id);
        order
    }

    /// Directory wrapper that counts capacity adjustments, so tests can
    /// assert which settlement paths touch capacity at all.
    struct CountingDirectory {
        inner: Arc<InMemoryDirectory>,
        adjustments: AtomicU32,
    }

    impl CounterpartyDirectory for CountingDirectory {
        fn upsert(&self, counterparty: Counterparty) {
            self.inner.upsert(counterparty);
        }

        fn get(&self, id: CounterpartyId) -> Result<Counterparty> {
            self.inner.get(id)
        }

        fn snapshot(&self) -> Vec<Counterparty> {
            self.inner.snapshot()
        }

        fn adjust_capacity(
            &self,
            id: CounterpartyId,
            asset: &str,
            delta: Decimal,
        ) -> Result<Decimal> {
            self.adjustments.fetch_add(1, Ordering::SeqCst);
            self.inner.adjust_capacity(id, asset, delta)
        }

        fn record_usage(&self, id: CounterpartyId, amount: Decimal) -> Result<()> {
            self.inner.record_usage(id, amount)
        }
    }

    #[test]
    fn buy_moves_capacity_to_user() {
        let (settler, directory, ledger, cp) =
            setup(Decimal::new(200, 0), ShortfallPolicy::ClampToZero);
        let order = assigned_order(OrderSide::Buy, Decimal::new(100, 0), &cp);

        let receipt = settler.settle(&order).unwrap();
        assert_eq!(receipt.counterparty_capacity_after, Decimal::new(100, 0));
        assert_eq!(receipt.user_balance_after, Decimal::new(100, 0));
        assert!(receipt.fully_applied());

        assert_eq!(
            directory.get(cp.id).unwrap().offering("USDC").unwrap().max_amount,
            Decimal::new(100, 0)
        );
        assert_eq!(ledger.balance(order.user_id, "USDC"), Decimal::new(100, 0));
        settler.verify_conservation("USDC").unwrap();
    }

    #[test]
    fn sell_moves_user_balance_to_capacity() {
        let (settler, directory, ledger, cp) =
            setup(Decimal::new(200, 0), ShortfallPolicy::HardFail);
        let order = assigned_order(OrderSide::Sell, Decimal::new(50, 0), &cp);
        ledger.credit(order.user_id, "USDC", Decimal::new(80, 0));

        let receipt = settler.settle(&order).unwrap();
        assert_eq!(receipt.counterparty_capacity_after, Decimal::new(250, 0));
        assert_eq!(receipt.user_balance_after, Decimal::new(30, 0));

        assert_eq!(
            directory.get(cp.id).unwrap().offering("USDC").unwrap().max_amount,
            Decimal::new(250, 0)
        );
        settler.verify_conservation("USDC").unwrap();
    }

    #[test]
    fn duplicate_settlement_blocked() {
        let (settler, _, _, cp) = setup(Decimal::new(200, 0), ShortfallPolicy::ClampToZero);
        let order = assigned_order(OrderSide::Buy, Decimal::new(10, 0), &cp);

        settler.settle(&order).unwrap();
        let err = settler.settle(&order).unwrap_err();
        assert!(matches!(err, OpenrampError::OrderAlreadySettled(_)));
        assert!(settler.is_settled(&order));
    }

    #[test]
    fn concurrent_duplicates_settle_exactly_once() {
        let (settler, directory, ledger, cp) =
            setup(Decimal::new(200, 0), ShortfallPolicy::ClampToZero);
        let settler = Arc::new(settler);
        let order = assigned_order(OrderSide::Buy, Decimal::new(50, 0), &cp);

        // 8 threads racing to settle the same order: the guard's
        // reservation admits exactly one.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let settler = Arc::clone(&settler);
                let order = order.clone();
                std::thread::spawn(move || settler.settle(&order).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(
            directory.get(cp.id).unwrap().offering("USDC").unwrap().max_amount,
            Decimal::new(150, 0)
        );
        assert_eq!(ledger.balance(order.user_id, "USDC"), Decimal::new(50, 0));
        settler.verify_conservation("USDC").unwrap();
    }

    #[test]
    fn insufficient_capacity_fails_without_mutation() {
        let (settler, directory, ledger, cp) =
            setup(Decimal::new(50, 0), ShortfallPolicy::ClampToZero);
        let order = assigned_order(OrderSide::Buy, Decimal::new(100, 0), &cp);

        let err = settler.settle(&order).unwrap_err();
        assert!(matches!(
            err,
            OpenrampError::InsufficientCounterpartyCapacity { .. }
        ));
        // Nothing moved, order stays retryable.
        assert_eq!(
            directory.get(cp.id).unwrap().offering("USDC").unwrap().max_amount,
            Decimal::new(50, 0)
        );
        assert_eq!(ledger.balance(order.user_id, "USDC"), Decimal::ZERO);
        assert!(!settler.is_settled(&order));
    }

    #[test]
    fn sell_clamp_absorbs_shortfall() {
        let (settler, _, ledger, cp) = setup(Decimal::new(200, 0), ShortfallPolicy::ClampToZero);
        let order = assigned_order(OrderSide::Sell, Decimal::new(100, 0), &cp);
        ledger.credit(order.user_id, "USDC", Decimal::new(60, 0));

        let receipt = settler.settle(&order).unwrap();
        assert_eq!(receipt.clamped_shortfall, Some(Decimal::new(40, 0)));
        assert_eq!(receipt.user_balance_after, Decimal::ZERO);
        // Conservation holds with the shortfall accounted for.
        settler.verify_conservation("USDC").unwrap();
    }

    #[test]
    fn sell_hard_fail_leaves_capacity_untouched() {
        let inner = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let cp = Counterparty::dummy("USDC", Decimal::new(100, 0), Decimal::new(45, 1));
        inner.upsert(cp.clone());
        let directory = Arc::new(CountingDirectory {
            inner: Arc::clone(&inner),
            adjustments: AtomicU32::new(0),
        });
        let settler = Settler::new(
            Arc::clone(&directory) as Arc<dyn CounterpartyDirectory>,
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            ShortfallPolicy::HardFail,
        );

        let order = assigned_order(OrderSide::Sell, Decimal::new(50, 0), &cp);
        ledger.credit(order.user_id, "USDC", Decimal::new(30, 0));

        // Debit fails first; capacity is never touched, so a concurrent
        // settlement cannot observe phantom capacity mid-failure.
        let err = settler.settle(&order).unwrap_err();
        assert!(matches!(err, OpenrampError::InsufficientBalance { .. }));
        assert_eq!(directory.adjustments.load(Ordering::SeqCst), 0);
        assert_eq!(
            inner.get(cp.id).unwrap().offering("USDC").unwrap().max_amount,
            Decimal::new(100, 0)
        );
        assert_eq!(ledger.balance(order.user_id, "USDC"), Decimal::new(30, 0));
        assert!(!settler.is_settled(&order));
        settler.verify_conservation("USDC").unwrap();

        // A retry after top-up settles cleanly.
        ledger.credit(order.user_id, "USDC", Decimal::new(20, 0));
        let receipt = settler.settle(&order).unwrap();
        assert_eq!(receipt.counterparty_capacity_after, Decimal::new(150, 0));
        assert_eq!(ledger.balance(order.user_id, "USDC"), Decimal::ZERO);
        settler.verify_conservation("USDC").unwrap();
    }

    #[test]
    fn sell_missing_offering_restores_debit() {
        let (settler, _, ledger, cp) = setup(Decimal::new(200, 0), ShortfallPolicy::HardFail);
        let user_id = UserId::new();
        let mut order = assigned_order(OrderSide::Sell, Decimal::new(50, 0), &cp);
        order.user_id = user_id;
        order.pair.base = "CUSD".to_string();
        ledger.credit(user_id, "CUSD", Decimal::new(80, 0));

        // The counterparty has no CUSD offering, so the capacity credit
        // fails after the debit; the debit must be compensated back.
        let err = settler.settle(&order).unwrap_err();
        assert!(matches!(err, OpenrampError::OfferingNotFound { .. }));
        assert_eq!(ledger.balance(user_id, "CUSD"), Decimal::new(80, 0));
        assert!(!settler.is_settled(&order));
    }

    #[test]
    fn unassigned_order_cannot_settle() {
        let (settler, _, _, _) = setup(Decimal::new(200, 0), ShortfallPolicy::ClampToZero);
        let order = Order::dummy(OrderSide::Buy, Decimal::new(10, 0), Decimal::new(160, 0));
        let err = settler.settle(&order).unwrap_err();
        assert!(matches!(err, OpenrampError::SettlementFailed { .. }));
    }

    #[test]
    fn settlement_records_usage() {
        let (settler, directory, _, cp) = setup(Decimal::new(200, 0), ShortfallPolicy::ClampToZero);
        let order = assigned_order(OrderSide::Buy, Decimal::new(25, 0), &cp);
        settler.settle(&order).unwrap();

        let after = directory.get(cp.id).unwrap();
        assert_eq!(after.limits.daily_used, Decimal::new(25, 0));
        assert_eq!(after.limits.daily_tx_count, 1);
    }

    #[test]
    fn concurrent_settlements_never_overdraw_capacity() {
        let (settler, directory, ledger, cp) =
            setup(Decimal::new(100, 0), ShortfallPolicy::ClampToZero);
        let settler = Arc::new(settler);

        // 15 BUY orders of 10 against capacity 100: exactly 10 succeed.
        let orders: Vec<Order> = (0..15)
            .map(|_| assigned_order(OrderSide::Buy, Decimal::new(10, 0), &cp))
            .collect();

        let handles: Vec<_> = orders
            .into_iter()
            .map(|order| {
                let settler = Arc::clone(&settler);
                std::thread::spawn(move || settler.settle(&order).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 10);
        assert_eq!(
            directory.get(cp.id).unwrap().offering("USDC").unwrap().max_amount,
            Decimal::ZERO
        );
        assert_eq!(ledger.total_supply("USDC"), Decimal::new(100, 0));
        settler.verify_conservation("USDC").unwrap();
    }
}

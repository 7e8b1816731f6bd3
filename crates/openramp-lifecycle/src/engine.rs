//! The order lifecycle state machine.
//!
//! [`OrderLifecycle`] owns every status transition from creation to a
//! terminal state. All guards go through the order store's atomic
//! compare-and-set, so two concurrent confirmation events for the same
//! order can never both reach settlement: one wins the claim, the other
//! gets `InvalidStateTransition` with no side effects.
//!
//! The engine records confirmation events; it never verifies evidence
//! authenticity — webhook/signature validation is an upstream concern.

use std::sync::Arc;

use chrono::Utc;
use openramp_types::{
    CounterpartyId, EngineConfig, MatchCriteria, MatchOutcome, OpenrampError, Order, OrderId,
    OrderSide, OrderStatus, PaymentInstructions, Result, SettlementReceipt, TradePair, UserId,
};
use openramp_directory::{CounterpartyDirectory, OrderStore};
use openramp_matchcore::{select_one, MatchRequest, RankedCandidate, STRATEGY_WEIGHTED_SCORE};
use openramp_settlement::Settler;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::resolver::AssetResolver;
use crate::transitions;

/// An incoming buy/sell request, before validation and rate resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub side: OrderSide,
    /// Asset symbol or token contract address.
    pub asset: String,
    pub fiat: String,
    pub base_amount: Decimal,
    pub network: Option<String>,
    pub criteria: MatchCriteria,
}

/// External confirmation events driving the lifecycle forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Fiat payment observed by a payment gateway.
    FiatPaymentReceived,
    /// Payment proof checked out (on-chain reference or gateway receipt).
    PaymentVerified,
    /// Release confirmed — the settling event.
    ReleaseConfirmed,
    /// Either party raised a dispute.
    DisputeRaised,
    /// Explicit dispute resolution; `release` settles, otherwise cancels.
    DisputeResolved { release: bool },
}

/// A confirmation event delivered by an external source. Evidence is
/// opaque to the engine and merely recorded in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationEvent {
    pub order_id: OrderId,
    pub kind: EventKind,
    pub evidence: serde_json::Value,
}

/// What applying an event produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    pub order: Order,
    /// Present only when the event completed the order and settled it.
    pub receipt: Option<SettlementReceipt>,
}

/// Orchestrates order creation, merchant assignment, confirmation
/// events, and expiry over shared stores.
pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    directory: Arc<dyn CounterpartyDirectory>,
    settler: Arc<Settler>,
    resolver: AssetResolver,
    config: EngineConfig,
}

impl OrderLifecycle {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        directory: Arc<dyn CounterpartyDirectory>,
        settler: Arc<Settler>,
        resolver: AssetResolver,
        config: EngineConfig,
    ) -> Self {
        Self {
            orders,
            directory,
            settler,
            resolver,
            config,
        }
    }

    /// Validate a request, freeze its rate, persist the order, and run
    /// the first merchant-assignment pass.
    ///
    /// `NoLiquidity` on the first pass is not an error at this level:
    /// the order is returned in `PENDING_MERCHANTS` for a later retry.
    pub fn create_order(&self, request: OrderRequest) -> Result<Order> {
        if request.base_amount <= Decimal::ZERO {
            return Err(OpenrampError::InvalidOrder {
                reason: format!("base amount must be positive, got {}", request.base_amount),
            });
        }

        let fiat = request.fiat.trim().to_uppercase();
        let (asset, rate) = self.resolver.resolve(&request.asset, &fiat)?;

        let gross = request.base_amount * rate;
        let fees = self.config.fees.breakdown(gross);
        // The user pays fees on a BUY and absorbs them on a SELL; either
        // way the drift from `base * rate` stays inside `fees.total()`.
        let quote_amount = match request.side {
            OrderSide::Buy => gross + fees.total(),
            OrderSide::Sell => gross - fees.total(),
        };

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: request.user_id,
            counterparty_id: None,
            side: request.side,
            pair: TradePair::new(asset, fiat),
            network: request.network,
            rate,
            base_amount: request.base_amount,
            quote_amount,
            fees,
            status: OrderStatus::Created,
            criteria: request.criteria,
            match_outcome: MatchOutcome::default(),
            payment: None,
            assignment_attempts: 0,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(self.config.order_ttl_secs),
            updated_at: now,
        };

        debug_assert!(order.pricing_consistent());
        self.orders.create(order.clone())?;
        tracing::info!(
            order = %order.id,
            user = %order.user_id,
            side = %order.side,
            pair = %order.pair,
            amount = %order.base_amount,
            %rate,
            "Order created"
        );

        match self.assign(order.id) {
            Ok(assigned) => Ok(assigned),
            // No liquidity right now: hand back the pending order.
            Err(err) if err.is_retryable() => self.orders.get(order.id),
            Err(err) => Err(err),
        }
    }

    /// Run one merchant-assignment pass for a `CREATED` or
    /// `PENDING_MERCHANTS` order.
    ///
    /// On success the order lands in `AWAITING_PAYMENT` with payment
    /// instructions attached. With no liquidity the order stays
    /// `PENDING_MERCHANTS` until the bounded attempt budget runs out,
    /// at which point it is cancelled.
    pub fn assign(&self, order_id: OrderId) -> Result<Order> {
        let order = self.orders.get(order_id)?;
        self.expire_if_due(&order)?;

        let request = MatchRequest {
            side: order.side,
            asset: order.pair.base.clone(),
            network: order.network.clone(),
            base_amount: order.base_amount,
            criteria: order.criteria.clone(),
        };
        let snapshot = self.directory.snapshot();

        match select_one(
            &request,
            &snapshot,
            &self.config.weights,
            self.config.match_top_n,
        ) {
            Ok((best, considered)) => self.apply_assignment(order_id, &best, considered),
            Err(err @ OpenrampError::NoLiquidity { .. }) => {
                let pending = self.transition_checked(
                    order_id,
                    transitions::ASSIGNABLE,
                    OrderStatus::PendingMerchants,
                    &mut |o| o.assignment_attempts += 1,
                )?;
                if pending.assignment_attempts >= self.config.max_assignment_attempts {
                    self.transition_checked(
                        order_id,
                        &[OrderStatus::PendingMerchants],
                        OrderStatus::Cancelled,
                        &mut |_| {},
                    )?;
                    tracing::warn!(
                        order = %order_id,
                        attempts = pending.assignment_attempts,
                        "Assignment budget exhausted, order cancelled"
                    );
                    return Err(OpenrampError::AssignmentExhausted {
                        order: order_id,
                        attempts: pending.assignment_attempts,
                    });
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn apply_assignment(
        &self,
        order_id: OrderId,
        best: &RankedCandidate,
        considered: Vec<CounterpartyId>,
    ) -> Result<Order> {
        let preferred = {
            let order = self.orders.get(order_id)?;
            order
                .criteria
                .payment_methods
                .iter()
                .copied()
                .find(|kind| best.counterparty.payment_template(Some(*kind)).is_some())
        };
        let payment = best
            .counterparty
            .payment_template(preferred)
            .map(|template| PaymentInstructions {
                method: template.kind,
                details: template.instructions.clone(),
            });

        let counterparty_id = best.id();
        let score = best.score;
        let assigned = self.transition_checked(
            order_id,
            transitions::ASSIGNABLE,
            OrderStatus::MerchantAssigned,
            &mut |o| {
                o.counterparty_id = Some(counterparty_id);
                o.match_outcome = MatchOutcome {
                    considered: considered.clone(),
                    selected: Some(counterparty_id),
                    strategy: STRATEGY_WEIGHTED_SCORE.to_string(),
                };
                o.payment = payment.clone();
                o.assignment_attempts += 1;
            },
        )?;
        tracing::info!(
            order = %order_id,
            counterparty = %counterparty_id,
            %score,
            "Merchant assigned"
        );

        // Automatic once payment instructions are attached.
        if assigned.payment.is_some() {
            return self.transition_checked(
                order_id,
                &[OrderStatus::MerchantAssigned],
                OrderStatus::AwaitingPayment,
                &mut |_| {},
            );
        }
        Ok(assigned)
    }

    /// Apply one external confirmation event.
    ///
    /// # Errors
    /// - `OrderNotFound` for unknown ids
    /// - `OrderExpired` when the order's TTL lapsed first
    /// - `InvalidStateTransition` for duplicate/late/out-of-order events
    ///   — rejected without side effects
    pub fn apply_event(&self, event: &ConfirmationEvent) -> Result<EventOutcome> {
        let order = self.orders.get(event.order_id)?;
        self.expire_if_due(&order)?;

        tracing::debug!(
            order = %event.order_id,
            kind = ?event.kind,
            evidence = %event.evidence,
            "Confirmation event received"
        );

        match event.kind {
            EventKind::FiatPaymentReceived => {
                let order = self.transition_checked(
                    event.order_id,
                    &[OrderStatus::AwaitingPayment],
                    OrderStatus::PaymentReceived,
                    &mut |_| {},
                )?;
                Ok(EventOutcome { order, receipt: None })
            }
            EventKind::PaymentVerified => {
                let order = self.transition_checked(
                    event.order_id,
                    &[OrderStatus::PaymentReceived],
                    OrderStatus::PaymentVerified,
                    &mut |_| {},
                )?;
                Ok(EventOutcome { order, receipt: None })
            }
            EventKind::ReleaseConfirmed => {
                self.complete_and_settle(event.order_id, OrderStatus::PaymentVerified)
            }
            EventKind::DisputeRaised => {
                let order = self.transition_checked(
                    event.order_id,
                    transitions::DISPUTABLE,
                    OrderStatus::Disputed,
                    &mut |_| {},
                )?;
                tracing::warn!(order = %event.order_id, "Dispute raised");
                Ok(EventOutcome { order, receipt: None })
            }
            EventKind::DisputeResolved { release } => {
                if release {
                    self.complete_and_settle(event.order_id, OrderStatus::Disputed)
                } else {
                    let order = self.transition_checked(
                        event.order_id,
                        &[OrderStatus::Disputed],
                        OrderStatus::Cancelled,
                        &mut |_| {},
                    )?;
                    Ok(EventOutcome { order, receipt: None })
                }
            }
        }
    }

    /// Claim the order (`claim_from -> COMPLETED`) and settle it.
    ///
    /// The claim is the exactly-once gate: of two concurrent settling
    /// events, one wins the CAS and the other fails it. If settlement
    /// then fails, the claim is reverted by a compensating CAS so a
    /// later event can retry.
    fn complete_and_settle(
        &self,
        order_id: OrderId,
        claim_from: OrderStatus,
    ) -> Result<EventOutcome> {
        let claimed = self.transition_checked(
            order_id,
            &[claim_from],
            OrderStatus::Completed,
            &mut |_| {},
        )?;

        match self.settler.settle(&claimed) {
            Ok(receipt) => Ok(EventOutcome {
                order: claimed,
                receipt: Some(receipt),
            }),
            // Balances already moved for this order; the claim stands.
            Err(err @ OpenrampError::OrderAlreadySettled(_)) => {
                tracing::error!(order = %order_id, %err, "Settled order re-claimed");
                Err(err)
            }
            Err(err) => {
                // Compensating revert of the claim, not a forward
                // transition; it bypasses the legality table on purpose.
                self.orders.transition(
                    order_id,
                    &[OrderStatus::Completed],
                    claim_from,
                    &mut |_| {},
                )?;
                tracing::warn!(order = %order_id, %err, "Settlement failed, claim reverted");
                Err(err)
            }
        }
    }

    /// Cancel an order from any pre-completion state.
    pub fn cancel(&self, order_id: OrderId) -> Result<Order> {
        self.transition_checked(
            order_id,
            transitions::CANCELLABLE,
            OrderStatus::Cancelled,
            &mut |_| {},
        )
    }

    /// Sweep every expirable order whose TTL has lapsed. Returns how
    /// many orders were expired. Lost races (an order completing while
    /// the sweep runs) are skipped, not errors.
    pub fn expire_due(&self) -> usize {
        let now = Utc::now();
        let due: Vec<Order> = self
            .orders
            .matching_status(&OrderStatus::is_expirable)
            .into_iter()
            .filter(|o| o.is_expired_at(now))
            .collect();

        let mut expired = 0;
        for order in due {
            if self
                .transition_checked(
                    order.id,
                    transitions::EXPIRABLE,
                    OrderStatus::Expired,
                    &mut |_| {},
                )
                .is_ok()
            {
                tracing::info!(order = %order.id, "Order expired");
                expired += 1;
            }
        }
        expired
    }

    /// Fetch an order by id.
    pub fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders.get(order_id)
    }

    /// Lazy expiry: terminate a due order before touching it further.
    fn expire_if_due(&self, order: &Order) -> Result<()> {
        if !(order.status.is_expirable() && order.is_expired_at(Utc::now())) {
            return Ok(());
        }
        match self.transition_checked(
            order.id,
            transitions::EXPIRABLE,
            OrderStatus::Expired,
            &mut |_| {},
        ) {
            Ok(_) => {
                tracing::info!(order = %order.id, "Order expired on touch");
                Err(OpenrampError::OrderExpired(order.id))
            }
            // Lost the race against a sweep or a concurrent event. The
            // snapshot is stale; defer to whatever status actually won.
            Err(_) => {
                let current = self.orders.get(order.id)?;
                if current.status == OrderStatus::Expired {
                    Err(OpenrampError::OrderExpired(order.id))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Every forward transition goes through here, so the legality table
    /// in [`transitions`] cannot drift from the expected-status guards.
    fn transition_checked(
        &self,
        order_id: OrderId,
        expected: &[OrderStatus],
        next: OrderStatus,
        apply: &mut dyn FnMut(&mut Order),
    ) -> Result<Order> {
        debug_assert!(
            expected.iter().all(|&from| transitions::is_legal(from, next)),
            "illegal transition guard: {expected:?} -> {next}"
        );
        self.orders.transition(order_id, expected, next, apply)
    }
}

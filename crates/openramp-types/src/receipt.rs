//! Settlement receipts — the audit record of the one balance mutation
//! pair each completed order performs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CounterpartyId, OrderId, OrderSide, SettlementId, UserId};

/// Result of settling one order: the amounts moved and the balances that
/// resulted, returned to the caller for confirmation and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Deterministic per-order receipt id.
    pub id: SettlementId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub counterparty_id: CounterpartyId,
    pub asset: String,
    pub side: OrderSide,
    /// Base-asset amount moved in each direction.
    pub amount: Decimal,
    /// Counterparty capacity for the asset after settlement.
    pub counterparty_capacity_after: Decimal,
    /// User ledger balance for the asset after settlement.
    pub user_balance_after: Decimal,
    /// SELL-side shortfall absorbed by the clamp policy, if any.
    pub clamped_shortfall: Option<Decimal>,
    pub settled_at: DateTime<Utc>,
}

impl SettlementReceipt {
    /// Whether the full requested amount moved on the ledger side.
    #[must_use]
    pub fn fully_applied(&self) -> bool {
        self.clamped_shortfall.is_none()
    }
}

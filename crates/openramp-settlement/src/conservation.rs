//! Conservation invariant checker.
//!
//! Every settlement moves the same base amount on both sides:
//! counterparty capacity and the user ledger change by mirrored deltas.
//! Per asset, across all settlements:
//!
//! ```text
//! Σ(capacity delta) + Σ(ledger delta) == Σ(clamped shortfall)
//! ```
//!
//! A BUY contributes `-A` capacity and `+A` ledger (sum 0). A SELL
//! contributes `+A` capacity and `-(A - s)` ledger where `s` is the
//! shortfall the clamp policy absorbed (sum `s`). If the identity ever
//! breaks, a mutation was applied without its counterpart — the one
//! failure mode settlement must never persist.

use std::collections::HashMap;

use openramp_types::{Asset, OpenrampError, Result};
use rust_decimal::Decimal;

/// Tracks per-asset settlement deltas and validates the conservation
/// identity after every settlement cycle.
pub struct ConservationAudit {
    /// Cumulative counterparty capacity delta per asset.
    capacity_deltas: HashMap<Asset, Decimal>,
    /// Cumulative user ledger delta per asset.
    ledger_deltas: HashMap<Asset, Decimal>,
    /// Cumulative clamped shortfall per asset.
    shortfalls: HashMap<Asset, Decimal>,
}

impl ConservationAudit {
    #[must_use]
    pub fn new() -> Self {
        Self {
            capacity_deltas: HashMap::new(),
            ledger_deltas: HashMap::new(),
            shortfalls: HashMap::new(),
        }
    }

    /// Record one settlement's mutation pair.
    pub fn record(
        &mut self,
        asset: &str,
        capacity_delta: Decimal,
        ledger_delta: Decimal,
        shortfall: Decimal,
    ) {
        *self
            .capacity_deltas
            .entry(asset.to_string())
            .or_insert(Decimal::ZERO) += capacity_delta;
        *self
            .ledger_deltas
            .entry(asset.to_string())
            .or_insert(Decimal::ZERO) += ledger_delta;
        *self
            .shortfalls
            .entry(asset.to_string())
            .or_insert(Decimal::ZERO) += shortfall;
    }

    /// Verify the conservation identity for an asset.
    ///
    /// # Errors
    /// Returns [`OpenrampError::ConservationViolation`] if the deltas do
    /// not cancel out.
    pub fn verify(&self, asset: &str) -> Result<()> {
        let capacity = self.delta(&self.capacity_deltas, asset);
        let ledger = self.delta(&self.ledger_deltas, asset);
        let shortfall = self.delta(&self.shortfalls, asset);

        if capacity + ledger != shortfall {
            return Err(OpenrampError::ConservationViolation {
                reason: format!(
                    "Asset {asset}: capacity delta {capacity} + ledger delta {ledger} \
                     != shortfall {shortfall}"
                ),
            });
        }
        Ok(())
    }

    /// All assets that have seen at least one settlement.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<String> {
        self.capacity_deltas.keys().cloned().collect()
    }

    fn delta(&self, map: &HashMap<Asset, Decimal>, asset: &str) -> Decimal {
        map.get(asset).copied().unwrap_or(Decimal::ZERO)
    }
}

impl Default for ConservationAudit {
    fn default() -> Self {
        Self::new()
    }
}

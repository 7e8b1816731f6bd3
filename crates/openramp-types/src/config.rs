//! Configuration for the OpenRamp engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// What a SELL-side settlement does when the user's ledger balance cannot
/// cover the full debit. The policy is explicit configuration: the clamp
/// silently absorbs the shortfall (logged and recorded on the receipt),
/// the hard fail rejects the settlement and rolls back the capacity move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortfallPolicy {
    /// Debit what is there, clamp the balance at zero, log the shortfall.
    ClampToZero,
    /// Fail the settlement with `InsufficientBalance`.
    HardFail,
}

/// Weights of the counterparty match score. The three component weights
/// sum to one: performance is capped at 0.60, capacity contributes 0.30,
/// fees 0.10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWeights {
    /// Ceiling on the combined performance component.
    pub performance_cap: Decimal,
    /// Multiplier on the rating fraction (rating / 5).
    pub rating_weight: Decimal,
    /// Bonus for fast average response (< 60s).
    pub fast_response_bonus: Decimal,
    /// Bonus for moderate average response (< 300s).
    pub moderate_response_bonus: Decimal,
    /// Multiplier on the dispute rate, subtracted from performance.
    pub dispute_penalty: Decimal,
    /// Multiplier on the remaining daily capacity fraction.
    pub capacity_weight: Decimal,
    /// Multiplier on (1 - spread).
    pub fee_weight: Decimal,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            performance_cap: Decimal::new(60, 2),        // 0.60
            rating_weight: Decimal::new(50, 2),          // 0.50
            fast_response_bonus: Decimal::new(10, 2),    // 0.10
            moderate_response_bonus: Decimal::new(5, 2), // 0.05
            dispute_penalty: Decimal::new(60, 2),        // 0.60
            capacity_weight: Decimal::new(30, 2),        // 0.30
            fee_weight: Decimal::new(10, 2),             // 0.10
        }
    }
}

/// Fee schedule applied at order creation. All fees may be zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Platform fee in basis points of the gross quote amount.
    pub platform_bps: u32,
    /// Flat network fee in quote currency.
    pub network_flat: Decimal,
    /// Counterparty fee in basis points of the gross quote amount.
    pub counterparty_bps: u32,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_bps: constants::DEFAULT_PLATFORM_FEE_BPS,
            network_flat: Decimal::ZERO,
            counterparty_bps: 0,
        }
    }
}

impl FeeSchedule {
    /// Compute the fee breakdown for a gross quote amount.
    #[must_use]
    pub fn breakdown(&self, gross_quote: Decimal) -> crate::FeeBreakdown {
        let bps = Decimal::new(10_000, 0);
        crate::FeeBreakdown {
            platform: gross_quote * Decimal::from(self.platform_bps) / bps,
            network: self.network_flat,
            counterparty: gross_quote * Decimal::from(self.counterparty_bps) / bps,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed order TTL in seconds.
    pub order_ttl_secs: i64,
    /// Bounded assignment retry budget before cancellation.
    pub max_assignment_attempts: u32,
    /// Ranked candidate list truncation.
    pub match_top_n: usize,
    pub shortfall_policy: ShortfallPolicy,
    pub weights: MatchWeights,
    pub fees: FeeSchedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order_ttl_secs: constants::DEFAULT_ORDER_TTL_SECS,
            max_assignment_attempts: constants::DEFAULT_MAX_ASSIGNMENT_ATTEMPTS,
            match_top_n: constants::MATCH_TOP_N,
            shortfall_policy: ShortfallPolicy::ClampToZero,
            weights: MatchWeights::default(),
            fees: FeeSchedule::default(),
        }
    }
}

//! Counterparty match scoring.
//!
//! Score = performance + capacity + fee, where:
//!
//! - performance = rating fraction x rating weight, plus a response-time
//!   bonus, minus a dispute-rate penalty; clamped to [0, performance_cap]
//!   (0.60 by default)
//! - capacity = remaining daily capacity fraction x 0.30
//! - fee = (1 - spread) x 0.10
//!
//! All arithmetic is `Decimal`, so the score is exact and identical for
//! an identical counterparty snapshot on every invocation.

use openramp_types::{constants, Counterparty, MatchWeights};
use rust_decimal::Decimal;

/// Score one counterparty against the weights. The result lies in [0, 1].
#[must_use]
pub fn score(counterparty: &Counterparty, spread: Decimal, weights: &MatchWeights) -> Decimal {
    let perf = performance_component(counterparty, weights);
    let capacity = counterparty.limits.daily_remaining_fraction() * weights.capacity_weight;
    let fee = fee_component(spread, weights);
    perf + capacity + fee
}

/// The performance slice of the score, clamped to `performance_cap` so
/// reputation alone can never dominate capacity and fees entirely.
#[must_use]
pub fn performance_component(counterparty: &Counterparty, weights: &MatchWeights) -> Decimal {
    let rating_fraction =
        counterparty.performance.rating / Decimal::from(constants::RATING_SCALE_MAX);
    let mut perf = rating_fraction * weights.rating_weight;

    perf += response_bonus(counterparty.performance.avg_response_secs, weights);
    perf -= counterparty.performance.dispute_rate * weights.dispute_penalty;

    perf.clamp(Decimal::ZERO, weights.performance_cap)
}

fn response_bonus(avg_response_secs: u64, weights: &MatchWeights) -> Decimal {
    if avg_response_secs <= constants::FAST_RESPONSE_SECS {
        weights.fast_response_bonus
    } else if avg_response_secs <= constants::MODERATE_RESPONSE_SECS {
        weights.moderate_response_bonus
    } else {
        Decimal::ZERO
    }
}

fn fee_component(spread: Decimal, weights: &MatchWeights) -> Decimal {
    (Decimal::ONE - spread).clamp(Decimal::ZERO, Decimal::ONE) * weights.fee_weight
}

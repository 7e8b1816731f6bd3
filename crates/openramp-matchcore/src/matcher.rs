//! Candidate filtering, ranking, and selection.
//!
//! Matching is side-effect-free: it consumes a point-in-time snapshot of
//! the counterparty directory and never mutates counterparty or order
//! state. Capacity seen here may be slightly stale — settlement re-checks
//! it atomically before moving anything.

use openramp_types::{
    Counterparty, CounterpartyId, MatchCriteria, MatchWeights, OpenrampError, OrderSide, Result,
};
use rust_decimal::Decimal;

use crate::score::score;

/// Name of the assignment strategy recorded on matched orders.
pub const STRATEGY_WEIGHTED_SCORE: &str = "weighted_score_v1";

/// What an order requires of a counterparty, extracted from the order so
/// matching stays decoupled from the order store.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub side: OrderSide,
    /// Canonical base asset symbol.
    pub asset: String,
    /// Required network, if the order pins one.
    pub network: Option<String>,
    pub base_amount: Decimal,
    pub criteria: MatchCriteria,
}

/// One eligible counterparty with its computed score.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub counterparty: Counterparty,
    pub score: Decimal,
}

impl RankedCandidate {
    #[must_use]
    pub fn id(&self) -> CounterpartyId {
        self.counterparty.id
    }
}

/// Filter and rank the snapshot against the request.
///
/// Returns candidates in descending score order, ties broken by snapshot
/// order (stable sort), truncated to `top_n`. Deterministic for a given
/// snapshot.
#[must_use]
pub fn find_candidates(
    request: &MatchRequest,
    snapshot: &[Counterparty],
    weights: &MatchWeights,
    top_n: usize,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = snapshot
        .iter()
        .filter(|cp| is_eligible(request, cp))
        .map(|cp| {
            let spread = cp
                .offering(&request.asset)
                .map_or(Decimal::ZERO, |o| o.spread);
            RankedCandidate {
                counterparty: cp.clone(),
                score: score(cp, spread, weights),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(top_n);

    tracing::debug!(
        asset = %request.asset,
        amount = %request.base_amount,
        eligible = ranked.len(),
        "Candidates ranked"
    );
    ranked
}

/// Pick the top-ranked candidate, or signal `NoLiquidity` when nobody is
/// eligible. No liquidity is a normal, expected outcome — callers surface
/// it as "try again later".
pub fn select_one(
    request: &MatchRequest,
    snapshot: &[Counterparty],
    weights: &MatchWeights,
    top_n: usize,
) -> Result<(RankedCandidate, Vec<CounterpartyId>)> {
    let ranked = find_candidates(request, snapshot, weights, top_n);
    let considered: Vec<CounterpartyId> = ranked.iter().map(RankedCandidate::id).collect();
    let best = ranked
        .into_iter()
        .next()
        .ok_or_else(|| OpenrampError::NoLiquidity {
            asset: request.asset.clone(),
            amount: request.base_amount,
        })?;
    Ok((best, considered))
}

/// Eligibility filter, applied before scoring.
fn is_eligible(request: &MatchRequest, cp: &Counterparty) -> bool {
    if !cp.is_matchable() || !cp.services.contains(&request.side) {
        return false;
    }

    let Some(offering) = cp.offering(&request.asset) else {
        return false;
    };
    if request.base_amount < offering.min_amount || request.base_amount > offering.max_amount {
        return false;
    }
    if let Some(network) = &request.network {
        if !offering.networks.iter().any(|n| n == network) {
            return false;
        }
    }

    if !cp.limits.admits(request.base_amount) {
        return false;
    }

    if cp.performance.rating < request.criteria.min_rating {
        return false;
    }
    if cp.performance.avg_response_secs > request.criteria.max_response_secs {
        return false;
    }
    if !request.criteria.payment_methods.is_empty()
        && !cp
            .payment_methods
            .iter()
            .any(|m| request.criteria.payment_methods.contains(&m.kind))
    {
        return false;
    }

    true
}

//! # openramp-matchcore
//!
//! **Pure counterparty matching engine for OpenRamp.**
//!
//! MatchCore takes a snapshot of the counterparty directory and an
//! order's requirements and produces a ranked candidate list. It has:
//!
//! - **Zero side effects**: no store writes, no capacity mutation
//! - **Deterministic output**: same snapshot -> same ranking, ties broken
//!   by snapshot order
//! - **Bounded output**: ranked lists are truncated to a top-N to cap
//!   matching latency

pub mod matcher;
pub mod score;

pub use matcher::{
    find_candidates, select_one, MatchRequest, RankedCandidate, STRATEGY_WEIGHTED_SCORE,
};
pub use score::{performance_component, score};

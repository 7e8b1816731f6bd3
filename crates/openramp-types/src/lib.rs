//! # openramp-types
//!
//! Shared types, errors, and configuration for the **OpenRamp**
//! peer-to-peer ramp engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`UserId`], [`CounterpartyId`], [`SettlementId`], [`TradePair`]
//! - **Order model**: [`Order`], [`OrderSide`], [`OrderStatus`], [`FeeBreakdown`], [`MatchCriteria`], [`PaymentInstructions`]
//! - **Counterparty model**: [`Counterparty`], [`AssetOffering`], [`UsageLimits`], [`Performance`]
//! - **Receipt model**: [`SettlementReceipt`]
//! - **Configuration**: [`EngineConfig`], [`MatchWeights`], [`FeeSchedule`], [`ShortfallPolicy`]
//! - **Errors**: [`OpenrampError`] with `RAMP_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod counterparty;
pub mod error;
pub mod ids;
pub mod order;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use openramp_types::{Order, OrderSide, Counterparty, ...};

pub use config::*;
pub use counterparty::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use receipt::*;

// Constants are accessed via `openramp_types::constants::FOO`
// (not re-exported to avoid name collisions).

/// Type alias for asset identifiers (e.g., "USDC", "CUSD").
pub type Asset = String;

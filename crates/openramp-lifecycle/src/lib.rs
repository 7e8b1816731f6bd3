//! # openramp-lifecycle
//!
//! **Order Plane**: asset/rate resolution, order creation, the
//! lifecycle state machine, and expiry.
//!
//! ## Architecture
//!
//! The order plane sits between the API layer and settlement:
//! 1. **AssetResolver**: normalizes asset symbols/addresses and freezes a rate
//! 2. **OrderLifecycle**: creates orders and drives every status transition
//! 3. **transitions**: the legal-transition table backing every guard
//!
//! ## Order Flow
//!
//! ```text
//! API → AssetResolver.resolve() → OrderLifecycle.create_order()
//!     → assign() → confirmation events → Settler.settle() → COMPLETED
//! ```
//!
//! Every transition goes through the order store's compare-and-set, so
//! racing confirmation events never double-settle an order.

pub mod engine;
pub mod oracle;
pub mod resolver;
pub mod transitions;

pub use engine::{ConfirmationEvent, EventKind, EventOutcome, OrderLifecycle, OrderRequest};
pub use oracle::{RateOracle, StaticRateOracle};
pub use resolver::AssetResolver;

//! System-wide constants for the OpenRamp engine.

/// Fixed order TTL in seconds (creation + TTL = expiry).
pub const DEFAULT_ORDER_TTL_SECS: i64 = 1800;

/// Bounded merchant-assignment retry budget before an order is cancelled.
pub const DEFAULT_MAX_ASSIGNMENT_ATTEMPTS: u32 = 3;

/// Ranked candidate lists are truncated to this many entries to cap
/// matching latency.
pub const MATCH_TOP_N: usize = 10;

/// Counterparty rating scale maximum.
pub const RATING_SCALE_MAX: u32 = 5;

/// Default maximum acceptable counterparty response time in seconds.
pub const DEFAULT_MAX_RESPONSE_SECS: u64 = 900;

/// Response-time bonus thresholds (seconds) used by the match score.
pub const FAST_RESPONSE_SECS: u64 = 60;
pub const MODERATE_RESPONSE_SECS: u64 = 300;

/// Settlement idempotency cache size (number of order IDs to remember).
pub const SETTLEMENT_IDEMPOTENCY_CACHE_SIZE: usize = 500_000;

/// Default platform fee in basis points of the quote amount.
pub const DEFAULT_PLATFORM_FEE_BPS: u32 = 50;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenRamp";

//! Price oracle contract.
//!
//! The oracle is an external collaborator with a narrow synchronous
//! contract: one rate for one pair, or nothing. Retrieval, caching, and
//! staleness are the oracle implementation's business — the engine
//! freezes whatever rate it gets into the order being created.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// External price oracle: fiat-per-unit-asset conversion rates.
pub trait RateOracle: Send + Sync {
    /// The current rate for `base`/`fiat`, or `None` when the oracle has
    /// no quote for the pair.
    fn rate(&self, base: &str, fiat: &str) -> Option<Decimal>;
}

/// Fixed in-memory rate table. Used in tests and demos; production wires
/// a real oracle behind the same trait.
pub struct StaticRateOracle {
    rates: HashMap<(String, String), Decimal>,
}

impl StaticRateOracle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Set the rate for a pair, replacing any existing quote.
    pub fn set_rate(&mut self, base: &str, fiat: &str, rate: Decimal) {
        self.rates
            .insert((base.to_string(), fiat.to_string()), rate);
    }

    /// Builder-style convenience for test setup.
    #[must_use]
    pub fn with_rate(mut self, base: &str, fiat: &str, rate: Decimal) -> Self {
        self.set_rate(base, fiat, rate);
        self
    }
}

impl Default for StaticRateOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RateOracle for StaticRateOracle {
    fn rate(&self, base: &str, fiat: &str) -> Option<Decimal> {
        self.rates
            .get(&(base.to_string(), fiat.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pair_returns_rate() {
        let oracle = StaticRateOracle::new().with_rate("USDC", "KES", Decimal::new(160, 0));
        assert_eq!(oracle.rate("USDC", "KES"), Some(Decimal::new(160, 0)));
    }

    #[test]
    fn unknown_pair_returns_none() {
        let oracle = StaticRateOracle::new();
        assert_eq!(oracle.rate("USDC", "KES"), None);
    }

    #[test]
    fn set_rate_replaces() {
        let mut oracle = StaticRateOracle::new();
        oracle.set_rate("USDC", "KES", Decimal::new(160, 0));
        oracle.set_rate("USDC", "KES", Decimal::new(161, 0));
        assert_eq!(oracle.rate("USDC", "KES"), Some(Decimal::new(161, 0)));
    }
}

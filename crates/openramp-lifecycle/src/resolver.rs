//! Asset and rate resolution.
//!
//! Requests may name an asset by symbol (any casing) or by token
//! contract address. The resolver normalizes either form to a canonical
//! symbol before consulting the price oracle; the resulting rate is a
//! point-in-time read, immediately frozen into the order being created.

use std::sync::Arc;

use openramp_types::{Asset, OpenrampError, Result};
use rust_decimal::Decimal;

use crate::oracle::RateOracle;

/// Stablecoins the engine recognizes.
const SUPPORTED_ASSETS: &[&str] = &["USDC", "USDT", "CUSD"];

/// Known token contract addresses mapped to canonical symbols.
const ADDRESS_ALIASES: &[(&str, &str)] = &[
    // cUSD on Celo
    ("0x765de816845861e75a25fca122bb6898b8b1282a", "CUSD"),
    // USDC on Celo
    ("0xceba9300f2b948710d2653dd7b07f33a8b32118c", "USDC"),
    // USDT on Celo
    ("0x48065fbbe25f71c9282ddf5e1cd6d6a887483d5e", "USDT"),
];

/// Resolves a requested asset to a canonical symbol plus a frozen
/// conversion rate.
pub struct AssetResolver {
    oracle: Arc<dyn RateOracle>,
}

impl AssetResolver {
    #[must_use]
    pub fn new(oracle: Arc<dyn RateOracle>) -> Self {
        Self { oracle }
    }

    /// Resolve `symbol_or_address` against `fiat`.
    ///
    /// # Errors
    /// - `UnsupportedAsset` when the symbol/address is unknown
    /// - `InvalidOrder` when the fiat code is empty
    /// - `RateUnavailable` when the oracle has no quote; the caller must
    ///   not create an order in this case
    pub fn resolve(&self, symbol_or_address: &str, fiat: &str) -> Result<(Asset, Decimal)> {
        let fiat = fiat.trim().to_uppercase();
        if fiat.is_empty() {
            return Err(OpenrampError::InvalidOrder {
                reason: "fiat currency must not be empty".to_string(),
            });
        }

        let canonical = canonical_symbol(symbol_or_address)?;
        let rate = self
            .oracle
            .rate(&canonical, &fiat)
            .ok_or_else(|| OpenrampError::RateUnavailable {
                base: canonical.clone(),
                fiat: fiat.clone(),
            })?;

        tracing::debug!(asset = %canonical, %fiat, %rate, "Rate resolved");
        Ok((canonical, rate))
    }
}

/// Normalize a symbol or token address to a canonical asset symbol.
fn canonical_symbol(symbol_or_address: &str) -> Result<Asset> {
    let trimmed = symbol_or_address.trim();

    if trimmed.starts_with("0x") {
        let lowered = trimmed.to_lowercase();
        return ADDRESS_ALIASES
            .iter()
            .find(|(address, _)| *address == lowered)
            .map(|(_, symbol)| (*symbol).to_string())
            .ok_or_else(|| OpenrampError::UnsupportedAsset(trimmed.to_string()));
    }

    let upper = trimmed.to_uppercase();
    if SUPPORTED_ASSETS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(OpenrampError::UnsupportedAsset(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StaticRateOracle;

    fn resolver() -> AssetResolver {
        let oracle = StaticRateOracle::new()
            .with_rate("USDC", "KES", Decimal::new(160, 0))
            .with_rate("CUSD", "NGN", Decimal::new(1550, 0));
        AssetResolver::new(Arc::new(oracle))
    }

    #[test]
    fn resolves_symbol_case_insensitively() {
        let (asset, rate) = resolver().resolve("usdc", "kes").unwrap();
        assert_eq!(asset, "USDC");
        assert_eq!(rate, Decimal::new(160, 0));
    }

    #[test]
    fn resolves_token_address_to_canonical_symbol() {
        let (asset, rate) = resolver()
            .resolve("0x765DE816845861e75A25fCA122bb6898B8B1282a", "NGN")
            .unwrap();
        assert_eq!(asset, "CUSD");
        assert_eq!(rate, Decimal::new(1550, 0));
    }

    #[test]
    fn unknown_symbol_rejected() {
        let err = resolver().resolve("DOGE", "KES").unwrap_err();
        assert!(matches!(err, OpenrampError::UnsupportedAsset(_)));
    }

    #[test]
    fn unknown_address_rejected() {
        let err = resolver().resolve("0xdeadbeef", "KES").unwrap_err();
        assert!(matches!(err, OpenrampError::UnsupportedAsset(_)));
    }

    #[test]
    fn missing_rate_is_unavailable() {
        let err = resolver().resolve("USDT", "KES").unwrap_err();
        assert!(matches!(err, OpenrampError::RateUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_fiat_rejected() {
        let err = resolver().resolve("USDC", "  ").unwrap_err();
        assert!(matches!(err, OpenrampError::InvalidOrder { .. }));
    }
}

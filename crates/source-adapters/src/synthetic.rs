//! Degraded-mode fallback adapter (§4.1): returns synthesized samples instead
//! of UNAVAILABLE when no live source is configured, so a fresh deployment
//! still produces an index rather than failing every cycle outright.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use syi_core::{AdapterCapability, AdapterError, AdapterErrorKind, AdapterIdentity, RawYieldSample, SourceAdapter, SourceKind};

/// A fixed (symbol, apy) seed used to synthesize a plausible sample when real
/// sources are down. Values are last-known-good snapshots, not live data.
#[derive(Debug, Clone)]
pub struct SyntheticSeed {
    pub symbol: String,
    pub apy_total: Decimal,
}

/// Wraps a seed list and answers `fetch_yields` with synthesized samples,
/// clearly labeled via `source_id` so downstream consumers can flag them.
pub struct SyntheticYieldAdapter {
    source_id: String,
    seeds: Vec<SyntheticSeed>,
}

impl SyntheticYieldAdapter {
    pub fn new(source_id: impl Into<String>, seeds: Vec<SyntheticSeed>) -> Self {
        Self {
            source_id: source_id.into(),
            seeds,
        }
    }
}

#[async_trait]
impl SourceAdapter for SyntheticYieldAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Cefi,
            capabilities: vec![AdapterCapability::Yields],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        if self.seeds.is_empty() {
            return Err(AdapterError::new(
                self.source_id.clone(),
                AdapterErrorKind::Unavailable,
                "no synthetic seeds configured",
            ));
        }
        let observed_at = Utc::now();
        Ok(self
            .seeds
            .iter()
            .map(|seed| RawYieldSample {
                symbol: seed.symbol.to_uppercase(),
                source_id: self.source_id.clone(),
                source_kind: SourceKind::Cefi,
                chain: None,
                pool_id: None,
                apy_total: seed.apy_total,
                apy_base: None,
                apy_reward: None,
                borrow_apy: None,
                tvl_usd: None,
                observed_at,
            })
            .collect())
    }
}

//! `RAYRecord` stream, keyed by `(symbol, source_id)` (§4.8).

use chrono::{DateTime, Utc};
use syi_core::{EngineError, RAYRecord};

use crate::series::Partitioned;

fn natural_key(symbol: &str, source_id: &str) -> String {
    format!("{symbol}:{source_id}")
}

#[derive(Debug, Default)]
pub struct RayStore {
    series: Partitioned<DateTime<Utc>, RAYRecord>,
}

impl RayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: RAYRecord) -> Result<(), EngineError> {
        let key = natural_key(&record.symbol, &record.source_id);
        self.series.append(&key, record.observed_at, record)
    }

    pub fn latest(&self, symbol: &str, source_id: &str) -> Option<RAYRecord> {
        self.series.latest(&natural_key(symbol, source_id))
    }

    /// `[from, to]` series for one `(symbol, source_id)` pair.
    pub fn range(&self, symbol: &str, source_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<RAYRecord> {
        self.series
            .range(&natural_key(symbol, source_id), from, to)
            .into_iter()
            .map(|(_, v)| v)
            .collect()
    }

    /// The last `n` samples for one `(symbol, source_id)` pair, oldest
    /// first — the count-bounded window `EQUAL_RISK` weighting needs
    /// (spec: "1/σ of RAY over the last 30 samples"), as opposed to
    /// `range`'s time-bounded window.
    pub fn last_n_for_source(&self, symbol: &str, source_id: &str, n: usize) -> Vec<RAYRecord> {
        self.series
            .last_n(&natural_key(symbol, source_id), n)
            .into_iter()
            .map(|(_, v)| v)
            .collect()
    }

    /// Per-symbol RAY time series across every source feeding it, merged
    /// and sorted by `observed_at` — the §6.2 "per-symbol ... RAY time
    /// series" query, which is not scoped to one source.
    pub fn range_for_symbol(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<RAYRecord> {
        let prefix = format!("{symbol}:");
        let mut merged: Vec<RAYRecord> = self
            .series
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .flat_map(|k| self.series.range(&k, from, to))
            .map(|(_, v)| v)
            .collect();
        merged.sort_by_key(|r| r.observed_at);
        merged
    }

    pub fn trim_before(&self, cutoff: DateTime<Utc>) {
        self.series.trim_before(cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use syi_core::RiskFactors;

    fn record(symbol: &str, source_id: &str, at: DateTime<Utc>) -> RAYRecord {
        RAYRecord {
            symbol: symbol.to_string(),
            source_id: source_id.to_string(),
            base_apy: dec!(0.05),
            ray: dec!(0.04),
            risk_penalty: dec!(0.01),
            confidence: 0.9,
            factors: RiskFactors::new(1.0, 1.0, 1.0, 1.0, 1.0),
            observed_at: at,
        }
    }

    #[test]
    fn range_for_symbol_merges_across_sources() {
        let store = RayStore::new();
        let t0 = Utc::now();
        store.append(record("USDC", "cefi-a", t0)).unwrap();
        store.append(record("USDC", "defi-b", t0 + chrono::Duration::seconds(1))).unwrap();
        store.append(record("USDT", "cefi-a", t0)).unwrap();

        let merged = store.range_for_symbol("USDC", t0 - chrono::Duration::seconds(1), t0 + chrono::Duration::seconds(2));
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|r| r.symbol == "USDC"));
    }

    #[test]
    fn distinct_sources_have_independent_monotonicity() {
        let store = RayStore::new();
        let t0 = Utc::now();
        store.append(record("USDC", "a", t0)).unwrap();
        // Different source, same timestamp is fine — independent natural key.
        store.append(record("USDC", "b", t0)).unwrap();
    }
}

//! The Time-Series Store application object (§4.8): one instance per
//! process, owning every persisted stream. Components other than the
//! scheduler (which appends) only ever see it through the read methods
//! re-exported here — "the Time-Series Store exclusively owns all
//! persisted records; components receive copies via query" (§3).

use chrono::{DateTime, NaiveDate, Utc};
use syi_core::{EngineError, IndexCode, IndexValue, LiquidityMetrics, PegMetrics, RAYRecord, RegimeSample};
use tracing::debug;

use crate::index_store::{IndexRangeResult, IndexStatistics, IndexStore};
use crate::metrics_store::{LiquidityMetricsStore, PegMetricsStore};
use crate::ray_store::RayStore;
use crate::regime_store::RegimeStore;
use crate::retention::RetentionPolicy;

#[derive(Debug, Default)]
pub struct Store {
    index_values: IndexStore,
    ray: RayStore,
    peg_metrics: PegMetricsStore,
    liquidity_metrics: LiquidityMetricsStore,
    regime: RegimeStore,
    retention: RetentionPolicy,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: RetentionPolicy) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    pub fn append_index_value(&self, value: IndexValue) -> Result<(), EngineError> {
        self.index_values.append(value)
    }

    pub fn latest_index_value(&self, code: IndexCode) -> Option<IndexValue> {
        self.index_values.latest(code)
    }

    pub fn index_range(
        &self,
        code: IndexCode,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_points: Option<usize>,
    ) -> IndexRangeResult {
        self.index_values.range(code, from, to, max_points)
    }

    pub fn index_statistics(&self, code: IndexCode, days: i64, as_of: DateTime<Utc>) -> IndexStatistics {
        self.index_values.statistics(code, days, as_of)
    }

    pub fn append_ray(&self, record: RAYRecord) -> Result<(), EngineError> {
        self.ray.append(record)
    }

    pub fn latest_ray(&self, symbol: &str, source_id: &str) -> Option<RAYRecord> {
        self.ray.latest(symbol, source_id)
    }

    pub fn ray_range_for_symbol(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<RAYRecord> {
        self.ray.range_for_symbol(symbol, from, to)
    }

    pub fn ray_last_n_for_source(&self, symbol: &str, source_id: &str, n: usize) -> Vec<RAYRecord> {
        self.ray.last_n_for_source(symbol, source_id, n)
    }

    pub fn append_peg_metrics(&self, metrics: PegMetrics) -> Result<(), EngineError> {
        self.peg_metrics.append(metrics)
    }

    pub fn latest_peg_metrics(&self, symbol: &str) -> Option<PegMetrics> {
        self.peg_metrics.latest(symbol)
    }

    pub fn peg_metrics_range(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PegMetrics> {
        self.peg_metrics.range(symbol, from, to)
    }

    pub fn append_liquidity_metrics(&self, metrics: LiquidityMetrics) -> Result<(), EngineError> {
        self.liquidity_metrics.append(metrics)
    }

    pub fn latest_liquidity_metrics(&self, symbol: &str) -> Option<LiquidityMetrics> {
        self.liquidity_metrics.latest(symbol)
    }

    pub fn liquidity_metrics_range(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<LiquidityMetrics> {
        self.liquidity_metrics.range(symbol, from, to)
    }

    pub fn append_regime_sample(&self, code: IndexCode, sample: RegimeSample) -> Result<(), EngineError> {
        self.regime.append(code, sample)
    }

    pub fn latest_regime_sample(&self, code: IndexCode) -> Option<RegimeSample> {
        self.regime.latest(code)
    }

    pub fn regime_history(&self, code: IndexCode, from: NaiveDate, to: NaiveDate, limit: Option<usize>) -> Vec<RegimeSample> {
        self.regime.history(code, from, to, limit)
    }

    /// Runs the §6.3 retention pass: trims streams with a finite policy,
    /// leaves streams configured as indefinite untouched.
    pub fn enforce_retention(&self, now: DateTime<Utc>) {
        if let Some(window) = self.retention.peg_metrics {
            self.peg_metrics.trim_before(now - window);
        }
        if let Some(window) = self.retention.liquidity_metrics {
            self.liquidity_metrics.trim_before(now - window);
        }
        if let Some(window) = self.retention.ray {
            self.ray.trim_before(now - window);
        }
        debug!("retention pass complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use syi_core::IndexMode;

    #[test]
    fn append_then_latest_roundtrips_an_index_value() {
        let store = Store::new();
        let now = Utc::now();
        let value = IndexValue {
            index_code: IndexCode::Syi,
            observed_at: now,
            value: dec!(0.0447448),
            mode: IndexMode::Normal,
            confidence: 0.95,
            constituent_count: 6,
            hhi: 0.1,
            notes: vec![],
            staleness_flags: vec![],
            constituents: vec![],
        };
        store.append_index_value(value.clone()).unwrap();
        let latest = store.latest_index_value(IndexCode::Syi).unwrap();
        assert_eq!(latest.value, value.value);
    }

    #[test]
    fn retention_pass_leaves_indefinite_streams_untouched() {
        let store = Store::new();
        let now = Utc::now();
        let ray_record = syi_core::RAYRecord {
            symbol: "USDC".into(),
            source_id: "a".into(),
            base_apy: dec!(0.04),
            ray: dec!(0.04),
            risk_penalty: dec!(0.0),
            confidence: 0.9,
            factors: syi_core::RiskFactors::new(1.0, 1.0, 1.0, 1.0, 1.0),
            observed_at: now - chrono::Duration::days(1000),
        };
        store.append_ray(ray_record).unwrap();
        store.enforce_retention(now);
        assert!(store.latest_ray("USDC", "a").is_some());
    }
}

//! Per-symbol `PegMetrics` and `LiquidityMetrics` streams (§4.8).

use chrono::{DateTime, Utc};
use syi_core::{EngineError, LiquidityMetrics, PegMetrics};

use crate::series::Partitioned;

#[derive(Debug, Default)]
pub struct PegMetricsStore {
    series: Partitioned<DateTime<Utc>, PegMetrics>,
}

impl PegMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, metrics: PegMetrics) -> Result<(), EngineError> {
        let key = metrics.symbol.clone();
        self.series.append(&key, metrics.window_end, metrics)
    }

    pub fn latest(&self, symbol: &str) -> Option<PegMetrics> {
        self.series.latest(symbol)
    }

    pub fn range(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PegMetrics> {
        self.series.range(symbol, from, to).into_iter().map(|(_, v)| v).collect()
    }

    /// Retention default: 30 days minimum per §3's Lifecycles rule for
    /// per-minute-granularity derived metrics.
    pub fn trim_before(&self, cutoff: DateTime<Utc>) {
        self.series.trim_before(cutoff);
    }
}

#[derive(Debug, Default)]
pub struct LiquidityMetricsStore {
    series: Partitioned<DateTime<Utc>, LiquidityMetrics>,
}

impl LiquidityMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, metrics: LiquidityMetrics) -> Result<(), EngineError> {
        let key = metrics.symbol.clone();
        self.series.append(&key, metrics.window_end, metrics)
    }

    pub fn latest(&self, symbol: &str) -> Option<LiquidityMetrics> {
        self.series.latest(symbol)
    }

    pub fn range(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<LiquidityMetrics> {
        self.series.range(symbol, from, to).into_iter().map(|(_, v)| v).collect()
    }

    /// Retention default: 180 days (§6.3).
    pub fn trim_before(&self, cutoff: DateTime<Utc>) {
        self.series.trim_before(cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn peg(symbol: &str, at: DateTime<Utc>) -> PegMetrics {
        PegMetrics {
            symbol: symbol.to_string(),
            window_end: at,
            vw_price: dec!(1.0),
            peg_dev_bps: 0.0,
            vol_5m_bps: 1.0,
            vol_1h_bps: 1.0,
            peg_score: 0.99,
        }
    }

    #[test]
    fn peg_metrics_append_and_latest_roundtrip() {
        let store = PegMetricsStore::new();
        let t0 = Utc::now();
        store.append(peg("USDC", t0)).unwrap();
        assert_eq!(store.latest("USDC").unwrap().symbol, "USDC");
        assert!(store.latest("USDT").is_none());
    }

    #[test]
    fn trim_before_enforces_retention_window() {
        let store = PegMetricsStore::new();
        let t0 = Utc::now();
        store.append(peg("USDC", t0)).unwrap();
        store.append(peg("USDC", t0 + chrono::Duration::days(31))).unwrap();
        store.trim_before(t0 + chrono::Duration::days(30));
        assert_eq!(store.range("USDC", t0 - chrono::Duration::days(1), t0 + chrono::Duration::days(60)).len(), 1);
    }
}

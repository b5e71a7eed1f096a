use chrono::Duration as ChronoDuration;

use crate::thresholds::LiquidityThresholds;
use crate::weighting::WeightingScheme;

/// Every knob §4.5 names, with its documented default.
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    pub scheme: WeightingScheme,
    pub min_confidence: f64,
    pub max_staleness: ChronoDuration,
    pub soft_staleness: ChronoDuration,
    pub hard_staleness: ChronoDuration,
    pub min_constituents: usize,
    pub constituent_cap: f64,
    pub liquidity_thresholds: LiquidityThresholds,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            scheme: WeightingScheme::MarketCap,
            min_confidence: 0.50,
            max_staleness: ChronoDuration::minutes(10),
            soft_staleness: ChronoDuration::minutes(5),
            hard_staleness: ChronoDuration::minutes(15),
            min_constituents: 3,
            constituent_cap: 0.40,
            liquidity_thresholds: LiquidityThresholds::default(),
        }
    }
}

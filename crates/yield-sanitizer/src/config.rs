use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use syi_core::OutlierMethod;

/// Every knob the sanitizer reads, with the defaults documented in §4.3.
/// Kept as an explicit struct rather than bare literals so a deployment can
/// tune thresholds without touching the algorithm.
#[derive(Debug, Clone, Copy)]
pub struct SanitizerConfig {
    pub absolute_minimum: Decimal,
    pub absolute_maximum: Decimal,
    pub reasonable_maximum: Decimal,
    pub suspicious_threshold: Decimal,
    pub method: OutlierMethod,
    pub mad_threshold: f64,
    pub iqr_multiplier: f64,
    pub winsorize_quantiles: (f64, f64),
    pub max_reward_ratio: f64,
    pub flash_spike_threshold: Decimal,
    pub min_comparables: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            absolute_minimum: dec!(0.0),
            absolute_maximum: dec!(1.50),
            reasonable_maximum: dec!(0.50),
            suspicious_threshold: dec!(0.20),
            method: OutlierMethod::Mad,
            mad_threshold: 3.0,
            iqr_multiplier: 1.5,
            winsorize_quantiles: (0.05, 0.95),
            max_reward_ratio: 4.0,
            flash_spike_threshold: dec!(1.00),
            min_comparables: 5,
        }
    }
}

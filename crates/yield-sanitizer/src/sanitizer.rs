//! Deterministic `(raw_apy, market_context) -> SanitizationResult` mapping (§4.3).

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use syi_core::{OutlierMethod, SanitizationAction, SanitizationResult};

use crate::config::SanitizerConfig;
use crate::stats::{iqr_fence_distance, mad_z_score, quantile};

/// The raw sample plus whatever the caller already knows about its peers.
#[derive(Debug, Clone)]
pub struct SanitizerInput {
    pub apy_total: Decimal,
    pub apy_base: Option<Decimal>,
    pub apy_reward: Option<Decimal>,
    pub borrow_apy: Option<Decimal>,
    /// Other samples sharing this sample's `source_kind` and symbol.
    pub comparable_samples: Vec<Decimal>,
    /// All samples in the current cycle, used when comparables are too few.
    pub all_samples: Vec<Decimal>,
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn from_f64(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Runs the full §4.3 pipeline: bounds, base-vs-reward, supply/borrow,
/// outlier test, action resolution, confidence scoring. Pure and
/// deterministic — same inputs always produce the same output.
pub fn sanitize(input: &SanitizerInput, config: &SanitizerConfig) -> SanitizationResult {
    let mut warnings = Vec::new();
    let mut effective_apy = input.apy_total;
    let mut reject = false;

    // 1. Basic bounds.
    if effective_apy < config.absolute_minimum {
        effective_apy = config.absolute_minimum;
        warnings.push(format!("below absolute minimum {}, capped to floor", config.absolute_minimum));
    }
    if input.apy_total > config.absolute_maximum {
        reject = true;
        warnings.push(format!("above absolute maximum {}", config.absolute_maximum));
    }

    // 2. Base-vs-reward.
    if let (Some(base), Some(reward)) = (input.apy_base, input.apy_reward) {
        if !base.is_zero() && to_f64(reward / base) > config.max_reward_ratio {
            effective_apy = base;
            warnings.push("reward-to-base ratio exceeds cap, falling back to base apy".to_string());
        }
    }

    // 3. Supply vs borrow (informational only, no mutation).
    if let Some(borrow_apy) = input.borrow_apy {
        if input.apy_total > borrow_apy {
            warnings.push("inverted-curve: supply apy exceeds borrow apy".to_string());
        }
    }

    if input.apy_total > config.flash_spike_threshold {
        warnings.push(format!("apy exceeds flash-spike threshold {}", config.flash_spike_threshold));
    }

    if reject {
        return SanitizationResult {
            original_apy: input.apy_total,
            sanitized_apy: effective_apy,
            action: SanitizationAction::Reject,
            outlier_score: 0.0,
            confidence: confidence_from_warnings(&warnings, 0.0, config.mad_threshold),
            warnings,
            method_used: config.method,
        };
    }

    // 4. Outlier test against comparables, falling back to all samples.
    let samples = if input.comparable_samples.len() >= config.min_comparables {
        &input.comparable_samples
    } else {
        &input.all_samples
    };
    let sample_values: Vec<f64> = samples.iter().map(|d| to_f64(*d)).collect();
    let value = to_f64(effective_apy);

    let (outlier_score, threshold, is_outlier) = match config.method {
        OutlierMethod::Mad => {
            let score = mad_z_score(&sample_values, value);
            (score, config.mad_threshold, score >= config.mad_threshold)
        }
        OutlierMethod::Iqr => {
            let score = iqr_fence_distance(&sample_values, value, config.iqr_multiplier);
            (score, 0.0, score > 0.0)
        }
    };

    let suspicious = effective_apy > config.suspicious_threshold;

    // 5. Resolve action.
    let (action, sanitized_apy) = if is_outlier && effective_apy <= config.absolute_maximum {
        let mut sorted = sample_values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let (lo_q, hi_q) = config.winsorize_quantiles;
        let lower = from_f64(quantile(&sorted, lo_q));
        let upper = from_f64(quantile(&sorted, hi_q));
        let winsorized = effective_apy.clamp(lower, upper);

        if winsorized > config.reasonable_maximum {
            (SanitizationAction::Cap, config.reasonable_maximum)
        } else {
            (SanitizationAction::Winsorize, winsorized)
        }
    } else if suspicious && !is_outlier {
        (SanitizationAction::Flag, effective_apy)
    } else {
        (SanitizationAction::Accept, effective_apy)
    };

    if !matches!(action, SanitizationAction::Accept) && warnings.is_empty() {
        warnings.push(format!("{:?} applied", action));
    }

    let confidence = confidence_from_warnings(&warnings, (outlier_score - threshold).max(0.0), threshold);

    SanitizationResult {
        original_apy: input.apy_total,
        sanitized_apy,
        action,
        outlier_score: if outlier_score.is_finite() { outlier_score } else { f64::MAX },
        confidence,
        warnings,
        method_used: config.method,
    }
}

fn confidence_from_warnings(warnings: &[String], sigma_above_threshold: f64, _threshold: f64) -> f64 {
    let mut confidence = 1.0;
    confidence -= 0.25 * warnings.len() as f64;
    confidence -= 0.1 * sigma_above_threshold;
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(apy: Decimal) -> SanitizerInput {
        SanitizerInput {
            apy_total: apy,
            apy_base: None,
            apy_reward: None,
            borrow_apy: None,
            comparable_samples: vec![dec!(0.04), dec!(0.042), dec!(0.038), dec!(0.041), dec!(0.039)],
            all_samples: vec![],
        }
    }

    #[test]
    fn typical_stablecoin_yield_is_accepted() {
        let result = sanitize(&input(dec!(0.04)), &SanitizerConfig::default());
        assert_eq!(result.action, SanitizationAction::Accept);
        assert_eq!(result.sanitized_apy, dec!(0.04));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn value_above_absolute_maximum_is_rejected() {
        let result = sanitize(&input(dec!(2.0)), &SanitizerConfig::default());
        assert_eq!(result.action, SanitizationAction::Reject);
        assert_eq!(result.sanitized_apy, dec!(2.0));
    }

    #[test]
    fn rejected_value_stays_rejected_when_fed_back_through_sanitize() {
        // §8 idempotence: sanitize(sanitize(x, ctx), ctx) = sanitize(x, ctx).
        let config = SanitizerConfig::default();
        let first = sanitize(&input(dec!(5.0)), &config);
        let second = sanitize(&input(first.sanitized_apy), &config);
        assert_eq!(first.action, second.action);
        assert_eq!(first.sanitized_apy, second.sanitized_apy);
    }

    #[test]
    fn winsorized_value_is_a_fixed_point_of_sanitize() {
        let config = SanitizerConfig::default();
        let first = sanitize(&input(dec!(0.30)), &config);
        let second = sanitize(&input(first.sanitized_apy), &config);
        assert_eq!(first.sanitized_apy, second.sanitized_apy);
    }

    #[test]
    fn value_below_absolute_minimum_is_capped_to_floor() {
        let result = sanitize(&input(dec!(-0.01)), &SanitizerConfig::default());
        assert!(result.sanitized_apy >= dec!(0.0));
        assert!(result.warnings.iter().any(|w| w.contains("absolute minimum")));
    }

    #[test]
    fn outlier_among_comparables_is_winsorized() {
        let result = sanitize(&input(dec!(0.30)), &SanitizerConfig::default());
        assert_ne!(result.action, SanitizationAction::Accept);
    }

    #[test]
    fn reward_exceeding_ratio_falls_back_to_base() {
        let mut input = input(dec!(0.5));
        input.apy_base = Some(dec!(0.04));
        input.apy_reward = Some(dec!(0.3));
        let result = sanitize(&input, &SanitizerConfig::default());
        assert!(result.warnings.iter().any(|w| w.contains("reward-to-base")));
    }

    #[test]
    fn determinism_same_input_same_output() {
        let config = SanitizerConfig::default();
        let a = sanitize(&input(dec!(0.06)), &config);
        let b = sanitize(&input(dec!(0.06)), &config);
        assert_eq!(a.sanitized_apy, b.sanitized_apy);
        assert_eq!(a.action, b.action);
        assert_eq!(a.confidence, b.confidence);
    }
}

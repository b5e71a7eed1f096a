//! `(sanitized_base_apy, risk_factors) -> RAYRecord` (§4.4).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use syi_core::{RAYRecord, RiskFactors};

use crate::config::RayConfig;

/// One risk factor's observed value and the confidence behind it. `value`
/// is `None` when the upstream stage couldn't produce one this cycle.
#[derive(Debug, Clone, Copy)]
pub struct FactorInput {
    pub value: Option<f64>,
    pub confidence: f64,
}

impl FactorInput {
    pub fn observed(value: f64, confidence: f64) -> Self {
        Self {
            value: Some(value),
            confidence,
        }
    }

    pub fn missing() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }
}

fn resolve(input: FactorInput, default: f64, missing_confidence: f64, name: &str, warnings: &mut Vec<String>) -> (f64, f64) {
    match input.value {
        Some(v) => (v, input.confidence),
        None => {
            warnings.push(format!("{name} factor missing, defaulted to {default}"));
            (default, missing_confidence)
        }
    }
}

/// Computes a `RAYRecord` from sanitized `base_apy` and the five risk
/// factors. Never fails: a missing factor falls back to its documented
/// default rather than omitting the record (§4.4 "Failure semantics" — the
/// record is only omitted upstream, when the sanitizer itself rejects the
/// sample).
pub fn compute_ray(
    symbol: &str,
    source_id: &str,
    base_apy: Decimal,
    peg: FactorInput,
    liquidity: FactorInput,
    counterparty: FactorInput,
    reputation: FactorInput,
    temporal: FactorInput,
    sanitizer_confidence: f64,
    config: &RayConfig,
    observed_at: DateTime<Utc>,
) -> (RAYRecord, Vec<String>) {
    let mut warnings = Vec::new();

    let (peg_v, peg_c) = resolve(peg, 1.0, config.missing_factor_confidence, "peg_score", &mut warnings);
    let (liq_v, liq_c) = resolve(liquidity, 1.0, config.missing_factor_confidence, "liquidity_score", &mut warnings);
    let (cp_v, cp_c) = resolve(
        counterparty,
        config.default_counterparty_score,
        config.missing_factor_confidence,
        "counterparty_score",
        &mut warnings,
    );
    let (rep_v, rep_c) = resolve(
        reputation,
        config.default_protocol_reputation,
        config.missing_factor_confidence,
        "protocol_reputation",
        &mut warnings,
    );
    let (temp_v, temp_c) = resolve(
        temporal,
        config.default_temporal_stability,
        config.missing_factor_confidence,
        "temporal_stability",
        &mut warnings,
    );

    let factors = RiskFactors::new(peg_v, liq_v, cp_v, rep_v, temp_v);
    let risk_multiplier = factors.risk_multiplier();

    let ray = base_apy * Decimal::from_f64(risk_multiplier).unwrap_or(Decimal::ONE);
    let risk_penalty = base_apy - ray;

    let mean_factor_confidence = (peg_c + liq_c + cp_c + rep_c + temp_c) / 5.0;
    let confidence = sanitizer_confidence.min(mean_factor_confidence).clamp(0.0, 1.0);

    let record = RAYRecord {
        symbol: symbol.to_string(),
        source_id: source_id.to_string(),
        base_apy,
        ray,
        risk_penalty,
        confidence,
        factors,
        observed_at,
    };

    (record, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn perfect_factors_leave_ray_equal_to_base_apy() {
        let (record, warnings) = compute_ray(
            "USDC",
            "source-a",
            dec!(0.04),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            1.0,
            &RayConfig::default(),
            Utc::now(),
        );
        assert_eq!(record.ray, dec!(0.04));
        assert_eq!(record.risk_penalty, dec!(0.0));
        assert_eq!(record.confidence, 1.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_factors_fall_back_to_documented_defaults() {
        let (record, warnings) = compute_ray(
            "USDT",
            "source-b",
            dec!(0.05),
            FactorInput::observed(0.9, 0.9),
            FactorInput::observed(0.9, 0.9),
            FactorInput::missing(),
            FactorInput::missing(),
            FactorInput::missing(),
            0.9,
            &RayConfig::default(),
            Utc::now(),
        );
        assert_eq!(warnings.len(), 3);
        assert!(record.ray < dec!(0.05));
        assert!(record.confidence < 0.9);
    }

    #[test]
    fn weak_single_factor_dampens_but_does_not_zero_ray() {
        let config = RayConfig::default();
        let (record, _) = compute_ray(
            "DAI",
            "source-c",
            dec!(0.04),
            FactorInput::observed(0.1, 1.0),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            FactorInput::observed(1.0, 1.0),
            1.0,
            &config,
            Utc::now(),
        );
        assert!(record.ray > dec!(0.0));
        assert!(record.ray < dec!(0.04));
    }
}

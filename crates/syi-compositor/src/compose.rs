//! `compose(index_code, candidates, config) -> Result<IndexValue, EngineError>` (§4.5).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use syi_core::{Constituent, EngineError, IndexCode, IndexValue, SanitizationAction};

use crate::candidate::Candidate;
use crate::config::CompositorConfig;
use crate::mode::{classify_mode, ModeContext};
use crate::normalize::normalize_with_cap;
use crate::weighting::{raw_weight, select_market_cap_candidates, WeightingScheme};

fn is_eligible(candidate: &Candidate, config: &CompositorConfig) -> bool {
    if candidate.sanitization_action == SanitizationAction::Reject {
        return false;
    }
    if candidate.record.confidence < config.min_confidence {
        return false;
    }
    if candidate.sample_age > config.max_staleness {
        return false;
    }
    let tvl = candidate.tvl_usd.unwrap_or(Decimal::ZERO);
    config.liquidity_thresholds.meets_threshold(
        tvl,
        candidate.chain.as_deref(),
        &candidate.symbol,
        candidate.protocol.as_deref(),
        candidate.vol_7d,
        candidate.vol_30d,
    )
}

/// Runs the full §4.5 pipeline: eligibility, scheme-specific selection and
/// weighting, cap normalization, and mode classification. Returns
/// `InsufficientConstituents` rather than an empty/degenerate `IndexValue`
/// when too few candidates survive — the caller is expected to keep
/// serving the last good value, marked stale, in that case.
pub fn compose(
    index_code: IndexCode,
    candidates: Vec<Candidate>,
    config: &CompositorConfig,
    mode_ctx: ModeContext,
    as_of: DateTime<Utc>,
) -> Result<IndexValue, EngineError> {
    let eligible: Vec<Candidate> = candidates.into_iter().filter(|c| is_eligible(c, config)).collect();

    let selected = if config.scheme == WeightingScheme::MarketCap {
        select_market_cap_candidates(&eligible)
    } else {
        eligible
    };

    if selected.len() < config.min_constituents {
        return Err(EngineError::InsufficientConstituents {
            have: selected.len(),
            required: config.min_constituents,
        });
    }

    // Deterministic tie-break order: (symbol ascending, source_id ascending).
    let mut ordered = selected;
    ordered.sort_by(|a, b| a.symbol.cmp(&b.symbol).then_with(|| a.source_id.cmp(&b.source_id)));

    let raw: Vec<f64> = ordered.iter().map(|c| raw_weight(c, config.scheme)).collect();
    let weights = normalize_with_cap(&raw, config.constituent_cap);

    let mut value = Decimal::ZERO;
    let mut hhi = 0.0;
    let mut min_confidence = f64::MAX;
    let mut staleness_flags = Vec::new();
    let mut constituents = Vec::with_capacity(ordered.len());

    for (candidate, weight) in ordered.into_iter().zip(weights) {
        let weight_decimal = Decimal::from_f64(weight).unwrap_or(Decimal::ZERO);
        value += weight_decimal * candidate.record.ray;
        hhi += weight * weight;
        min_confidence = min_confidence.min(candidate.record.confidence);

        if candidate.sample_age > config.soft_staleness {
            staleness_flags.push(format!("{}/{} sample is stale", candidate.symbol, candidate.source_id));
        }

        constituents.push(Constituent {
            id: format!("{}:{}", candidate.symbol, candidate.source_id),
            symbol: candidate.symbol,
            source_id: candidate.source_id,
            chain: candidate.chain,
            pool_id: candidate.pool_id,
            weight: weight_decimal,
            ray: candidate.record.ray,
            tvl_usd: candidate.tvl_usd,
            capacity_usd: candidate.capacity_usd,
            record: candidate.record,
        });
    }

    let mode = classify_mode(mode_ctx);

    Ok(IndexValue {
        index_code,
        observed_at: as_of,
        value,
        mode,
        confidence: min_confidence,
        constituent_count: constituents.len(),
        hhi,
        notes: Vec::new(),
        staleness_flags,
        constituents,
    })
}

/// Pins a mode down for callers that don't yet have historical context
/// (e.g. cold-start cycles). Exposed for tests and the scheduler's warm-up path.
pub fn normal_mode_context() -> ModeContext {
    ModeContext::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use rust_decimal_macros::dec;
    use syi_core::{RAYRecord, RiskFactors};

    fn candidate(symbol: &str, source_id: &str, market_cap: Decimal, confidence: f64) -> Candidate {
        Candidate {
            symbol: symbol.to_string(),
            source_id: source_id.to_string(),
            chain: None,
            pool_id: None,
            protocol: None,
            record: RAYRecord {
                symbol: symbol.to_string(),
                source_id: source_id.to_string(),
                base_apy: dec!(0.04),
                ray: dec!(0.04),
                risk_penalty: dec!(0.0),
                confidence,
                factors: RiskFactors::new(1.0, 1.0, 1.0, 1.0, 1.0),
                observed_at: Utc::now(),
            },
            sanitization_action: SanitizationAction::Accept,
            sample_age: ChronoDuration::seconds(1),
            market_cap_usd: Some(market_cap),
            capacity_usd: None,
            tvl_usd: Some(dec!(10_000_000)),
            operational_days: Some(400),
            ray_stddev_30: Some(0.01),
            vol_7d: None,
            vol_30d: None,
        }
    }

    #[test]
    fn too_few_eligible_candidates_yields_insufficient_constituents() {
        let config = CompositorConfig::default();
        let candidates = vec![candidate("USDC", "a", dec!(1_000_000_000), 0.9)];
        let result = compose(IndexCode::Syi, candidates, &config, normal_mode_context(), Utc::now());
        assert!(matches!(result, Err(EngineError::InsufficientConstituents { have: 1, required: 3 })));
    }

    #[test]
    fn eligible_candidates_compose_to_weighted_index_value() {
        let config = CompositorConfig::default();
        let candidates = vec![
            candidate("USDC", "a", dec!(30_000_000_000), 0.9),
            candidate("USDT", "b", dec!(90_000_000_000), 0.9),
            candidate("DAI", "c", dec!(5_000_000_000), 0.9),
        ];
        let result = compose(IndexCode::Syi, candidates, &config, normal_mode_context(), Utc::now()).unwrap();
        assert_eq!(result.constituent_count, 3);
        assert!(result.value > Decimal::ZERO);
        assert!(result.hhi > 0.0 && result.hhi <= 1.0);
    }

    #[test]
    fn rejected_sample_is_excluded_from_eligibility() {
        let config = CompositorConfig::default();
        let mut rejected = candidate("USDC", "a", dec!(1_000_000_000), 0.9);
        rejected.sanitization_action = SanitizationAction::Reject;
        let candidates = vec![
            rejected,
            candidate("USDT", "b", dec!(90_000_000_000), 0.9),
            candidate("DAI", "c", dec!(5_000_000_000), 0.9),
        ];
        let result = compose(IndexCode::Syi, candidates, &config, normal_mode_context(), Utc::now());
        assert!(matches!(result, Err(EngineError::InsufficientConstituents { have: 2, .. })));
    }
}

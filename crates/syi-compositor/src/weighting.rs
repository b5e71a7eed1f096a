//! The five §4.5 weighting schemes. Each produces an unnormalized raw
//! weight per eligible candidate; `compose` normalizes and caps afterward.

use rust_decimal::prelude::*;

use crate::candidate::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingScheme {
    MarketCap,
    EqualRisk,
    Capacity,
    TvlMaturity,
    Equal,
}

fn decimal_to_f64(d: rust_decimal::Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// `MARKET_CAP` selection step: when a symbol has more than one eligible
/// source, keep only the highest-confidence RAY for it. Other schemes
/// treat every (symbol, source) pair as its own constituent.
pub fn select_market_cap_candidates(candidates: &[Candidate]) -> Vec<Candidate> {
    use std::collections::HashMap;
    let mut best: HashMap<String, Candidate> = HashMap::new();
    for candidate in candidates {
        best.entry(candidate.symbol.clone())
            .and_modify(|existing| {
                if candidate.record.confidence > existing.record.confidence {
                    *existing = candidate.clone();
                }
            })
            .or_insert_with(|| candidate.clone());
    }
    best.into_values().collect()
}

/// Raw (unnormalized) weight for one candidate under `scheme`. Candidates
/// lacking the scheme's required input get weight 0, which the cap
/// normalization step naturally excludes without special-casing.
pub fn raw_weight(candidate: &Candidate, scheme: WeightingScheme) -> f64 {
    match scheme {
        WeightingScheme::MarketCap => candidate.market_cap_usd.map(decimal_to_f64).unwrap_or(0.0),
        WeightingScheme::EqualRisk => candidate
            .ray_stddev_30
            .filter(|sigma| *sigma > 0.0)
            .map(|sigma| 1.0 / sigma)
            .unwrap_or(0.0),
        WeightingScheme::Capacity => candidate.capacity_usd.map(decimal_to_f64).unwrap_or(0.0),
        WeightingScheme::TvlMaturity => {
            let tvl = candidate.tvl_usd.map(decimal_to_f64).unwrap_or(0.0);
            let maturity_factor = candidate
                .operational_days
                .map(|days| (days as f64 / 365.0).clamp(0.0, 1.0))
                .unwrap_or(0.0);
            tvl * maturity_factor
        }
        WeightingScheme::Equal => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use rust_decimal_macros::dec;
    use syi_core::{RAYRecord, RiskFactors, SanitizationAction};

    fn candidate(symbol: &str, source_id: &str, confidence: f64) -> Candidate {
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
            market_cap_usd: None,
            capacity_usd: None,
            tvl_usd: None,
            operational_days: None,
            ray_stddev_30: None,
            vol_7d: None,
            vol_30d: None,
        }
    }

    #[test]
    fn market_cap_selection_keeps_highest_confidence_source_per_symbol() {
        let candidates = vec![candidate("USDC", "a", 0.6), candidate("USDC", "b", 0.9)];
        let selected = select_market_cap_candidates(&candidates);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source_id, "b");
    }

    #[test]
    fn equal_scheme_assigns_uniform_raw_weight() {
        let c = candidate("USDC", "a", 1.0);
        assert_eq!(raw_weight(&c, WeightingScheme::Equal), 1.0);
    }
}

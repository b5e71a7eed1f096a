//! Layered TVL/liquidity thresholds: resolve the global floor, then let
//! chain/asset/protocol overrides raise (never lower) the bar.

use std::collections::HashMap;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
pub struct GradeThresholds {
    pub minimum: Decimal,
    pub institutional: Decimal,
    pub blue_chip: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityGrade {
    Minimum,
    Institutional,
    BlueChip,
}

impl GradeThresholds {
    fn get(&self, grade: LiquidityGrade) -> Decimal {
        match grade {
            LiquidityGrade::Minimum => self.minimum,
            LiquidityGrade::Institutional => self.institutional,
            LiquidityGrade::BlueChip => self.blue_chip,
        }
    }
}

/// Minimum 7d/30d TVL-volatility a pool must stay under to remain eligible.
#[derive(Debug, Clone, Copy)]
pub struct StabilityRequirements {
    pub max_7d_volatility: f64,
    pub max_30d_volatility: f64,
}

impl Default for StabilityRequirements {
    fn default() -> Self {
        Self {
            max_7d_volatility: 0.30,
            max_30d_volatility: 0.50,
        }
    }
}

/// Layered liquidity configuration: global floor, with chain/asset/protocol
/// overrides that can only raise the effective threshold for a candidate.
#[derive(Debug, Clone)]
pub struct LiquidityThresholds {
    pub global: GradeThresholds,
    pub chain: HashMap<String, GradeThresholds>,
    pub asset: HashMap<String, GradeThresholds>,
    pub protocol: HashMap<String, GradeThresholds>,
    pub stability: StabilityRequirements,
}

impl Default for LiquidityThresholds {
    fn default() -> Self {
        Self {
            global: GradeThresholds {
                minimum: Decimal::from(1_000_000),
                institutional: Decimal::from(50_000_000),
                blue_chip: Decimal::from(500_000_000),
            },
            chain: HashMap::new(),
            asset: HashMap::new(),
            protocol: HashMap::new(),
            stability: StabilityRequirements::default(),
        }
    }
}

impl LiquidityThresholds {
    /// The effective TVL threshold for a (chain, asset, protocol) triple at
    /// the given grade: the highest of the global, chain, asset and
    /// protocol overrides that apply.
    pub fn tvl_threshold(
        &self,
        chain: Option<&str>,
        asset: &str,
        protocol: Option<&str>,
        grade: LiquidityGrade,
    ) -> Decimal {
        let mut threshold = self.global.get(grade);
        if let Some(chain) = chain {
            if let Some(t) = self.chain.get(&chain.to_lowercase()) {
                threshold = threshold.max(t.get(grade));
            }
        }
        if let Some(t) = self.asset.get(&asset.to_uppercase()) {
            threshold = threshold.max(t.get(grade));
        }
        if let Some(protocol) = protocol {
            if let Some(t) = self.protocol.get(&protocol.to_lowercase()) {
                threshold = threshold.max(t.get(grade));
            }
        }
        threshold
    }

    /// Whether a candidate with the given TVL and volatility profile clears
    /// the minimum-grade threshold and the stability requirements.
    pub fn meets_threshold(
        &self,
        tvl_usd: Decimal,
        chain: Option<&str>,
        asset: &str,
        protocol: Option<&str>,
        vol_7d: Option<f64>,
        vol_30d: Option<f64>,
    ) -> bool {
        let min_tvl = self.tvl_threshold(chain, asset, protocol, LiquidityGrade::Minimum);
        if tvl_usd < min_tvl {
            return false;
        }
        if let Some(v) = vol_7d {
            if v > self.stability.max_7d_volatility {
                return false;
            }
        }
        if let Some(v) = vol_30d {
            if v > self.stability.max_30d_volatility {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_override_raises_but_never_lowers_global_floor() {
        let mut thresholds = LiquidityThresholds::default();
        thresholds.asset.insert(
            "USDT".to_string(),
            GradeThresholds {
                minimum: Decimal::from(500_000),
                institutional: Decimal::from(50_000_000),
                blue_chip: Decimal::from(500_000_000),
            },
        );
        let effective = thresholds.tvl_threshold(None, "USDT", None, LiquidityGrade::Minimum);
        assert_eq!(effective, Decimal::from(1_000_000));
    }

    #[test]
    fn high_volatility_pool_fails_stability_check() {
        let thresholds = LiquidityThresholds::default();
        let ok = thresholds.meets_threshold(Decimal::from(10_000_000), None, "USDC", None, Some(0.5), None);
        assert!(!ok);
    }
}

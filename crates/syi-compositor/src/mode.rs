//! Mode classification (§4.5): HIGH_VOL, BEAR, or NORMAL, reported in that
//! priority order when more than one condition holds.

use rust_decimal::Decimal;
use syi_core::IndexMode;

/// Historical context `compose` needs to classify the mode of a snapshot.
/// Sourced from the time-series store; absent fields default to NORMAL
/// rather than blocking classification on incomplete history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeContext {
    pub volatility_30d: Option<f64>,
    pub rolling_mean_volatility_180d: Option<f64>,
    pub aggregate_defi_tvl: Option<Decimal>,
    pub defi_tvl_20th_percentile_90d: Option<Decimal>,
}

pub fn classify_mode(ctx: ModeContext) -> IndexMode {
    if let (Some(vol_30d), Some(mean_180d)) = (ctx.volatility_30d, ctx.rolling_mean_volatility_180d) {
        if mean_180d > 0.0 && vol_30d > 2.0 * mean_180d {
            return IndexMode::HighVol;
        }
    }
    if let (Some(tvl), Some(p20)) = (ctx.aggregate_defi_tvl, ctx.defi_tvl_20th_percentile_90d) {
        if tvl < p20 {
            return IndexMode::Bear;
        }
    }
    IndexMode::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn high_vol_takes_priority_over_bear() {
        let ctx = ModeContext {
            volatility_30d: Some(0.4),
            rolling_mean_volatility_180d: Some(0.1),
            aggregate_defi_tvl: Some(dec!(1_000)),
            defi_tvl_20th_percentile_90d: Some(dec!(10_000)),
        };
        assert_eq!(classify_mode(ctx), IndexMode::HighVol);
    }

    #[test]
    fn missing_history_defaults_to_normal() {
        assert_eq!(classify_mode(ModeContext::default()), IndexMode::Normal);
    }

    #[test]
    fn low_defi_tvl_classifies_bear() {
        let ctx = ModeContext {
            volatility_30d: Some(0.1),
            rolling_mean_volatility_180d: Some(0.1),
            aggregate_defi_tvl: Some(dec!(1_000)),
            defi_tvl_20th_percentile_90d: Some(dec!(10_000)),
        };
        assert_eq!(classify_mode(ctx), IndexMode::Bear);
    }
}

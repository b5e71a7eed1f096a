//! Per-stream retention windows (§6.3). `None` means "indefinite", which
//! is the documented default for index values, RAY, constituents and
//! regime samples — only peg/liquidity metrics are trimmed by this store
//! (raw prices, APY sources and T-Bill rates live in adapter-owned rings
//! outside the Time-Series Store's scope, per §3's "Lifecycles").

use chrono::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub peg_metrics: Option<Duration>,
    pub liquidity_metrics: Option<Duration>,
    pub ray: Option<Duration>,
    pub index_values: Option<Duration>,
    pub regime: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            peg_metrics: Some(Duration::days(30)),
            liquidity_metrics: Some(Duration::days(180)),
            ray: None,
            index_values: None,
            regime: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_section_6_3() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.liquidity_metrics, Some(Duration::days(180)));
        assert_eq!(policy.peg_metrics, Some(Duration::days(30)));
        assert!(policy.ray.is_none());
        assert!(policy.index_values.is_none());
        assert!(policy.regime.is_none());
    }
}

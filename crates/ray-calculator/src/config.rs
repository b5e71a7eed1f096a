/// Defaults applied when a risk factor's value is unavailable for a cycle
/// (§4.4 "Defaults when a factor is missing"). Explicit configuration, not
/// bare literals buried in the formula.
#[derive(Debug, Clone, Copy)]
pub struct RayConfig {
    pub default_counterparty_score: f64,
    pub default_protocol_reputation: f64,
    pub default_temporal_stability: f64,
    /// Confidence assigned to a factor that fell back to its default, since
    /// a defaulted value is a documented guess, not an observation.
    pub missing_factor_confidence: f64,
}

impl Default for RayConfig {
    fn default() -> Self {
        Self {
            default_counterparty_score: 0.75,
            default_protocol_reputation: 0.70,
            default_temporal_stability: 0.80,
            missing_factor_confidence: 0.5,
        }
    }
}

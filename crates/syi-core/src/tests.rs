use super::*;

#[test]
fn risk_factors_clamp_out_of_range_inputs() {
    let factors = RiskFactors::new(1.5, -0.2, 0.5, 0.5, 0.5);
    assert_eq!(factors.peg_score, 1.0);
    assert_eq!(factors.liquidity_score, 0.0);
}

#[test]
fn risk_multiplier_is_one_when_all_factors_perfect() {
    let factors = RiskFactors::new(1.0, 1.0, 1.0, 1.0, 1.0);
    assert!((factors.risk_multiplier() - 1.0).abs() < 1e-9);
}

#[test]
fn risk_multiplier_matches_spec_scenario_two() {
    // product = 0.3024, sqrt ~= 0.5499
    let factors = RiskFactors::new(0.9, 0.8, 0.75, 0.70, 0.80);
    let multiplier = factors.risk_multiplier();
    assert!((multiplier - 0.549_909).abs() < 1e-4);
}

#[test]
fn adapter_error_kind_retryability() {
    assert!(AdapterErrorKind::Transient.is_retryable());
    assert!(AdapterErrorKind::RateLimited.is_retryable());
    assert!(!AdapterErrorKind::Auth.is_retryable());
    assert!(!AdapterErrorKind::Malformed.is_retryable());
    assert!(!AdapterErrorKind::Unavailable.is_retryable());
}

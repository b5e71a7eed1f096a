//! Normalize raw weights to sum to 1, then apply the §4.5 water-filling cap.

/// Normalizes `raw` to sum to 1 (all-zero input maps to a uniform split),
/// then repeatedly clips any weight above `cap` and redistributes the
/// excess proportionally across the still-uncapped weights, until nothing
/// exceeds the cap or every weight has settled at the cap.
pub fn normalize_with_cap(raw: &[f64], cap: f64) -> Vec<f64> {
    let n = raw.len();
    if n == 0 {
        return Vec::new();
    }

    let sum: f64 = raw.iter().sum();
    let mut weights: Vec<f64> = if sum > 0.0 {
        raw.iter().map(|w| w / sum).collect()
    } else {
        vec![1.0 / n as f64; n]
    };

    let mut capped = vec![false; n];
    loop {
        let mut excess = 0.0;
        for i in 0..n {
            if !capped[i] && weights[i] > cap {
                excess += weights[i] - cap;
                weights[i] = cap;
                capped[i] = true;
            }
        }
        if excess <= f64::EPSILON {
            break;
        }
        let uncapped_sum: f64 = (0..n).filter(|&i| !capped[i]).map(|i| weights[i]).sum();
        if uncapped_sum <= f64::EPSILON {
            break;
        }
        for i in 0..n {
            if !capped[i] {
                weights[i] += excess * (weights[i] / uncapped_sum);
            }
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_without_a_binding_cap() {
        let weights = normalize_with_cap(&[1.0, 1.0, 2.0], 1.0);
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn excess_over_cap_redistributes_to_uncapped_weights() {
        let weights = normalize_with_cap(&[0.8, 0.1, 0.1], 0.40);
        assert!((weights[0] - 0.40).abs() < 1e-9);
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(weights[1] > 0.1 && weights[2] > 0.1);
    }

    #[test]
    fn all_equal_weights_below_cap_are_untouched() {
        let weights = normalize_with_cap(&[1.0, 1.0, 1.0, 1.0], 0.40);
        for w in weights {
            assert!((w - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn uniform_fallback_when_all_raw_weights_are_zero() {
        let weights = normalize_with_cap(&[0.0, 0.0, 0.0], 0.40);
        for w in weights {
            assert!((w - 1.0 / 3.0).abs() < 1e-9);
        }
    }
}

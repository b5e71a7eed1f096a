//! Small robust-statistics helpers over plain `f64` samples. Guards against
//! zero-variance baselines so a tight cluster of identical samples never
//! produces a NaN/∞ score.

pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = pos - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Median absolute deviation and the sample's median, scaled by the usual
/// 1.4826 normal-consistency constant so it approximates a standard deviation.
pub fn mad_z_score(samples: &[f64], value: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let med = median(&sorted);
    let mut abs_devs: Vec<f64> = sorted.iter().map(|x| (x - med).abs()).collect();
    abs_devs.sort_by(|a, b| a.total_cmp(b));
    let mad = median(&abs_devs);

    if mad == 0.0 {
        return if value == med { 0.0 } else { f64::INFINITY };
    }
    (value - med).abs() / (1.4826 * mad)
}

/// Distance of `value` beyond the IQR fences, in units of IQR (0 if inside).
pub fn iqr_fence_distance(samples: &[f64], value: f64, multiplier: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;

    if iqr == 0.0 {
        return if value == q1 { 0.0 } else { f64::INFINITY };
    }
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;
    if value < lower {
        (lower - value) / iqr
    } else if value > upper {
        (value - upper) / iqr
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mad_z_score_is_zero_at_the_median() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mad_z_score(&samples, 3.0), 0.0);
    }

    #[test]
    fn mad_z_score_handles_zero_variance_cluster() {
        let samples = vec![1.0, 1.0, 1.0, 1.0];
        assert_eq!(mad_z_score(&samples, 1.0), 0.0);
        assert!(mad_z_score(&samples, 2.0).is_infinite());
    }

    #[test]
    fn iqr_fence_distance_is_zero_inside_fences() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(iqr_fence_distance(&samples, 4.5, 1.5), 0.0);
    }
}

//! Peg stability metrics (§4.2, peg half).

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use syi_core::{PegMetrics, PriceTick};

use crate::rings::PegRingStore;

/// Window within which a venue's price tick is considered current.
const PRICE_WINDOW: ChronoDuration = ChronoDuration::seconds(60);

/// Sample count backing `vol_5m_bps`, per §4.2's literal formula.
const VOL_SHORT_WINDOW: usize = 60;

/// Sample count backing `vol_1h_bps`; spans the full ring so it reacts to
/// drift the short window is too fast to catch. Not specified verbatim by
/// §4.2, which only gives the 5m formula; extended analogously.
const VOL_LONG_WINDOW: usize = 720;

/// Conservative default returned when a symbol has no usable price ticks.
pub fn default_peg_metrics(symbol: &str, window_end: DateTime<Utc>) -> PegMetrics {
    PegMetrics {
        symbol: symbol.to_string(),
        window_end,
        vw_price: Decimal::ONE,
        peg_dev_bps: 0.0,
        vol_5m_bps: 2.0,
        vol_1h_bps: 2.0,
        peg_score: 0.95,
    }
}

/// Volume-weighted price across the latest tick per venue within the
/// 60s window. Falls back to a simple mean when total volume is zero.
pub fn compute_vw_price(ticks: &[PriceTick], as_of: DateTime<Utc>) -> Option<Decimal> {
    let mut latest_per_venue: HashMap<&str, &PriceTick> = HashMap::new();
    for tick in ticks {
        if as_of - tick.observed_at > PRICE_WINDOW {
            continue;
        }
        latest_per_venue
            .entry(tick.venue.as_str())
            .and_modify(|existing| {
                if tick.observed_at > existing.observed_at {
                    *existing = tick;
                }
            })
            .or_insert(tick);
    }

    if latest_per_venue.is_empty() {
        return None;
    }

    let total_volume: Decimal = latest_per_venue.values().map(|t| t.volume_24h_usd).sum();
    if total_volume.is_zero() {
        let count = Decimal::from(latest_per_venue.len());
        let sum: Decimal = latest_per_venue.values().map(|t| t.price_usd).sum();
        return Some(sum / count);
    }

    let weighted_sum: Decimal = latest_per_venue.values().map(|t| t.price_usd * t.volume_24h_usd).sum();
    Some(weighted_sum / total_volume)
}

fn mean_abs_delta_bps(samples: &[Decimal]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let deltas: Vec<f64> = samples
        .windows(2)
        .map(|w| {
            let delta: Decimal = w[1] - w[0];
            delta.abs().to_string().parse::<f64>().unwrap_or(0.0)
        })
        .collect();
    let mean_abs = deltas.iter().sum::<f64>() / deltas.len() as f64;
    mean_abs * 10_000.0
}

/// Computes `PegMetrics` for one symbol, appending `vw_price` to its ring.
/// Returns the conservative default when there are no usable price ticks.
pub fn compute_peg_metrics(
    symbol: &str,
    ticks: &[PriceTick],
    rings: &PegRingStore,
    as_of: DateTime<Utc>,
) -> PegMetrics {
    let Some(vw_price) = compute_vw_price(ticks, as_of) else {
        return default_peg_metrics(symbol, as_of);
    };

    let tail_long = rings.push_and_tail(symbol, vw_price, VOL_LONG_WINDOW);
    let tail_short: Vec<Decimal> = tail_long.iter().rev().take(VOL_SHORT_WINDOW).rev().copied().collect();

    let peg_dev_bps = (vw_price - Decimal::ONE).to_string().parse::<f64>().unwrap_or(0.0) * 10_000.0;
    let vol_5m_bps = mean_abs_delta_bps(&tail_short);
    let vol_1h_bps = mean_abs_delta_bps(&tail_long);
    let peg_score = (1.0 - peg_dev_bps.abs() / 50.0 - vol_5m_bps / 100.0).clamp(0.0, 1.0);

    PegMetrics {
        symbol: symbol.to_string(),
        window_end: as_of,
        vw_price,
        peg_dev_bps,
        vol_5m_bps,
        vol_1h_bps,
        peg_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(venue: &str, price: Decimal, volume: Decimal, observed_at: DateTime<Utc>) -> PriceTick {
        PriceTick {
            symbol: "USDC".into(),
            venue: venue.into(),
            price_usd: price,
            volume_24h_usd: volume,
            observed_at,
        }
    }

    #[test]
    fn vw_price_falls_back_to_simple_mean_when_volume_is_zero() {
        let now = Utc::now();
        let ticks = vec![
            tick("a", dec!(0.999), dec!(0), now),
            tick("b", dec!(1.001), dec!(0), now),
        ];
        let price = compute_vw_price(&ticks, now).unwrap();
        assert_eq!(price, dec!(1.000));
    }

    #[test]
    fn vw_price_ignores_ticks_outside_window() {
        let now = Utc::now();
        let stale = tick("a", dec!(0.5), dec!(1000), now - ChronoDuration::seconds(120));
        let fresh = tick("b", dec!(1.0), dec!(1000), now);
        let price = compute_vw_price(&[stale, fresh], now).unwrap();
        assert_eq!(price, dec!(1.0));
    }

    #[test]
    fn missing_ticks_return_conservative_default() {
        let now = Utc::now();
        let rings = PegRingStore::new();
        let metrics = compute_peg_metrics("USDC", &[], &rings, now);
        assert_eq!(metrics.peg_score, 0.95);
        assert_eq!(metrics.vol_5m_bps, 2.0);
    }

    #[test]
    fn stable_peg_scores_near_one() {
        let rings = PegRingStore::new();
        let now = Utc::now();
        for i in 0..5 {
            let t = now + ChronoDuration::seconds(i);
            compute_peg_metrics("USDC", &[tick("a", dec!(1.000), dec!(1000), t)], &rings, t);
        }
        let metrics = compute_peg_metrics("USDC", &[tick("a", dec!(1.000), dec!(1000), now)], &rings, now);
        assert!(metrics.peg_score > 0.9);
    }
}

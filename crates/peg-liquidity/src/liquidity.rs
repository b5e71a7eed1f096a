//! Order-book depth metrics (§4.2, liquidity half).

use rust_decimal::Decimal;
use syi_core::{BookLevel, LiquidityMetrics, OrderBookSnapshot};

const DEPTH_10BPS_NORM: f64 = 10_000_000.0;
const DEPTH_20BPS_NORM: f64 = 25_000_000.0;

/// USD notional crossable within `threshold_bps` of the best price on one
/// side of the book, walking levels until the cumulative price impact
/// exceeds the threshold.
fn depth_to_bps(levels: &[BookLevel], best: Decimal, threshold_bps: i64) -> Decimal {
    if best.is_zero() {
        return Decimal::ZERO;
    }
    let mut notional = Decimal::ZERO;
    for level in levels {
        let impact_bps = ((level.price - best).abs() / best * Decimal::from(10_000)).round();
        if impact_bps > Decimal::from(threshold_bps) {
            break;
        }
        notional += level.price * level.size;
    }
    notional
}

fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Computes `LiquidityMetrics` for one symbol from a set of per-venue order
/// book snapshots. A venue with an empty book half contributes 0 depth on
/// that side and is excluded from the average spread.
pub fn compute_liquidity_metrics(symbol: &str, books: &[OrderBookSnapshot], window_end: chrono::DateTime<chrono::Utc>) -> LiquidityMetrics {
    let mut depth_10bps_usd = Decimal::ZERO;
    let mut depth_20bps_usd = Decimal::ZERO;
    let mut depth_50bps_usd = Decimal::ZERO;
    let mut spreads_bps: Vec<f64> = Vec::new();

    for book in books {
        let best_bid = book.bids.first().map(|l| l.price);
        let best_ask = book.asks.first().map(|l| l.price);

        if let Some(bid) = best_bid {
            depth_10bps_usd += depth_to_bps(&book.bids, bid, 10);
            depth_20bps_usd += depth_to_bps(&book.bids, bid, 20);
            depth_50bps_usd += depth_to_bps(&book.bids, bid, 50);
        }
        if let Some(ask) = best_ask {
            depth_10bps_usd += depth_to_bps(&book.asks, ask, 10);
            depth_20bps_usd += depth_to_bps(&book.asks, ask, 20);
            depth_50bps_usd += depth_to_bps(&book.asks, ask, 50);
        }

        if let (Some(bid), Some(ask)) = (best_bid, best_ask) {
            let mid = (bid + ask) / Decimal::from(2);
            if !mid.is_zero() {
                let spread_bps = decimal_to_f64((ask - bid) / mid * Decimal::from(10_000));
                spreads_bps.push(spread_bps);
            }
        }
        // single-sided books leave avg_spread_bps undefined for this venue; skipped above.
    }

    let avg_spread_bps = if spreads_bps.is_empty() {
        f64::INFINITY
    } else {
        spreads_bps.iter().sum::<f64>() / spreads_bps.len() as f64
    };

    let depth_10_f = decimal_to_f64(depth_10bps_usd);
    let depth_20_f = decimal_to_f64(depth_20bps_usd);
    let spread_penalty = if avg_spread_bps.is_infinite() {
        0.0
    } else {
        1.0 / (1.0 + avg_spread_bps / 5.0)
    };

    let liq_score = 0.4 * (depth_10_f / DEPTH_10BPS_NORM).min(1.0)
        + 0.4 * (depth_20_f / DEPTH_20BPS_NORM).min(1.0)
        + 0.2 * spread_penalty.min(1.0);

    LiquidityMetrics {
        symbol: symbol.to_string(),
        window_end,
        depth_10bps_usd,
        depth_20bps_usd,
        depth_50bps_usd,
        avg_spread_bps,
        venues_covered: books.len() as u32,
        liq_score: liq_score.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, size: Decimal) -> BookLevel {
        BookLevel { price, size }
    }

    #[test]
    fn single_sided_book_has_zero_depth_on_missing_side() {
        let book = OrderBookSnapshot {
            symbol: "USDC".into(),
            venue: "a".into(),
            bids: vec![level(dec!(1.000), dec!(1_000_000))],
            asks: vec![],
            observed_at: Utc::now(),
        };
        let metrics = compute_liquidity_metrics("USDC", &[book], Utc::now());
        assert!(metrics.depth_10bps_usd > Decimal::ZERO);
        assert!(metrics.avg_spread_bps.is_infinite());
    }

    #[test]
    fn tight_book_scores_well() {
        let book = OrderBookSnapshot {
            symbol: "USDC".into(),
            venue: "a".into(),
            bids: vec![level(dec!(0.9999), dec!(20_000_000))],
            asks: vec![level(dec!(1.0001), dec!(20_000_000))],
            observed_at: Utc::now(),
        };
        let metrics = compute_liquidity_metrics("USDC", &[book], Utc::now());
        assert!(metrics.liq_score > 0.8);
    }

    #[test]
    fn empty_books_score_zero() {
        let metrics = compute_liquidity_metrics("USDC", &[], Utc::now());
        assert_eq!(metrics.liq_score, 0.0);
        assert_eq!(metrics.venues_covered, 0);
    }
}

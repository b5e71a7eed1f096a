//! The daily regime tick (§4.6, §4.7): reads one day's worth of store
//! state, builds a `RegimeDayInput`, and runs it through the index's
//! `RegimeEngine`. Cadence and hour/minute are independent of the
//! minute-level pipeline cycle.

use std::sync::Arc;

use chrono::Utc;
use regime_engine::RegimeEngine;
use syi_core::{EngineError, IndexCode, PegStatus, RegimeComponent, RegimeDayInput, SourceAdapter};
use timeseries_store::Store;
use tracing::{info, warn};

/// Tries every adapter in turn until one answers the 3-month T-Bill rate;
/// no adapter is expected to be authoritative, so the first success wins.
async fn fetch_tbill_3m(adapters: &[Arc<dyn SourceAdapter>]) -> Option<f64> {
    for adapter in adapters {
        if let Ok(rate) = adapter.fetch_tbill_rate().await {
            if rate.tenor == "3M" {
                return rate.rate.to_string().parse::<f64>().ok();
            }
        }
    }
    None
}

fn peg_status_from_store(store: &Store, symbols: &[String], as_of: chrono::DateTime<Utc>) -> Option<PegStatus> {
    if symbols.is_empty() {
        return None;
    }
    let mut max_depeg_bps: i64 = 0;
    let mut agg_depeg_bps: i64 = 0;
    let mut any = false;
    for symbol in symbols {
        if let Some(metrics) = store.latest_peg_metrics(symbol) {
            if (as_of - metrics.window_end) < chrono::Duration::hours(6) {
                any = true;
                let dev = metrics.peg_dev_bps.round() as i64;
                max_depeg_bps = max_depeg_bps.max(dev.abs());
                agg_depeg_bps += dev.abs();
            }
        }
    }
    any.then_some(PegStatus { max_depeg_bps, agg_depeg_bps })
}

/// Runs one index code's daily regime tick and appends the resulting
/// `RegimeSample` to `store`. The caller owns the long-lived per-index-code
/// `RegimeEngine` (it carries multi-day EMA state) and must pass the same
/// instance in every day — constructing a fresh one each tick would reset
/// that history.
pub async fn run_regime_cycle(
    index_code: IndexCode,
    adapters: &[Arc<dyn SourceAdapter>],
    store: &Store,
    engine: &mut RegimeEngine,
) -> Result<(), EngineError> {
    let now = Utc::now();
    let today = now.date_naive();

    let latest_index = store
        .latest_index_value(index_code)
        .ok_or_else(|| EngineError::ValidationError("no index value available for regime tick".into()))?;
    let syi = latest_index.value.to_string().parse::<f64>().unwrap_or(0.0);

    let tbill_3m = fetch_tbill_3m(adapters).await.unwrap_or(0.0);

    let components: Vec<RegimeComponent> = latest_index
        .constituents
        .iter()
        .map(|c| RegimeComponent {
            symbol: c.symbol.clone(),
            ray: c.ray.to_string().parse::<f64>().unwrap_or(0.0),
        })
        .collect();

    let symbols: Vec<String> = latest_index.constituents.iter().map(|c| c.symbol.clone()).collect();
    let peg_status = peg_status_from_store(store, &symbols, now);

    let input = RegimeDayInput {
        date: today,
        syi,
        tbill_3m,
        components,
        peg_status,
    };

    info!(%index_code, date = %today, syi, tbill_3m, "running daily regime tick");
    let sample = engine.evaluate(&input);
    if let Some(alert) = &sample.alert {
        warn!(%index_code, ?alert, "regime alert raised");
    }
    store.append_regime_sample(index_code, sample)
}

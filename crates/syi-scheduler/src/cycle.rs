//! One minute-level pipeline cycle: A → (B, C) → D → E → H (§5).
//!
//! Pure computation (peg/liquidity, sanitizer, RAY, composition) runs
//! synchronously on the calling task once I/O has completed, per §5's
//! "these stages are pure functions over their inputs plus in-memory
//! rings." Only the adapter fan-out and the store appends touch the
//! outside world.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use peg_liquidity::{compute_liquidity_metrics, compute_peg_metrics, PegRingStore};
use ray_calculator::{compute_ray, FactorInput};
use rust_decimal::Decimal;
use source_adapters::fan_out_yields;
use syi_compositor::{compose, normal_mode_context, Candidate};
use syi_core::{
    AdapterError, EngineError, IndexCode, IndexValue, MarketCap, OrderBookSnapshot, PriceTick, RawYieldSample,
    SanitizationAction, SourceAdapter,
};
use timeseries_store::Store;
use tracing::{debug, info, warn};
use yield_sanitizer::{sanitize, SanitizerInput};

use crate::config::EngineConfig;

/// What one cycle produced, independent of whether composition succeeded —
/// the scheduler logs and serves this even when `index_value` is `Err`
/// (§7: "either the value reflects the available constituents ... or no
/// new value is emitted", never a silently altered one).
pub struct CycleReport {
    pub cycle_id: DateTime<Utc>,
    pub sources_attempted: usize,
    pub sources_failed: usize,
    pub samples_ingested: usize,
    pub index_value: Result<IndexValue, EngineError>,
}

/// Concurrently calls `fetch_prices`/`fetch_order_books` on every adapter
/// that supports them, bounded by the same per-source timeout as the yield
/// fan-out. A lighter-weight sibling of `source_adapters::fan_out_yields`
/// for the two map-shaped fetches, which don't fit that helper's signature.
async fn fan_out_maps<T, F, Fut>(adapters: &[Arc<dyn SourceAdapter>], symbols: &[String], timeout: Duration, call: F) -> HashMap<String, Vec<T>>
where
    F: Fn(Arc<dyn SourceAdapter>, Vec<String>) -> Fut,
    Fut: std::future::Future<Output = Result<HashMap<String, T>, AdapterError>>,
{
    let futures = adapters.iter().map(|adapter| {
        let adapter = Arc::clone(adapter);
        let symbols = symbols.to_vec();
        let fut = call(adapter, symbols);
        async move { tokio::time::timeout(timeout, fut).await }
    });

    let mut merged: HashMap<String, Vec<T>> = HashMap::new();
    for result in futures_util::future::join_all(futures).await {
        if let Ok(Ok(by_symbol)) = result {
            for (symbol, value) in by_symbol {
                merged.entry(symbol).or_default().push(value);
            }
        }
    }
    merged
}

fn sample_age(observed_at: DateTime<Utc>, as_of: DateTime<Utc>) -> chrono::Duration {
    (as_of - observed_at).max(chrono::Duration::zero())
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Runs one full cycle for `index_code` against `adapters`, appending every
/// derived record to `store`. Returns the cycle's `IndexValue` result
/// without panicking on partial adapter failure (§5 "a failed source MUST
/// NOT fail the cycle") — only `InsufficientConstituents` or a deadline
/// overrun prevents a new published value.
pub async fn run_cycle(
    index_code: IndexCode,
    adapters: &[Arc<dyn SourceAdapter>],
    peg_rings: &PegRingStore,
    store: &Store,
    config: &EngineConfig,
) -> CycleReport {
    let cycle_id = Utc::now();
    let deadline = config.scheduler.cycle_deadline;

    let outcome = tokio::time::timeout(deadline, run_cycle_inner(index_code, adapters, peg_rings, store, config, cycle_id)).await;

    match outcome {
        Ok(report) => report,
        Err(_) => {
            warn!(%index_code, "cycle deadline exceeded before constituents were produced");
            CycleReport {
                cycle_id,
                sources_attempted: adapters.len(),
                sources_failed: adapters.len(),
                samples_ingested: 0,
                index_value: Err(EngineError::DeadlineExceeded),
            }
        }
    }
}

async fn run_cycle_inner(
    index_code: IndexCode,
    adapters: &[Arc<dyn SourceAdapter>],
    peg_rings: &PegRingStore,
    store: &Store,
    config: &EngineConfig,
    cycle_id: DateTime<Utc>,
) -> CycleReport {
    // 1. Fan out to every adapter's `fetch_yields`, bounded per source kind.
    let yield_results = fan_out_yields(adapters, config.scheduler.per_source_kind_concurrency, config.scheduler.per_source_timeout).await;

    let mut samples: Vec<RawYieldSample> = Vec::new();
    let mut sources_failed = 0usize;
    for result in yield_results {
        match result {
            Ok(mut batch) => samples.append(&mut batch),
            Err(err) => {
                sources_failed += 1;
                warn!(source_id = %err.source_id, kind = ?err.kind, "source unavailable this cycle: {}", err.message);
            }
        }
    }

    let symbols: Vec<String> = {
        let mut s: Vec<String> = samples.iter().map(|r| r.symbol.clone()).collect();
        s.sort();
        s.dedup();
        s
    };

    // Prices and order books feed peg/liquidity metrics; adapters that
    // don't support them simply answer UNAVAILABLE and are skipped.
    let prices: HashMap<String, Vec<PriceTick>> =
        fan_out_maps(adapters, &symbols, config.scheduler.per_source_timeout, |a, syms| async move { a.fetch_prices(&syms).await }).await;

    let books: HashMap<String, Vec<OrderBookSnapshot>> = {
        let mut merged: HashMap<String, Vec<OrderBookSnapshot>> = HashMap::new();
        let raw = fan_out_maps(adapters, &symbols, config.scheduler.per_source_timeout, |a, syms| async move { a.fetch_order_books(&syms).await }).await;
        for (symbol, snapshots_per_adapter) in raw {
            for snapshots in snapshots_per_adapter {
                merged.entry(symbol.clone()).or_default().extend(snapshots);
            }
        }
        merged
    };

    // Circulating market caps feed the MARKET_CAP weighting scheme (§4.5);
    // adapters without a market-cap feed simply answer UNAVAILABLE.
    let market_caps: HashMap<String, Vec<MarketCap>> =
        fan_out_maps(adapters, &symbols, config.scheduler.per_source_timeout, |a, syms| async move { a.fetch_market_caps(&syms).await }).await;
    let market_cap_by_symbol: HashMap<String, Decimal> = market_caps
        .into_iter()
        .filter_map(|(symbol, caps)| caps.into_iter().map(|c| c.market_cap_usd).max().map(|cap| (symbol, cap)))
        .collect();

    // 2. Peg & liquidity metrics per symbol (§4.2), then 3. sanitize +
    // 4. RAY per sample (§4.3, §4.4), assembling compositor candidates.
    let mut candidates = Vec::with_capacity(samples.len());
    for sample in &samples {
        let ticks = prices.get(&sample.symbol).map(|v| v.as_slice()).unwrap_or(&[]);
        let peg_metrics = compute_peg_metrics(&sample.symbol, ticks, peg_rings, cycle_id);
        if let Err(e) = store.append_peg_metrics(peg_metrics.clone()) {
            debug!(symbol = %sample.symbol, "peg metrics append skipped: {e}");
        }

        let book_snapshots = books.get(&sample.symbol).map(|v| v.as_slice()).unwrap_or(&[]);
        let liquidity_metrics = compute_liquidity_metrics(&sample.symbol, book_snapshots, cycle_id);
        if let Err(e) = store.append_liquidity_metrics(liquidity_metrics.clone()) {
            debug!(symbol = %sample.symbol, "liquidity metrics append skipped: {e}");
        }

        let comparable: Vec<Decimal> = samples
            .iter()
            .filter(|other| other.symbol == sample.symbol && other.source_kind == sample.source_kind)
            .map(|other| other.apy_total)
            .collect();
        let all_samples: Vec<Decimal> = samples.iter().map(|s| s.apy_total).collect();

        let sanitizer_input = SanitizerInput {
            apy_total: sample.apy_total,
            apy_base: sample.apy_base,
            apy_reward: sample.apy_reward,
            borrow_apy: sample.borrow_apy,
            comparable_samples: comparable,
            all_samples,
        };
        let sanitization = sanitize(&sanitizer_input, &config.sanitizer);

        let peg_confidence = if ticks.is_empty() { config.ray.missing_factor_confidence } else { 0.95 };
        let liq_confidence = if book_snapshots.is_empty() { config.ray.missing_factor_confidence } else { 0.95 };

        let (record, warnings) = compute_ray(
            &sample.symbol,
            &sample.source_id,
            sanitization.sanitized_apy,
            FactorInput::observed(peg_metrics.peg_score, peg_confidence),
            FactorInput::observed(liquidity_metrics.liq_score, liq_confidence),
            FactorInput::missing(),
            FactorInput::missing(),
            FactorInput::missing(),
            sanitization.confidence,
            &config.ray,
            cycle_id,
        );
        for w in &warnings {
            debug!(symbol = %sample.symbol, source_id = %sample.source_id, "ray warning: {w}");
        }

        if let Err(e) = store.append_ray(record.clone()) {
            debug!(symbol = %sample.symbol, "ray append skipped: {e}");
        }

        if sanitization.action == SanitizationAction::Reject {
            continue;
        }

        let ray_stddev_30 = {
            // §4.5 EQUAL_RISK weighting: 1/σ of RAY over the last 30
            // *samples*, not a fixed calendar window.
            let history = store.ray_last_n_for_source(&sample.symbol, &sample.source_id, 30);
            let rays: Vec<f64> = history.iter().map(|r| r.ray.to_string().parse::<f64>().unwrap_or(0.0)).collect();
            let sigma = std_dev(&rays);
            if sigma > 0.0 {
                Some(sigma)
            } else {
                None
            }
        };

        candidates.push(Candidate {
            symbol: sample.symbol.clone(),
            source_id: sample.source_id.clone(),
            chain: sample.chain.clone(),
            pool_id: sample.pool_id.clone(),
            protocol: None,
            record,
            sanitization_action: sanitization.action,
            sample_age: sample_age(sample.observed_at, cycle_id),
            market_cap_usd: market_cap_by_symbol.get(&sample.symbol).copied(),
            capacity_usd: None,
            tvl_usd: sample.tvl_usd,
            operational_days: None,
            ray_stddev_30,
            vol_7d: None,
            vol_30d: None,
        });
    }

    // 5. Compose and append (§4.5, §4.8).
    let compositor_config = config.compositor_config(index_code);
    let index_value = compose(index_code, candidates, compositor_config, normal_mode_context(), cycle_id);

    let index_value = match index_value {
        Ok(value) => {
            if let Err(e) = store.append_index_value(value.clone()) {
                warn!(%index_code, "index value append rejected: {e}");
                Err(e)
            } else {
                info!(%index_code, value = %value.value, constituents = value.constituent_count, "published index value");
                Ok(value)
            }
        }
        Err(e) => {
            warn!(%index_code, "cycle produced no new index value: {e}");
            Err(e)
        }
    };

    CycleReport {
        cycle_id,
        sources_attempted: adapters.len(),
        sources_failed,
        samples_ingested: samples.len(),
        index_value,
    }
}

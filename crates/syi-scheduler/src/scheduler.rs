//! The minute-level driver loop (§4.7): a `tokio::time::interval` fires one
//! cycle per enabled index code, plus a daily regime tick, until SIGINT or
//! SIGTERM arrives.

use std::sync::Arc;

use chrono::{Timelike, Utc};
use dashmap::DashMap;
use peg_liquidity::PegRingStore;
use regime_engine::RegimeEngine;
use syi_core::{Clock, IndexCode, SourceAdapter, SystemClock};
use timeseries_store::Store;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::cycle::run_cycle;
use crate::regime_cycle::run_regime_cycle;
use crate::status::SchedulerStatus;

/// Owns every long-lived piece of state the scheduler loop touches: the
/// adapter set, the peg-price rings, the store, and one status record per
/// index code for the §6.2 status query.
pub struct Scheduler {
    index_codes: Vec<IndexCode>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    store: Arc<Store>,
    peg_rings: Arc<PegRingStore>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    status: DashMap<IndexCode, SchedulerStatus>,
    /// Per-index-code lock so a manual "force recompute" request joins an
    /// in-flight cycle instead of racing it.
    in_flight: DashMap<IndexCode, Arc<Mutex<()>>>,
    /// One long-lived `RegimeEngine` per index code; it carries multi-day
    /// EMA/hysteresis state that must survive across daily ticks.
    regime_engines: DashMap<IndexCode, Mutex<RegimeEngine>>,
}

impl Scheduler {
    pub fn new(index_codes: Vec<IndexCode>, adapters: Vec<Arc<dyn SourceAdapter>>, store: Arc<Store>, config: EngineConfig) -> Self {
        let in_flight = DashMap::new();
        let regime_engines = DashMap::new();
        for code in &index_codes {
            in_flight.insert(*code, Arc::new(Mutex::new(())));
            regime_engines.insert(*code, Mutex::new(RegimeEngine::new(config.regime.clone())));
        }
        Self {
            index_codes,
            adapters,
            store,
            peg_rings: Arc::new(PegRingStore::new()),
            config,
            clock: Arc::new(SystemClock),
            status: DashMap::new(),
            in_flight,
            regime_engines,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self, code: IndexCode) -> Option<SchedulerStatus> {
        self.status.get(&code).map(|s| s.clone())
    }

    /// Runs one cycle for `code`, serialized against any concurrently
    /// running cycle for the same code.
    pub async fn run_one(&self, code: IndexCode) {
        let lock = self
            .in_flight
            .entry(code)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let report = run_cycle(code, &self.adapters, &self.peg_rings, &self.store, &self.config).await;
        let now = self.clock.now();
        let mut entry = self.status.entry(code).or_insert_with(SchedulerStatus::default);
        entry.last_run = Some(now);
        match &report.index_value {
            Ok(_) => entry.last_success = Some(now),
            Err(_) => entry.last_failure = Some(now),
        }
        entry.last_sources_attempted = report.sources_attempted;
        entry.last_sources_failed = report.sources_failed;
        entry.last_samples_ingested = report.samples_ingested;
        entry.next_run = Some(now + chrono::Duration::from_std(self.config.scheduler.cycle_interval).unwrap_or_default());
    }

    async fn run_regime_tick(&self) {
        for code in &self.index_codes {
            let Some(engine_lock) = self.regime_engines.get(code) else {
                continue;
            };
            let mut engine = engine_lock.lock().await;
            if let Err(e) = run_regime_cycle(*code, &self.adapters, &self.store, &mut engine).await {
                warn!(%code, "daily regime tick failed: {e}");
            }
        }
    }

    /// Runs the scheduler loop until SIGINT/SIGTERM. One tick runs every
    /// enabled index code's cycle concurrently, then checks whether the
    /// daily regime tick's minute has arrived.
    pub async fn run(&self) {
        let mut interval = time::interval(self.config.scheduler.cycle_interval);
        let mut last_regime_tick_date = None;

        #[cfg(unix)]
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to install SIGTERM handler");

        let shutdown = async {
            #[cfg(unix)]
            {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => { info!("received SIGINT"); }
                    _ = sigterm.recv() => { info!("received SIGTERM"); }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
                info!("received ctrl-c");
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let futures = self.index_codes.iter().map(|code| self.run_one(*code));
                    futures_util::future::join_all(futures).await;

                    let now = Utc::now();
                    let due = now.time().hour() == self.config.scheduler.regime_tick_hour_utc
                        && now.time().minute() == self.config.scheduler.regime_tick_minute_utc;
                    if due && last_regime_tick_date != Some(now.date_naive()) {
                        self.run_regime_tick().await;
                        last_regime_tick_date = Some(now.date_naive());
                    }
                }
                _ = &mut shutdown => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use syi_core::{AdapterCapability, AdapterIdentity, AdapterError, RawYieldSample, SourceKind};

    struct EmptyAdapter;

    #[async_trait]
    impl SourceAdapter for EmptyAdapter {
        fn identity(&self) -> AdapterIdentity {
            AdapterIdentity {
                source_id: "empty".into(),
                source_kind: SourceKind::Cefi,
                capabilities: vec![AdapterCapability::Yields],
            }
        }

        async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn run_one_records_a_failure_status_when_no_constituents_survive() {
        let store = Arc::new(Store::new());
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(EmptyAdapter)];
        let scheduler = Scheduler::new(vec![IndexCode::Syi], adapters, store, EngineConfig::default());
        scheduler.run_one(IndexCode::Syi).await;
        let status = scheduler.status(IndexCode::Syi).unwrap();
        assert!(status.last_failure.is_some());
        assert!(status.last_success.is_none());
    }
}

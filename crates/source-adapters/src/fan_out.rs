//! Bounded concurrent fan-out across enabled adapters (§5 concurrency model).
//!
//! Each adapter call is bounded by a per-source-kind semaphore (default 8)
//! and a per-call deadline. A failing adapter never fails the whole batch:
//! its error is collected alongside the successes of the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use syi_core::{AdapterError, AdapterErrorKind, RawYieldSample, SourceAdapter, SourceKind};
use tokio::sync::Semaphore;

/// Default concurrency cap applied per source kind during a fan-out call.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Per-call deadline applied to each adapter invocation within a fan-out.
pub const DEFAULT_PER_SOURCE_TIMEOUT: Duration = Duration::from_secs(8);

/// Runs `fetch_yields` against every adapter concurrently, bounded by
/// `concurrency` in flight at once *per source kind* (a CeFi adapter never
/// steals a permit from a DeFi adapter's pool, or vice versa), each call
/// bounded by `per_source_timeout`. Returns one result per adapter in the
/// same order they were given.
pub async fn fan_out_yields(
    adapters: &[Arc<dyn SourceAdapter>],
    concurrency: usize,
    per_source_timeout: Duration,
) -> Vec<Result<Vec<RawYieldSample>, AdapterError>> {
    let mut semaphores: HashMap<SourceKind, Arc<Semaphore>> = HashMap::new();
    for adapter in adapters {
        semaphores
            .entry(adapter.identity().source_kind)
            .or_insert_with(|| Arc::new(Semaphore::new(concurrency.max(1))));
    }

    let futures = adapters.iter().map(|adapter| {
        let adapter = Arc::clone(adapter);
        let semaphore = Arc::clone(&semaphores[&adapter.identity().source_kind]);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            let source_id = adapter.identity().source_id;
            match tokio::time::timeout(per_source_timeout, adapter.fetch_yields()).await {
                Ok(result) => result,
                Err(_) => Err(AdapterError::new(
                    source_id,
                    AdapterErrorKind::Transient,
                    format!("timed out after {:?}", per_source_timeout),
                )),
            }
        }
    });

    futures_util::future::join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use syi_core::{AdapterCapability, AdapterIdentity, SourceKind};

    struct SlowAdapter {
        source_id: String,
        delay: Duration,
        kind: SourceKind,
    }

    impl SlowAdapter {
        fn cefi(source_id: &str, delay: Duration) -> Self {
            Self {
                source_id: source_id.into(),
                delay,
                kind: SourceKind::Cefi,
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for SlowAdapter {
        fn identity(&self) -> AdapterIdentity {
            AdapterIdentity {
                source_id: self.source_id.clone(),
                source_kind: self.kind,
                capabilities: vec![AdapterCapability::Yields],
            }
        }

        async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![])
        }
    }

    struct FailingAdapter {
        source_id: String,
    }

    #[async_trait]
    impl SourceAdapter for FailingAdapter {
        fn identity(&self) -> AdapterIdentity {
            AdapterIdentity {
                source_id: self.source_id.clone(),
                source_kind: SourceKind::Cefi,
                capabilities: vec![AdapterCapability::Yields],
            }
        }

        async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
            Err(AdapterError::new(self.source_id.clone(), AdapterErrorKind::Unavailable, "down"))
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_sink_the_batch() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(FailingAdapter { source_id: "a".into() }),
            Arc::new(SlowAdapter::cefi("b", Duration::from_millis(1))),
        ];
        let results = fan_out_yields(&adapters, DEFAULT_CONCURRENCY, DEFAULT_PER_SOURCE_TIMEOUT).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn slow_adapter_times_out_without_blocking_others() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(SlowAdapter::cefi("slow", Duration::from_secs(5))),
            Arc::new(SlowAdapter::cefi("fast", Duration::from_millis(1))),
        ];
        let results = fan_out_yields(&adapters, DEFAULT_CONCURRENCY, Duration::from_millis(20)).await;
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn cefi_and_defi_draw_from_separate_concurrency_pools() {
        // concurrency = 1: two CeFi adapters must serialize against each
        // other, but a DeFi adapter must not wait behind either of them.
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(SlowAdapter::cefi("cefi-a", Duration::from_millis(200))),
            Arc::new(SlowAdapter::cefi("cefi-b", Duration::from_millis(200))),
            Arc::new(SlowAdapter {
                source_id: "defi-a".into(),
                delay: Duration::from_millis(1),
                kind: SourceKind::Defi,
            }),
        ];
        let results = fan_out_yields(&adapters, 1, Duration::from_millis(50)).await;
        assert!(results[0].is_err(), "second cefi adapter should have timed out waiting on the shared cefi permit");
        assert!(results[2].is_ok(), "defi adapter must not be blocked by the cefi pool");
    }
}

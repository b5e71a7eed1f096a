//! Generic append-only, natural-key-partitioned time series (§4.8, §4.3 of
//! the data model's "Ownership" rule: the store exclusively owns every
//! persisted record, callers only ever see copies).
//!
//! Every concrete stream (`IndexValue`, `RAYRecord`, `PegMetrics`, ...)
//! wraps one of these, keyed by its own natural key and timestamp type, so
//! the monotonicity rule (§3 "Temporal ordering") is enforced exactly once
//! instead of once per stream.

use std::collections::HashMap;
use std::fmt::Display;

use parking_lot::RwLock;
use syi_core::EngineError;

/// One append-only series per natural key, each strictly increasing in its
/// timestamp. `Ts` is `DateTime<Utc>` for most streams and `NaiveDate` for
/// the regime stream.
#[derive(Debug)]
pub(crate) struct Partitioned<Ts, V> {
    inner: RwLock<HashMap<String, Vec<(Ts, V)>>>,
}

impl<Ts, V> Default for Partitioned<Ts, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<Ts, V> Partitioned<Ts, V>
where
    Ts: Ord + Copy + Display,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` under `key` at `ts`. Rejects (without mutating) if
    /// `ts` is not strictly greater than the last stored timestamp for this
    /// key — the §3/§8 monotonicity invariant.
    pub fn append(&self, key: &str, ts: Ts, value: V) -> Result<(), EngineError> {
        let mut guard = self.inner.write();
        let entries = guard.entry(key.to_string()).or_default();
        if let Some((last_ts, _)) = entries.last() {
            if ts <= *last_ts {
                return Err(EngineError::StoreConflict {
                    key: format!("{key}@{ts}"),
                });
            }
        }
        entries.push((ts, value));
        Ok(())
    }

    pub fn latest(&self, key: &str) -> Option<V> {
        self.inner.read().get(key).and_then(|e| e.last()).map(|(_, v)| v.clone())
    }

    /// Closed-interval `[from, to]` range, oldest first.
    pub fn range(&self, key: &str, from: Ts, to: Ts) -> Vec<(Ts, V)> {
        self.inner
            .read()
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(ts, _)| *ts >= from && *ts <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All entries for a key, oldest first. Used by range queries that
    /// aggregate across several stored symbols/keys under one prefix.
    pub fn all(&self, key: &str) -> Vec<(Ts, V)> {
        self.inner.read().get(key).cloned().unwrap_or_default()
    }

    /// The last `n` entries for a key, oldest first — a count-bounded
    /// window rather than a time-bounded one, for callers that need "the
    /// last N samples" regardless of how much wall-clock time they span.
    pub fn last_n(&self, key: &str, n: usize) -> Vec<(Ts, V)> {
        self.inner
            .read()
            .get(key)
            .map(|entries| {
                let start = entries.len().saturating_sub(n);
                entries[start..].to_vec()
            })
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Drops entries with `ts < cutoff` for every key. Used by the
    /// retention pass (§6.3); a no-op for streams retained indefinitely.
    pub fn trim_before(&self, cutoff: Ts) {
        let mut guard = self.inner.write();
        for entries in guard.values_mut() {
            entries.retain(|(ts, _)| *ts >= cutoff);
        }
    }

    pub fn len(&self, key: &str) -> usize {
        self.inner.read().get(key).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    #[test]
    fn append_rejects_non_increasing_timestamps() {
        let series: Partitioned<DateTime<Utc>, i32> = Partitioned::new();
        let t0 = Utc::now();
        series.append("SYI", t0, 1).unwrap();
        let err = series.append("SYI", t0, 2).unwrap_err();
        assert!(matches!(err, EngineError::StoreConflict { .. }));
        assert_eq!(series.latest("SYI"), Some(1));
    }

    #[test]
    fn range_is_closed_on_both_ends() {
        let series: Partitioned<DateTime<Utc>, i32> = Partitioned::new();
        let t0 = Utc::now();
        for i in 0..5 {
            series.append("SYI", t0 + Duration::seconds(i), i as i32).unwrap();
        }
        let r = series.range("SYI", t0, t0 + Duration::seconds(4));
        assert_eq!(r.len(), 5);
    }

    #[test]
    fn trim_before_drops_older_entries_per_key() {
        let series: Partitioned<DateTime<Utc>, i32> = Partitioned::new();
        let t0 = Utc::now();
        for i in 0..5 {
            series.append("USDC", t0 + Duration::seconds(i), i as i32).unwrap();
        }
        series.trim_before(t0 + Duration::seconds(3));
        assert_eq!(series.len("USDC"), 2);
    }
}

//! `IndexValue` stream: append, latest, downsampled range, statistics (§4.8).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use syi_core::{EngineError, IndexCode, IndexValue};

use crate::series::Partitioned;

/// A range query result, carrying the bucket width actually used so
/// callers can tell a downsampled series from a raw one (§6.2). Bucket
/// width is serialized as whole seconds for the query API.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRangeResult {
    pub points: Vec<IndexValue>,
    #[serde(serialize_with = "serialize_bucket_width")]
    pub bucket_width: Option<chrono::Duration>,
}

fn serialize_bucket_width<S: serde::Serializer>(value: &Option<chrono::Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(&value.map(|d| d.num_seconds()), serializer)
}

/// Basic descriptive statistics over an `IndexValue` stream's `value` field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub range: f64,
}

#[derive(Debug, Default)]
pub struct IndexStore {
    series: Partitioned<DateTime<Utc>, IndexValue>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, value: IndexValue) -> Result<(), EngineError> {
        let key = value.index_code.as_str();
        self.series.append(key, value.observed_at, value)
    }

    pub fn latest(&self, code: IndexCode) -> Option<IndexValue> {
        self.series.latest(code.as_str())
    }

    /// Closed-interval `[from, to]`, bucketed to at most `max_points` when
    /// the raw count exceeds it: mean of `value`, last-of for categorical
    /// fields (§4.8).
    pub fn range(&self, code: IndexCode, from: DateTime<Utc>, to: DateTime<Utc>, max_points: Option<usize>) -> IndexRangeResult {
        let raw = self.series.range(code.as_str(), from, to);
        let raw_values: Vec<IndexValue> = raw.into_iter().map(|(_, v)| v).collect();

        let Some(max_points) = max_points else {
            return IndexRangeResult {
                points: raw_values,
                bucket_width: None,
            };
        };
        if max_points == 0 || raw_values.len() <= max_points {
            return IndexRangeResult {
                points: raw_values,
                bucket_width: None,
            };
        }

        let span = (to - from).max(chrono::Duration::milliseconds(1));
        let bucket_width = span / max_points as i32;
        let mut buckets: Vec<Vec<IndexValue>> = vec![Vec::new(); max_points];
        for v in raw_values {
            let offset = v.observed_at - from;
            let idx = (offset.num_milliseconds() / bucket_width.num_milliseconds().max(1)) as usize;
            buckets[idx.min(max_points - 1)].push(v);
        }

        let points = buckets
            .into_iter()
            .filter(|b| !b.is_empty())
            .map(downsample_bucket)
            .collect();

        IndexRangeResult {
            points,
            bucket_width: Some(bucket_width),
        }
    }

    /// Statistics over the last `days` days, computed directly from the raw
    /// (non-downsampled) series so it agrees with `range(.., None)` per the
    /// §8 round-trip law.
    pub fn statistics(&self, code: IndexCode, days: i64, as_of: DateTime<Utc>) -> IndexStatistics {
        let from = as_of - chrono::Duration::days(days);
        let raw = self.series.range(code.as_str(), from, as_of);
        statistics_over(raw.into_iter().map(|(_, v)| v))
    }
}

/// Mean of `value`, last-of everything else, keyed by the bucket's latest
/// `observed_at` — a bucket is reported as of its most recent member.
fn downsample_bucket(mut bucket: Vec<IndexValue>) -> IndexValue {
    bucket.sort_by_key(|v| v.observed_at);
    let last = bucket.last().expect("bucket is non-empty by construction").clone();
    let mean_value: Decimal =
        bucket.iter().map(|v| v.value).sum::<Decimal>() / Decimal::from(bucket.len());
    IndexValue {
        value: mean_value,
        ..last
    }
}

fn statistics_over(values: impl Iterator<Item = IndexValue>) -> IndexStatistics {
    let samples: Vec<f64> = values.map(|v| v.value.to_f64().unwrap_or(0.0)).collect();
    if samples.is_empty() {
        return IndexStatistics {
            count: 0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            stddev: 0.0,
            range: 0.0,
        };
    }
    let count = samples.len();
    let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = samples.iter().sum::<f64>() / count as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    IndexStatistics {
        count,
        min,
        max,
        mean,
        stddev: variance.sqrt(),
        range: max - min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use syi_core::IndexMode;

    fn iv(code: IndexCode, at: DateTime<Utc>, value: Decimal) -> IndexValue {
        IndexValue {
            index_code: code,
            observed_at: at,
            value,
            mode: IndexMode::Normal,
            confidence: 0.9,
            constituent_count: 3,
            hhi: 0.4,
            notes: vec![],
            staleness_flags: vec![],
            constituents: vec![],
        }
    }

    #[test]
    fn append_rejects_non_monotonic_observed_at() {
        let store = IndexStore::new();
        let t0 = Utc::now();
        store.append(iv(IndexCode::Syi, t0, dec!(0.04))).unwrap();
        let err = store.append(iv(IndexCode::Syi, t0, dec!(0.05))).unwrap_err();
        assert!(matches!(err, EngineError::StoreConflict { .. }));
    }

    #[test]
    fn range_without_max_points_returns_raw_series() {
        let store = IndexStore::new();
        let t0 = Utc::now();
        for i in 0..5 {
            store
                .append(iv(IndexCode::Syi, t0 + chrono::Duration::minutes(i), dec!(0.04)))
                .unwrap();
        }
        let result = store.range(IndexCode::Syi, t0, t0 + chrono::Duration::minutes(4), None);
        assert_eq!(result.points.len(), 5);
        assert!(result.bucket_width.is_none());
    }

    #[test]
    fn range_downsamples_when_max_points_below_raw_count() {
        let store = IndexStore::new();
        let t0 = Utc::now();
        for i in 0..10 {
            store
                .append(iv(IndexCode::Syi, t0 + chrono::Duration::minutes(i), Decimal::from(i)))
                .unwrap();
        }
        let result = store.range(IndexCode::Syi, t0, t0 + chrono::Duration::minutes(9), Some(2));
        assert!(result.points.len() <= 2);
        assert!(result.bucket_width.is_some());
    }

    #[test]
    fn range_then_statistics_agree_on_count_min_max_mean() {
        let store = IndexStore::new();
        let t0 = Utc::now();
        for i in 0..30 {
            store
                .append(iv(IndexCode::Syi, t0 + chrono::Duration::minutes(i), Decimal::from(i)))
                .unwrap();
        }
        let range = store.range(IndexCode::Syi, t0, t0 + chrono::Duration::minutes(29), None);
        let stats = store.statistics(IndexCode::Syi, 1, t0 + chrono::Duration::minutes(29));

        let direct = statistics_over(range.points.into_iter());
        assert_eq!(direct.count, stats.count);
        assert_eq!(direct.min, stats.min);
        assert_eq!(direct.max, stats.max);
        assert!((direct.mean - stats.mean).abs() < 1e-9);
    }
}

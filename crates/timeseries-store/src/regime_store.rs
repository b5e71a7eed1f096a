//! `RegimeSample` stream, day-monotonic per index code (§3, §4.8).

use chrono::NaiveDate;
use syi_core::{EngineError, IndexCode, RegimeSample};

use crate::series::Partitioned;

#[derive(Debug, Default)]
pub struct RegimeStore {
    series: Partitioned<NaiveDate, RegimeSample>,
}

impl RegimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, code: IndexCode, sample: RegimeSample) -> Result<(), EngineError> {
        let key = code.as_str();
        self.series.append(key, sample.date, sample)
    }

    pub fn latest(&self, code: IndexCode) -> Option<RegimeSample> {
        self.series.latest(code.as_str())
    }

    /// `[from, to]` history, oldest first, truncated to the most recent
    /// `limit` samples when given.
    pub fn history(&self, code: IndexCode, from: NaiveDate, to: NaiveDate, limit: Option<usize>) -> Vec<RegimeSample> {
        let mut samples: Vec<RegimeSample> = self
            .series
            .range(code.as_str(), from, to)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        if let Some(limit) = limit {
            if samples.len() > limit {
                samples = samples.split_off(samples.len() - limit);
            }
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syi_core::RegimeState;

    fn sample(date: NaiveDate) -> RegimeSample {
        RegimeSample {
            date,
            syi_excess: 0.0,
            ema_short: 0.0,
            ema_long: 0.0,
            spread: 0.0,
            volatility_30d: 0.01,
            z_score: 0.0,
            slope7: 0.0,
            breadth_pct: 50.0,
            state: RegimeState::Neu,
            days_in_state: 0,
            alert: None,
            methodology_version: "2.0.0".to_string(),
            params_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn history_is_day_monotonic_and_truncates_to_limit() {
        let store = RegimeStore::new();
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        for i in 0..10 {
            store.append(IndexCode::Syi, sample(start + chrono::Duration::days(i))).unwrap();
        }
        let full = store.history(IndexCode::Syi, start, start + chrono::Duration::days(9), None);
        assert_eq!(full.len(), 10);

        let limited = store.history(IndexCode::Syi, start, start + chrono::Duration::days(9), Some(3));
        assert_eq!(limited.len(), 3);
        assert_eq!(limited.last().unwrap().date, start + chrono::Duration::days(9));
    }

    #[test]
    fn append_rejects_non_increasing_day() {
        let store = RegimeStore::new();
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        store.append(IndexCode::Syi, sample(day)).unwrap();
        let err = store.append(IndexCode::Syi, sample(day)).unwrap_err();
        assert!(matches!(err, EngineError::StoreConflict { .. }));
    }
}

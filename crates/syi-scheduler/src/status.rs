//! Per-index-code scheduler health, served by the §6.2 status query.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub last_sources_attempted: usize,
    pub last_sources_failed: usize,
    pub last_samples_ingested: usize,
}

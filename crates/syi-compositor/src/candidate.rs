use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;
use syi_core::{RAYRecord, SanitizationAction};

/// Everything the compositor needs about one (symbol, source) pair to
/// decide eligibility, weight, and tie-break order. Built by the scheduler
/// from the RAY/sanitizer/peg-liquidity outputs of one cycle.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub symbol: String,
    pub source_id: String,
    pub chain: Option<String>,
    pub pool_id: Option<String>,
    pub protocol: Option<String>,
    pub record: RAYRecord,
    pub sanitization_action: SanitizationAction,
    pub sample_age: ChronoDuration,
    pub market_cap_usd: Option<Decimal>,
    pub capacity_usd: Option<Decimal>,
    pub tvl_usd: Option<Decimal>,
    pub operational_days: Option<u32>,
    pub ray_stddev_30: Option<f64>,
    pub vol_7d: Option<f64>,
    pub vol_30d: Option<f64>,
}

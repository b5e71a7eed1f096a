use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AdapterError;
use crate::types::{MarketCap, OrderBookSnapshot, PriceTick, RawYieldSample, SourceKind, TBillRate};

/// What a given adapter instance can be asked to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterCapability {
    Yields,
    Prices,
    OrderBooks,
    MarketCaps,
    TBillRates,
}

/// Static identity of one source adapter.
#[derive(Debug, Clone)]
pub struct AdapterIdentity {
    pub source_id: String,
    pub source_kind: SourceKind,
    pub capabilities: Vec<AdapterCapability>,
}

/// Uniform, pull-based contract every venue/protocol adapter implements (§4.1).
///
/// Only `identity` and `fetch_yields` are required; the other fetches default to
/// `UNAVAILABLE` so an adapter that only covers part of §4.1's data need not stub
/// out methods it has no backing API for.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn identity(&self) -> AdapterIdentity;

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError>;

    async fn fetch_prices(&self, symbols: &[String]) -> Result<HashMap<String, PriceTick>, AdapterError> {
        let _ = symbols;
        Err(AdapterError::new(
            self.identity().source_id,
            crate::error::AdapterErrorKind::Unavailable,
            "adapter does not support price fetches",
        ))
    }

    async fn fetch_order_books(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Vec<OrderBookSnapshot>>, AdapterError> {
        let _ = symbols;
        Err(AdapterError::new(
            self.identity().source_id,
            crate::error::AdapterErrorKind::Unavailable,
            "adapter does not support order-book fetches",
        ))
    }

    async fn fetch_market_caps(&self, symbols: &[String]) -> Result<HashMap<String, MarketCap>, AdapterError> {
        let _ = symbols;
        Err(AdapterError::new(
            self.identity().source_id,
            crate::error::AdapterErrorKind::Unavailable,
            "adapter does not support market-cap fetches",
        ))
    }

    async fn fetch_tbill_rate(&self) -> Result<TBillRate, AdapterError> {
        Err(AdapterError::new(
            self.identity().source_id,
            crate::error::AdapterErrorKind::Unavailable,
            "adapter does not support T-Bill rate fetches",
        ))
    }
}

/// Indirection over wall-clock time so statistical/state-machine code can be
/// exercised deterministically in tests (§8 determinism properties).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

//! Order-book depth adapter, used by the liquidity metrics stage.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use syi_core::{
    AdapterCapability, AdapterError, AdapterErrorKind, AdapterIdentity, BookLevel, OrderBookSnapshot, RawYieldSample,
    SourceAdapter, SourceKind,
};

use crate::rate_limiter::RateLimiter;
use crate::retry::with_retry;

#[derive(Debug, Deserialize)]
struct VenueLevel(Decimal, Decimal);

#[derive(Debug, Deserialize)]
struct VenueBook {
    bids: Vec<VenueLevel>,
    asks: Vec<VenueLevel>,
}

/// Pulls a top-of-book depth snapshot for one symbol from one venue.
pub struct OrderBookAdapter {
    source_id: String,
    venue: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl OrderBookAdapter {
    pub fn new(source_id: impl Into<String>, venue: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            venue: venue.into(),
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            rate_limiter: RateLimiter::new(120, Duration::from_secs(60)),
        }
    }

    fn map_error(&self, message: impl Into<String>, kind: AdapterErrorKind) -> AdapterError {
        AdapterError::new(self.source_id.clone(), kind, message)
    }
}

#[async_trait]
impl SourceAdapter for OrderBookAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Cefi,
            capabilities: vec![AdapterCapability::OrderBooks],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        Err(self.map_error("order book feed does not serve yields", AdapterErrorKind::Unavailable))
    }

    async fn fetch_order_books(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Vec<OrderBookSnapshot>>, AdapterError> {
        let mut snapshots: HashMap<String, Vec<OrderBookSnapshot>> = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let url = format!("{}/depth?symbol={}", self.base_url, symbol);
            let observed_at = Utc::now();

            let book: VenueBook = with_retry(3, || async {
                self.rate_limiter.acquire().await;
                let response = self.client.get(&url).send().await.map_err(|e| {
                    let kind = if e.is_timeout() || e.is_connect() {
                        AdapterErrorKind::Transient
                    } else {
                        AdapterErrorKind::Unavailable
                    };
                    self.map_error(e.to_string(), kind)
                })?;

                match response.status().as_u16() {
                    401 | 403 => Err(self.map_error("authentication rejected", AdapterErrorKind::Auth)),
                    429 => Err(self.map_error("rate limited", AdapterErrorKind::RateLimited)),
                    s if (500..600).contains(&s) => {
                        Err(self.map_error(format!("HTTP {s}"), AdapterErrorKind::Transient))
                    }
                    s if s >= 400 => Err(self.map_error(format!("HTTP {s}"), AdapterErrorKind::Malformed)),
                    _ => response
                        .json::<VenueBook>()
                        .await
                        .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed)),
                }
            })
            .await?;

            let key = symbol.to_uppercase();
            snapshots.entry(key.clone()).or_default().push(OrderBookSnapshot {
                symbol: key,
                venue: self.venue.clone(),
                bids: book.bids.into_iter().map(|l| BookLevel { price: l.0, size: l.1 }).collect(),
                asks: book.asks.into_iter().map(|l| BookLevel { price: l.0, size: l.1 }).collect(),
                observed_at,
            });
        }
        Ok(snapshots)
    }
}

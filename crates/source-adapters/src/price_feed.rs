//! Price + 24h-volume adapter, used by the peg metrics stage.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use syi_core::{
    AdapterCapability, AdapterError, AdapterErrorKind, AdapterIdentity, PriceTick, RawYieldSample, SourceAdapter,
    SourceKind,
};

use crate::rate_limiter::RateLimiter;
use crate::retry::with_retry;

#[derive(Debug, Deserialize)]
struct VenueTicker {
    symbol: String,
    price: f64,
    #[serde(rename = "volume24h", default)]
    volume_24h: f64,
}

/// Pulls last-traded price and 24h volume for a set of symbols from one venue.
pub struct PriceFeedAdapter {
    source_id: String,
    venue: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PriceFeedAdapter {
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
impl SourceAdapter for PriceFeedAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Cefi,
            capabilities: vec![AdapterCapability::Prices],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        Err(self.map_error("price feed does not serve yields", AdapterErrorKind::Unavailable))
    }

    async fn fetch_prices(&self, symbols: &[String]) -> Result<HashMap<String, PriceTick>, AdapterError> {
        let url = format!("{}/ticker", self.base_url);
        let observed_at = Utc::now();
        let wanted: std::collections::HashSet<String> = symbols.iter().map(|s| s.to_uppercase()).collect();

        let tickers: Vec<VenueTicker> = with_retry(3, || async {
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
                s if (500..600).contains(&s) => Err(self.map_error(format!("HTTP {s}"), AdapterErrorKind::Transient)),
                s if s >= 400 => Err(self.map_error(format!("HTTP {s}"), AdapterErrorKind::Malformed)),
                _ => response
                    .json::<Vec<VenueTicker>>()
                    .await
                    .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed)),
            }
        })
        .await?;

        let mut out = HashMap::new();
        for t in tickers {
            let symbol = t.symbol.to_uppercase();
            if !wanted.is_empty() && !wanted.contains(&symbol) {
                continue;
            }
            let Ok(price_usd) = Decimal::try_from(t.price) else { continue };
            let Ok(volume_24h_usd) = Decimal::try_from(t.volume_24h) else { continue };
            out.insert(
                symbol.clone(),
                PriceTick {
                    symbol,
                    venue: self.venue.clone(),
                    price_usd,
                    volume_24h_usd,
                    observed_at,
                },
            );
        }
        Ok(out)
    }
}

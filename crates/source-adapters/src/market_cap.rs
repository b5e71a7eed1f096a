//! Circulating market-cap adapter, used by the MARKET_CAP weighting scheme.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use syi_core::{
    AdapterCapability, AdapterError, AdapterErrorKind, AdapterIdentity, MarketCap, RawYieldSample, SourceAdapter,
    SourceKind,
};

use crate::rate_limiter::RateLimiter;
use crate::retry::with_retry;

#[derive(Debug, Deserialize)]
struct AssetEntry {
    symbol: String,
    #[serde(rename = "marketCapUsd")]
    market_cap_usd: f64,
}

/// Pulls circulating market caps for a set of symbols from an aggregator endpoint.
pub struct MarketCapAdapter {
    source_id: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl MarketCapAdapter {
    pub fn new(source_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            rate_limiter: RateLimiter::new(30, Duration::from_secs(60)),
        }
    }

    fn map_error(&self, message: impl Into<String>, kind: AdapterErrorKind) -> AdapterError {
        AdapterError::new(self.source_id.clone(), kind, message)
    }
}

#[async_trait]
impl SourceAdapter for MarketCapAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Cefi,
            capabilities: vec![AdapterCapability::MarketCaps],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        Err(self.map_error("market cap feed does not serve yields", AdapterErrorKind::Unavailable))
    }

    async fn fetch_market_caps(&self, symbols: &[String]) -> Result<HashMap<String, MarketCap>, AdapterError> {
        let url = format!("{}/assets", self.base_url);
        let observed_at = Utc::now();
        let wanted: std::collections::HashSet<String> = symbols.iter().map(|s| s.to_uppercase()).collect();

        let entries: Vec<AssetEntry> = with_retry(3, || async {
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
                    .json::<Vec<AssetEntry>>()
                    .await
                    .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed)),
            }
        })
        .await?;

        let mut out = HashMap::new();
        for e in entries {
            let symbol = e.symbol.to_uppercase();
            if !wanted.is_empty() && !wanted.contains(&symbol) {
                continue;
            }
            let Ok(market_cap_usd) = Decimal::try_from(e.market_cap_usd) else { continue };
            out.insert(
                symbol.clone(),
                MarketCap {
                    symbol,
                    market_cap_usd,
                    observed_at,
                },
            );
        }
        Ok(out)
    }
}

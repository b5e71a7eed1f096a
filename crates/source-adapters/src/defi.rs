//! Decentralized-protocol yield adapter (lending/LP pool yields, TVL-aware).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use syi_core::{
    AdapterCapability, AdapterError, AdapterErrorKind, AdapterIdentity, RawYieldSample, SourceAdapter, SourceKind,
};

use crate::rate_limiter::RateLimiter;
use crate::retry::with_retry;

#[derive(Debug, Deserialize)]
struct DefiPool {
    pool: String,
    symbol: String,
    chain: String,
    #[serde(rename = "apy")]
    apy_total: f64,
    #[serde(rename = "apyBase", default)]
    apy_base: Option<f64>,
    #[serde(rename = "apyReward", default)]
    apy_reward: Option<f64>,
    #[serde(rename = "apyBaseBorrow", default)]
    borrow_apy: Option<f64>,
    #[serde(rename = "tvlUsd", default)]
    tvl_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DefiPoolsResponse {
    data: Vec<DefiPool>,
}

/// Pulls DeFi pool yields from a protocol-aggregator style endpoint.
pub struct DefiYieldAdapter {
    source_id: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl DefiYieldAdapter {
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
impl SourceAdapter for DefiYieldAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Defi,
            capabilities: vec![AdapterCapability::Yields],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        let url = format!("{}/pools", self.base_url);
        let observed_at = Utc::now();

        let body: DefiPoolsResponse = with_retry(3, || async {
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
                    .json::<DefiPoolsResponse>()
                    .await
                    .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed)),
            }
        })
        .await?;

        Ok(body
            .data
            .into_iter()
            .filter_map(|pool| {
                Some(RawYieldSample {
                    symbol: pool.symbol.to_uppercase(),
                    source_id: self.source_id.clone(),
                    source_kind: SourceKind::Defi,
                    chain: Some(pool.chain),
                    pool_id: Some(pool.pool),
                    apy_total: Decimal::try_from(pool.apy_total).ok()?,
                    apy_base: pool.apy_base.and_then(|v| Decimal::try_from(v).ok()),
                    apy_reward: pool.apy_reward.and_then(|v| Decimal::try_from(v).ok()),
                    borrow_apy: pool.borrow_apy.and_then(|v| Decimal::try_from(v).ok()),
                    tvl_usd: pool.tvl_usd.and_then(|v| Decimal::try_from(v).ok()),
                    observed_at,
                })
            })
            .collect())
    }
}

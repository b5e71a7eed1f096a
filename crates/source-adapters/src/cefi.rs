//! Centralized-venue yield adapter (exchange "earn"/savings style products).

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
struct CefiProduct {
    asset: String,
    apy: f64,
    #[serde(default)]
    apy_base: Option<f64>,
    #[serde(default)]
    apy_reward: Option<f64>,
    #[serde(default)]
    tvl_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CefiProductsResponse {
    products: Vec<CefiProduct>,
}

/// Pulls CeFi "earn" yields from one centralized venue's public products endpoint.
pub struct CefiYieldAdapter {
    source_id: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl CefiYieldAdapter {
    pub fn new(source_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            rate_limiter: RateLimiter::new(60, Duration::from_secs(60)),
        }
    }

    fn map_error(&self, message: impl Into<String>, kind: AdapterErrorKind) -> AdapterError {
        AdapterError::new(self.source_id.clone(), kind, message)
    }
}

#[async_trait]
impl SourceAdapter for CefiYieldAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Cefi,
            capabilities: vec![AdapterCapability::Yields],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        let url = format!("{}/earn/products", self.base_url);
        let observed_at = Utc::now();

        let body: CefiProductsResponse = with_retry(3, || async {
            self.rate_limiter.acquire().await;
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| self.classify_reqwest_error(e))?;

            match response.status().as_u16() {
                401 | 403 => Err(self.map_error("authentication rejected", AdapterErrorKind::Auth)),
                429 => Err(self.map_error("rate limited", AdapterErrorKind::RateLimited)),
                s if (500..600).contains(&s) => Err(self.map_error(format!("HTTP {s}"), AdapterErrorKind::Transient)),
                s if s >= 400 => Err(self.map_error(format!("HTTP {s}"), AdapterErrorKind::Malformed)),
                _ => response
                    .json::<CefiProductsResponse>()
                    .await
                    .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed)),
            }
        })
        .await?;

        Ok(body
            .products
            .into_iter()
            .filter_map(|p| {
                Some(RawYieldSample {
                    symbol: p.asset.to_uppercase(),
                    source_id: self.source_id.clone(),
                    source_kind: SourceKind::Cefi,
                    chain: None,
                    pool_id: None,
                    apy_total: Decimal::try_from(p.apy).ok()?,
                    apy_base: p.apy_base.and_then(|v| Decimal::try_from(v).ok()),
                    apy_reward: p.apy_reward.and_then(|v| Decimal::try_from(v).ok()),
                    borrow_apy: None,
                    tvl_usd: p.tvl_usd.and_then(|v| Decimal::try_from(v).ok()),
                    observed_at,
                })
            })
            .collect())
    }
}

impl CefiYieldAdapter {
    fn classify_reqwest_error(&self, e: reqwest::Error) -> AdapterError {
        let kind = if e.is_timeout() || e.is_connect() {
            AdapterErrorKind::Transient
        } else {
            AdapterErrorKind::Unavailable
        };
        self.map_error(e.to_string(), kind)
    }
}

//! Risk-free reference rate adapter, feeding the regime engine's excess-yield input.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use syi_core::{
    AdapterCapability, AdapterError, AdapterErrorKind, AdapterIdentity, RawYieldSample, SourceAdapter, SourceKind,
    TBillRate,
};

use crate::rate_limiter::RateLimiter;
use crate::retry::with_retry;

#[derive(Debug, Deserialize)]
struct TBillResponse {
    rate_pct: f64,
}

/// Pulls the 3-month Treasury bill rate from a rates endpoint.
pub struct TBillAdapter {
    source_id: String,
    tenor: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl TBillAdapter {
    pub fn new(source_id: impl Into<String>, tenor: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            tenor: tenor.into(),
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            rate_limiter: RateLimiter::new(6, Duration::from_secs(60)),
        }
    }

    fn map_error(&self, message: impl Into<String>, kind: AdapterErrorKind) -> AdapterError {
        AdapterError::new(self.source_id.clone(), kind, message)
    }
}

#[async_trait]
impl SourceAdapter for TBillAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            source_id: self.source_id.clone(),
            source_kind: SourceKind::Cefi,
            capabilities: vec![AdapterCapability::TBillRates],
        }
    }

    async fn fetch_yields(&self) -> Result<Vec<RawYieldSample>, AdapterError> {
        Err(self.map_error("t-bill feed does not serve yields", AdapterErrorKind::Unavailable))
    }

    async fn fetch_tbill_rate(&self) -> Result<TBillRate, AdapterError> {
        let url = format!("{}/rates/{}", self.base_url, self.tenor);
        let observed_at = Utc::now();

        let body: TBillResponse = with_retry(3, || async {
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
                    .json::<TBillResponse>()
                    .await
                    .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed)),
            }
        })
        .await?;

        let rate = Decimal::try_from(body.rate_pct / 100.0)
            .map_err(|e| self.map_error(e.to_string(), AdapterErrorKind::Malformed))?;

        Ok(TBillRate {
            tenor: self.tenor.clone(),
            rate,
            observed_at,
        })
    }
}

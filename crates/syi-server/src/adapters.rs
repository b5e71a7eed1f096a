//! Builds the enabled adapter set from the environment at startup. Every
//! adapter is optional — an unset base-URL env var simply leaves that
//! venue out of the fan-out rather than failing startup.

use std::sync::Arc;

use rust_decimal_macros::dec;
use source_adapters::{CefiYieldAdapter, DefiYieldAdapter, MarketCapAdapter, SyntheticSeed, SyntheticYieldAdapter, TBillAdapter};
use syi_core::SourceAdapter;
use tracing::info;

/// The six reference stablecoins used to seed the synthetic adapter when
/// no real source is configured (keeps the demo/test deployment non-empty).
fn default_seeds() -> Vec<SyntheticSeed> {
    vec![
        SyntheticSeed { symbol: "USDT".into(), apy_total: dec!(0.045) },
        SyntheticSeed { symbol: "USDC".into(), apy_total: dec!(0.043) },
        SyntheticSeed { symbol: "DAI".into(), apy_total: dec!(0.048) },
        SyntheticSeed { symbol: "TUSD".into(), apy_total: dec!(0.040) },
        SyntheticSeed { symbol: "FRAX".into(), apy_total: dec!(0.047) },
        SyntheticSeed { symbol: "USDP".into(), apy_total: dec!(0.041) },
    ]
}

pub fn build_adapters() -> Vec<Arc<dyn SourceAdapter>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if let Ok(base_url) = std::env::var("SYI_CEFI_BASE_URL") {
        info!(base_url, "enabling CEFI yield adapter");
        adapters.push(Arc::new(CefiYieldAdapter::new("cefi-primary", base_url)));
    }
    if let Ok(base_url) = std::env::var("SYI_DEFI_BASE_URL") {
        info!(base_url, "enabling DEFI yield adapter");
        adapters.push(Arc::new(DefiYieldAdapter::new("defi-primary", base_url)));
    }
    if let Ok(base_url) = std::env::var("SYI_MARKET_CAP_BASE_URL") {
        info!(base_url, "enabling market-cap adapter");
        adapters.push(Arc::new(MarketCapAdapter::new("market-cap-primary", base_url)));
    }
    if let Ok(base_url) = std::env::var("SYI_TBILL_BASE_URL") {
        info!(base_url, "enabling T-Bill adapter");
        adapters.push(Arc::new(TBillAdapter::new("tbill-3m", "3M", base_url)));
    }

    if adapters.is_empty() {
        info!("no live adapters configured, falling back to the synthetic degraded-mode adapter");
        adapters.push(Arc::new(SyntheticYieldAdapter::new("synthetic-fallback", default_seeds())));
    }

    adapters
}

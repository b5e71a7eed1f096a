//! Concrete implementations of `syi_core::SourceAdapter` (§4.1) plus the
//! shared retry/rate-limit policy and bounded fan-out helper used to run
//! every enabled adapter concurrently each cycle (§5).

mod cefi;
mod defi;
mod fan_out;
mod market_cap;
mod order_book;
mod price_feed;
mod rate_limiter;
mod retry;
mod synthetic;
mod tbill;

pub use cefi::CefiYieldAdapter;
pub use defi::DefiYieldAdapter;
pub use fan_out::{fan_out_yields, DEFAULT_CONCURRENCY, DEFAULT_PER_SOURCE_TIMEOUT};
pub use market_cap::MarketCapAdapter;
pub use order_book::OrderBookAdapter;
pub use price_feed::PriceFeedAdapter;
pub use rate_limiter::RateLimiter;
pub use retry::{backoff_delay, with_retry};
pub use synthetic::{SyntheticSeed, SyntheticYieldAdapter};
pub use tbill::TBillAdapter;

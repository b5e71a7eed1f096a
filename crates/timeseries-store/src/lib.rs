//! Append-only time-series store (§4.8): history of index values,
//! constituent RAY records, per-symbol peg/liquidity metrics and regime
//! samples, with range queries, downsampling and basic statistics.
//!
//! This is the "small deployment" embedded conforming implementation §6.3
//! allows as an alternative to a TSDB-backed one: everything lives
//! in-process behind `parking_lot::RwLock`, keyed by natural key and
//! strictly increasing per §3's "Temporal ordering" invariant. No updates,
//! ever — only append and trim.

mod index_store;
mod metrics_store;
mod ray_store;
mod regime_store;
mod retention;
mod series;
mod store;

pub use index_store::{IndexRangeResult, IndexStatistics, IndexStore};
pub use metrics_store::{LiquidityMetricsStore, PegMetricsStore};
pub use ray_store::RayStore;
pub use regime_store::RegimeStore;
pub use retention::RetentionPolicy;
pub use store::Store;

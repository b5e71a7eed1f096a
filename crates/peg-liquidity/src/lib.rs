//! Peg stability and market-depth metrics derived from price ticks and
//! order book snapshots (§4.2). Pure computation plus the bounded in-memory
//! rings peg metrics need to look back across cycles.

mod liquidity;
mod peg;
mod rings;

pub use liquidity::compute_liquidity_metrics;
pub use peg::{compute_peg_metrics, compute_vw_price, default_peg_metrics};
pub use rings::{PegRing, PegRingStore, RING_CAPACITY};

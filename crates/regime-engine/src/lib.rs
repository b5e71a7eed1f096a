//! Risk-regime state machine (§4.6): from a daily series of (SYI, 3M
//! T-Bill, per-symbol RAY, peg-stress) inputs, produces an ON/OFF/
//! OFF_OVERRIDE/NEU classification with hysteresis, persistence and a
//! peg-stress override that bypasses cooldown.

mod engine;
mod params;
mod stats;

pub use engine::RegimeEngine;
pub use params::RegimeParams;

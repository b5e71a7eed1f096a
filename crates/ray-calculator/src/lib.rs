//! Risk-Adjusted Yield calculation (§4.4): combines a sanitized base APY
//! with the five §4.4 risk factors into a `RAYRecord`.

mod calculator;
mod config;

pub use calculator::{compute_ray, FactorInput};
pub use config::RayConfig;

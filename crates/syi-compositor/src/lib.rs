//! Index composition (§4.5): eligibility filtering, weighting schemes,
//! water-filling cap normalization, and mode classification.

mod candidate;
mod compose;
mod config;
mod mode;
mod normalize;
mod thresholds;
mod weighting;

pub use candidate::Candidate;
pub use compose::{compose, normal_mode_context};
pub use config::CompositorConfig;
pub use mode::{classify_mode, ModeContext};
pub use normalize::normalize_with_cap;
pub use thresholds::{GradeThresholds, LiquidityGrade, LiquidityThresholds, StabilityRequirements};
pub use weighting::{raw_weight, select_market_cap_candidates, WeightingScheme};

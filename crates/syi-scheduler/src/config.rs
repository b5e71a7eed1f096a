//! Cadence, deadlines and concurrency knobs for the minute-level cycle
//! (§4.7, §5), plus the `EngineConfig` that assembles every downstream
//! crate's own config type into the one object the Application container
//! builds at startup (§9 "single Application container").

use std::collections::HashMap;
use std::time::Duration;

use ray_calculator::RayConfig;
use regime_engine::RegimeParams;
use syi_compositor::CompositorConfig;
use syi_core::{EngineError, IndexCode};
use yield_sanitizer::SanitizerConfig;

/// Scheduling cadence and per-cycle resource bounds (§4.7, §5).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub cycle_interval: Duration,
    pub cycle_deadline: Duration,
    pub per_source_kind_concurrency: usize,
    pub per_source_timeout: Duration,
    /// Minute/hour the daily regime tick fires at, UTC.
    pub regime_tick_hour_utc: u32,
    pub regime_tick_minute_utc: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(60),
            cycle_deadline: Duration::from_secs(30),
            per_source_kind_concurrency: 8,
            per_source_timeout: Duration::from_secs(8),
            regime_tick_hour_utc: 0,
            regime_tick_minute_utc: 5,
        }
    }
}

impl SchedulerConfig {
    /// Reads overrides from the environment; any documented key present but
    /// unparsable is a `ConfigError`, fatal at startup only (§7).
    pub fn from_env() -> Result<Self, EngineError> {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("SYI_CYCLE_INTERVAL_SECS") {
            config.cycle_interval = Duration::from_secs(parse_env("SYI_CYCLE_INTERVAL_SECS", &v)?);
        }
        if let Ok(v) = std::env::var("SYI_CYCLE_DEADLINE_SECS") {
            config.cycle_deadline = Duration::from_secs(parse_env("SYI_CYCLE_DEADLINE_SECS", &v)?);
        }
        if let Ok(v) = std::env::var("SYI_ADAPTER_CONCURRENCY") {
            config.per_source_kind_concurrency = parse_env("SYI_ADAPTER_CONCURRENCY", &v)?;
        }
        if let Ok(v) = std::env::var("SYI_PER_SOURCE_TIMEOUT_SECS") {
            config.per_source_timeout = Duration::from_secs(parse_env("SYI_PER_SOURCE_TIMEOUT_SECS", &v)?);
        }
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, EngineError> {
    raw.parse()
        .map_err(|_| EngineError::ConfigError(format!("{key} must be a valid value, got {raw:?}")))
}

/// Every config a full pipeline cycle needs, assembled once at startup.
/// Per-index-code compositor configuration lets each published index
/// (SYI, SYCEFI, SYDEFI, ...) carry its own weighting scheme and
/// eligibility thresholds (§4.5 "configurable per index code").
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub sanitizer: SanitizerConfig,
    pub ray: RayConfig,
    pub compositor_by_index: HashMap<IndexCode, CompositorConfig>,
    pub regime: RegimeParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut compositor_by_index = HashMap::new();
        compositor_by_index.insert(IndexCode::Syi, CompositorConfig::default());
        Self {
            scheduler: SchedulerConfig::default(),
            sanitizer: SanitizerConfig::default(),
            ray: RayConfig::default(),
            compositor_by_index,
            regime: RegimeParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, EngineError> {
        Ok(Self {
            scheduler: SchedulerConfig::from_env()?,
            ..Self::default()
        })
    }

    pub fn compositor_config(&self, code: IndexCode) -> &CompositorConfig {
        self.compositor_by_index
            .get(&code)
            .unwrap_or_else(|| self.compositor_by_index.get(&IndexCode::Syi).expect("SYI config always present"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_config_has_a_syi_compositor_entry() {
        let config = EngineConfig::default();
        assert!(config.compositor_by_index.contains_key(&IndexCode::Syi));
    }

    #[test]
    fn unparsable_env_override_is_a_config_error() {
        std::env::set_var("SYI_CYCLE_INTERVAL_SECS", "not-a-number");
        let result = SchedulerConfig::from_env();
        std::env::remove_var("SYI_CYCLE_INTERVAL_SECS");
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::BenchmarkError;
use crate::metrics::calculator::DEFAULT_LOOKBACK_DAYS;
use crate::BenchmarkResult;

/// Runtime knobs for [`super::BenchmarkingService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for every repository and characteristics call
    pub repository_timeout_ms: u64,
    /// Length of the default analysis window ending today
    pub default_lookback_days: u32,
    /// How far back historical benchmark series reach
    pub history_lookback_days: u32,
    /// Fixed peer seed; fresh per request when absent
    pub peer_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repository_timeout_ms: 5_000,
            default_lookback_days: DEFAULT_LOOKBACK_DAYS,
            history_lookback_days: 730,
            peer_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn repository_timeout(&self) -> Duration {
        Duration::from_millis(self.repository_timeout_ms)
    }

    pub fn validate(&self) -> BenchmarkResult<()> {
        if self.repository_timeout_ms == 0 {
            return Err(BenchmarkError::invalid(
                "repository_timeout_ms",
                "Must be greater than zero",
            ));
        }
        if self.default_lookback_days == 0 {
            return Err(BenchmarkError::invalid(
                "default_lookback_days",
                "Must be at least one day",
            ));
        }
        if self.history_lookback_days == 0 {
            return Err(BenchmarkError::invalid(
                "history_lookback_days",
                "Must be at least one day",
            ));
        }
        Ok(())
    }
}

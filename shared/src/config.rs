use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::sort::SortType;

/// Timing and defaults for the presentation layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PresenterConfig {
    /// In-flight time after which the blocking overlay becomes visible.
    pub blocker_lower_limit_ms: u64,
    /// Minimum time, counted from the start of the action, a shown overlay stays up.
    pub blocker_upper_limit_ms: u64,
    pub shake_duration_ms: u64,
    pub default_sort: SortType,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            blocker_lower_limit_ms: 350,
            blocker_upper_limit_ms: 1_000,
            shake_duration_ms: 600,
            default_sort: SortType::Day,
        }
    }
}

impl PresenterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blocker_lower_limit_ms == 0 {
            return Err(ConfigError::Invalid("blocker_lower_limit_ms must be > 0".into()));
        }
        if self.blocker_upper_limit_ms < self.blocker_lower_limit_ms {
            return Err(ConfigError::Invalid(
                "blocker_upper_limit_ms must be >= blocker_lower_limit_ms".into(),
            ));
        }
        if self.shake_duration_ms == 0 {
            return Err(ConfigError::Invalid("shake_duration_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub const fn lower_limit(&self) -> Duration {
        Duration::from_millis(self.blocker_lower_limit_ms)
    }

    #[must_use]
    pub const fn upper_limit(&self) -> Duration {
        Duration::from_millis(self.blocker_upper_limit_ms)
    }

    #[must_use]
    pub const fn shake_duration(&self) -> Duration {
        Duration::from_millis(self.shake_duration_ms)
    }
}

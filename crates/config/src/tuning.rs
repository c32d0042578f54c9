use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::ConfigResult;

/// Tuning constants for the pool and dispatcher that `spec.md` fixes as
/// defaults but are more naturally expressed as data than environment
/// variables. All fields default to the values stated in the spec.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolTuning {
    pub idle_timeout_secs: u64,
    pub queue_multiplier: usize,
    pub stats_cap: usize,
    pub rolling_window: usize,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30,
            queue_multiplier: 4,
            stats_cap: 100,
            rolling_window: 100,
        }
    }
}

impl PoolTuning {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Loads overrides from a `ssr.toml`-shaped file. Missing keys keep their
    /// compiled-in default via `#[serde(default)]`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let tuning: Self = toml::from_str(&content)?;
        Ok(tuning)
    }

    /// Loads `path` if it exists, otherwise returns the compiled-in default.
    /// A tuning file is an optional refinement, never a startup requirement.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(tuning) => tuning,
            Err(err) => {
                ssr_logging::warn!(
                    "failed to parse {}: {err}, falling back to default tuning",
                    path.display()
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let tuning = PoolTuning::default();
        assert_eq!(tuning.idle_timeout_secs, 30);
        assert_eq!(tuning.queue_multiplier, 4);
        assert_eq!(tuning.stats_cap, 100);
        assert_eq!(tuning.rolling_window, 100);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let tuning: PoolTuning = toml::from_str("queue_multiplier = 8\n").unwrap();
        assert_eq!(tuning.queue_multiplier, 8);
        assert_eq!(tuning.idle_timeout_secs, 30);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let tuning = PoolTuning::load_or_default("/nonexistent/path/ssr.toml");
        assert_eq!(tuning.stats_cap, 100);
    }
}

//! Process-wide configuration for the SSR dispatcher.
//!
//! Two sources are distinguished, matching `spec.md` §6: environment variables
//! for process startup knobs ([`ProcessConfig`]), and an optional `ssr.toml`
//! file for tuning constants better expressed as data ([`PoolTuning`]).

mod mode;
mod process;
mod tuning;

pub use mode::DispatchMode;
pub use process::ProcessConfig;
pub use tuning::PoolTuning;

use derive_more::From;

#[derive(Debug, From)]
pub enum ConfigError {
    #[from(ignore)]
    Io(std::io::Error),
    #[from(ignore)]
    Deserialize(toml::de::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Deserialize(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

//! Detector presets

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Regular runs
    ///
    /// - Atomics checked under per-address locks
    /// - Sync without a prior spawn is a model violation
    /// - Text report on stderr
    Default,

    /// Debugging a known race
    ///
    /// - Everything in `Default`
    /// - Stop at the first distinct race
    /// - Statistics and full-depth call stacks
    Strict,

    /// Shims that emit redundant syncs or treat atomics as synchronization
    ///
    /// - Atomic accesses are not checked
    /// - Sync without a prior spawn is accepted
    Lenient,
}

impl Preset {
    /// Case-insensitive preset name as written in config files
    pub fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Default
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Configuration error types

use thiserror::Error;

/// Errors from loading, overlaying or validating a `DetectorConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric field outside its accepted range
    #[error("{field} = {value} is outside {min}..={max}: {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Detector config file without a schema version
    #[error("Detector config has no 'version' field (expected 'version: 1')")]
    MissingVersion,

    #[error("Detector config version {found} is not supported (supported: {})", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u64, supported: Vec<u64> },

    #[error("Unknown preset '{0}' (expected default, strict or lenient)")]
    UnknownPreset(String),

    /// Environment variable with an unparsable value
    #[error("Invalid value '{value}' for environment variable {name}: expected a boolean")]
    InvalidEnv { name: String, value: String },

    #[error("Cannot read detector config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed detector config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Cross-field constraint violated
    #[error("Invalid detector config: {0}")]
    Validation(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }
}

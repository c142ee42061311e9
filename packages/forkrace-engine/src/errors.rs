//! Error types for forkrace-engine
//!
//! Races are not errors: they are accumulated in the race log and reported at
//! the end of the run. Errors are reserved for conditions that leave the
//! engine's ordering state untrustworthy.

use crate::config::ConfigError;
use crate::shared::models::{Address, InstrId};
use thiserror::Error;

/// Main error type for detector operations
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Mismatched or missing control-flow event
    #[error("Model violation in {event}: {detail}")]
    ModelViolation { event: &'static str, detail: String },

    /// Internal table grew past a configured limit or an allocation failed
    #[error("Resource exhausted: {what} (limit {limit})")]
    ResourceExhausted { what: &'static str, limit: usize },

    /// First distinct race found while `pause_on_race` is enabled
    #[error("Paused on race between {first} and {second} at {addr:#x}")]
    PausedOnRace {
        first: InstrId,
        second: InstrId,
        addr: Address,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error while writing the report
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    /// Create a model violation for `event`
    pub fn model_violation(event: &'static str, detail: impl Into<String>) -> Self {
        DetectorError::ModelViolation {
            event,
            detail: detail.into(),
        }
    }

    /// Create a resource exhaustion error
    pub fn exhausted(what: &'static str, limit: usize) -> Self {
        DetectorError::ResourceExhausted { what, limit }
    }

    /// Fatal errors poison the detector; the debugging pause does not
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DetectorError::PausedOnRace { .. })
    }
}

/// Result type alias for detector operations
pub type Result<T> = std::result::Result<T, DetectorError>;

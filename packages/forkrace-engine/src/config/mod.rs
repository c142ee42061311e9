//! Detector configuration
//!
//! Presets give complete starting points; YAML files (schema v1) and the
//! `FORKRACE_*` environment variables override individual fields.

pub mod detector_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod validation;

pub use detector_config::{
    DetectorConfig, LimitsConfig, ReportConfig, ReportFormat, ReportTarget, ENV_CHECK_ATOMICS,
    ENV_COLOR, ENV_PAUSE_ON_RACE,
};
pub use error::{ConfigError, ConfigResult};
pub use io::ConfigExportV1;
pub use preset::Preset;
pub use validation::Validatable;

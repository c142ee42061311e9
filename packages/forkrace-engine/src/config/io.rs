//! Configuration I/O (YAML loading)
//!
//! Schema v1:
//! ```yaml
//! version: 1
//! preset: default
//! overrides:
//!   pause_on_race: true
//!   report:
//!     format: json
//! ```

use super::detector_config::{DetectorConfig, ReportFormat, ReportTarget};
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_VERSIONS: &[u64] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u64,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_atomics: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_sync: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_on_race: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_stats: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportOverrides>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stack_depth: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<ReportTarget>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bags: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_shadow_lines: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sync_regions: Option<u32>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut DetectorConfig) {
        if let Some(v) = self.check_atomics {
            config.check_atomics = v;
        }
        if let Some(v) = self.strict_sync {
            config.strict_sync = v;
        }
        if let Some(v) = self.pause_on_race {
            config.pause_on_race = v;
        }
        if let Some(v) = self.collect_stats {
            config.collect_stats = v;
        }
        if let Some(report) = self.report {
            if let Some(v) = report.format {
                config.report.format = v;
            }
            if let Some(v) = report.color {
                config.report.color = v;
            }
            if let Some(v) = report.max_stack_depth {
                config.report.max_stack_depth = v;
            }
            if let Some(v) = report.destination {
                config.report.destination = v;
            }
            if report.path.is_some() {
                config.report.path = report.path;
            }
        }
        if let Some(limits) = self.limits {
            if let Some(v) = limits.max_bags {
                config.limits.max_bags = v;
            }
            if let Some(v) = limits.max_shadow_lines {
                config.limits.max_shadow_lines = v;
            }
            if let Some(v) = limits.max_sync_regions {
                config.limits.max_sync_regions = v;
            }
        }
    }

    /// Overrides that reproduce `config` exactly on top of any preset
    fn from_config(config: &DetectorConfig) -> Self {
        Self {
            check_atomics: Some(config.check_atomics),
            strict_sync: Some(config.strict_sync),
            pause_on_race: Some(config.pause_on_race),
            collect_stats: Some(config.collect_stats),
            report: Some(ReportOverrides {
                format: Some(config.report.format),
                color: Some(config.report.color),
                max_stack_depth: Some(config.report.max_stack_depth),
                destination: Some(config.report.destination),
                path: config.report.path.clone(),
            }),
            limits: Some(LimitsOverrides {
                max_bags: Some(config.limits.max_bags),
                max_shadow_lines: Some(config.limits.max_shadow_lines),
                max_sync_regions: Some(config.limits.max_sync_regions),
            }),
        }
    }
}

impl DetectorConfig {
    /// Load a v1 YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a v1 YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        let version = match raw.get("version") {
            None => return Err(ConfigError::MissingVersion),
            Some(v) => v.as_u64().ok_or_else(|| {
                ConfigError::Validation("'version' must be a positive integer".to_string())
            })?,
        };
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let export: ConfigExportV1 = serde_yaml::from_value(raw)?;
        let preset = Preset::from_str(&export.preset)?;

        let mut config = Self::preset(preset);
        if let Some(overrides) = export.overrides {
            overrides.apply(&mut config);
        }
        config.validated()
    }

    /// Serialize as a v1 YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: Preset::Default.as_str().to_string(),
            overrides: Some(ConfigOverrides::from_config(self)),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}

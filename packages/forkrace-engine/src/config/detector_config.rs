//! Detector configuration
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_COLOR: &str = "FORKRACE_COLOR";
pub const ENV_PAUSE_ON_RACE: &str = "FORKRACE_PAUSE_ON_RACE";
pub const ENV_CHECK_ATOMICS: &str = "FORKRACE_CHECK_ATOMICS";

pub const MAX_STACK_DEPTH_LIMIT: usize = 4096;
pub const DEFAULT_MAX_SYNC_REGIONS: u32 = 1024;
pub const MAX_SYNC_REGIONS_LIMIT: u32 = 1 << 16;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

/// Where the final report is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    Stderr,
    Stdout,
    /// `ReportConfig::path`
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// ANSI colour in text reports
    pub color: bool,
    /// Call-stack entries printed per access
    pub max_stack_depth: usize,
    pub destination: ReportTarget,
    /// Output file when `destination` is `file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            color: false,
            max_stack_depth: 32,
            destination: ReportTarget::Stderr,
            path: None,
        }
    }
}

/// Internal table caps (0 = unlimited for bags and shadow lines)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_bags: usize,
    /// Per shadow table, in 64-byte lines
    pub max_shadow_lines: usize,
    /// Sync region ids accepted per frame; always bounded
    pub max_sync_regions: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bags: 0,
            max_shadow_lines: 0,
            max_sync_regions: DEFAULT_MAX_SYNC_REGIONS,
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Check atomic accesses under a synthetic per-address lock
    pub check_atomics: bool,
    /// Sync on a region that never spawned is a model violation
    pub strict_sync: bool,
    /// Return `PausedOnRace` from the hook that finds the first distinct race
    pub pause_on_race: bool,
    pub collect_stats: bool,
    pub report: ReportConfig,
    pub limits: LimitsConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::preset(Preset::Default)
    }
}

impl DetectorConfig {
    /// Complete configuration for a preset
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            check_atomics: true,
            strict_sync: true,
            pause_on_race: false,
            collect_stats: false,
            report: ReportConfig::default(),
            limits: LimitsConfig::default(),
        };
        match preset {
            Preset::Default => base,
            Preset::Strict => Self {
                pause_on_race: true,
                collect_stats: true,
                report: ReportConfig {
                    max_stack_depth: MAX_STACK_DEPTH_LIMIT,
                    ..base.report
                },
                ..base
            },
            Preset::Lenient => Self {
                check_atomics: false,
                strict_sync: false,
                ..base
            },
        }
    }

    pub fn with_pause_on_race(mut self, enabled: bool) -> Self {
        self.pause_on_race = enabled;
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.collect_stats = enabled;
        self
    }

    pub fn with_strict_sync(mut self, enabled: bool) -> Self {
        self.strict_sync = enabled;
        self
    }

    pub fn with_check_atomics(mut self, enabled: bool) -> Self {
        self.check_atomics = enabled;
        self
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Adjust the report section
    pub fn report(mut self, f: impl FnOnce(ReportConfig) -> ReportConfig) -> Self {
        self.report = f(self.report);
        self
    }

    /// Overlay the `FORKRACE_*` environment variables
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Overlay `FORKRACE_*` variables read through `lookup`
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        if let Some(color) = parse_env_bool(ENV_COLOR, &lookup)? {
            self.report.color = color;
        }
        if let Some(pause) = parse_env_bool(ENV_PAUSE_ON_RACE, &lookup)? {
            self.pause_on_race = pause;
        }
        if let Some(atomics) = parse_env_bool(ENV_CHECK_ATOMICS, &lookup)? {
            self.check_atomics = atomics;
        }
        self.validated()
    }
}

fn parse_env_bool(
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> ConfigResult<Option<bool>> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw,
        }),
    }
}

impl Validatable for DetectorConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.report.validate()?;
        self.limits.validate()
    }

    fn section(&self) -> &'static str {
        "detector"
    }
}

impl Validatable for ReportConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_stack_depth == 0 || self.max_stack_depth > MAX_STACK_DEPTH_LIMIT {
            return Err(ConfigError::range_with_hint(
                format!("{}.max_stack_depth", self.section()),
                self.max_stack_depth,
                1,
                MAX_STACK_DEPTH_LIMIT,
                "Reports need at least one frame per access",
            ));
        }
        if self.destination == ReportTarget::File {
            let empty = self
                .path
                .as_ref()
                .map(|p| p.as_os_str().is_empty())
                .unwrap_or(true);
            if empty {
                return Err(ConfigError::Validation(format!(
                    "{0}.destination is 'file' but {0}.path is empty",
                    self.section()
                )));
            }
        }
        Ok(())
    }

    fn section(&self) -> &'static str {
        "report"
    }
}

impl Validatable for LimitsConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_sync_regions == 0 || self.max_sync_regions > MAX_SYNC_REGIONS_LIMIT {
            return Err(ConfigError::range_with_hint(
                format!("{}.max_sync_regions", self.section()),
                self.max_sync_regions,
                1,
                MAX_SYNC_REGIONS_LIMIT,
                "Region ids index a per-frame table",
            ));
        }
        Ok(())
    }

    fn section(&self) -> &'static str {
        "limits"
    }
}

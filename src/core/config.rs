//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CalError, Result};
use crate::layout::capacity::DEFAULT_AT_RISK_PERCENT;
use crate::layout::columns::ClusterMode;
use crate::layout::grid::{DEFAULT_MIN_HEIGHT_PX, GridWindow};

/// Full calendar engine configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub layout: LayoutConfig,
    pub capacity: CapacityConfig,
    pub week: WeekConfig,
    pub telemetry: TelemetryConfig,
    pub paths: PathsConfig,
}

/// Visible time band of the day/week grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub pixels_per_hour: f64,
    /// Floor for block height so short sessions stay clickable.
    pub min_event_height_px: f64,
}

/// Column assignment behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    /// `pairwise` (default) or `connected`.
    pub cluster_mode: ClusterMode,
    /// Maximum memoized renders kept by long-lived callers.
    pub cache_entries: usize,
}

/// Capacity health thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CapacityConfig {
    /// Enrollment, as a percent of the minimum viable size, that still counts as at-risk.
    pub at_risk_percent: u32,
}

/// Calendar week conventions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WeekConfig {
    pub starts_on: Weekday,
}

/// Activity log behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub max_log_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by acal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
    pub jsonl_fallback: Option<PathBuf>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 21,
            pixels_per_hour: 80.0,
            min_event_height_px: DEFAULT_MIN_HEIGHT_PX,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cluster_mode: ClusterMode::Pairwise,
            cache_entries: crate::layout::cache::DEFAULT_CACHE_ENTRIES,
        }
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            at_risk_percent: DEFAULT_AT_RISK_PERCENT,
        }
    }
}

impl Default for WeekConfig {
    fn default() -> Self {
        Self {
            starts_on: Weekday::Mon,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_log_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[ACAL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("acal").join("config.toml");
        let data = home_dir.join(".local").join("share").join("acal");
        Self {
            config_file: cfg,
            jsonl_log: data.join("activity.jsonl"),
            jsonl_fallback: None,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_var)
    }

    /// [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| CalError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(CalError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for log correlation.
    ///
    /// FNV-1a over canonical JSON, stable across processes and toolchains.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// The validated grid window described by the `[grid]` section.
    pub fn grid_window(&self) -> Result<GridWindow> {
        GridWindow::new(
            self.grid.start_hour,
            self.grid.end_hour,
            self.grid.pixels_per_hour,
        )?
        .with_min_height(self.grid.min_event_height_px)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // grid
        if let Some(raw) = lookup("ACAL_GRID_START_HOUR") {
            self.grid.start_hour = parse_env("ACAL_GRID_START_HOUR", &raw)?;
        }
        if let Some(raw) = lookup("ACAL_GRID_END_HOUR") {
            self.grid.end_hour = parse_env("ACAL_GRID_END_HOUR", &raw)?;
        }
        if let Some(raw) = lookup("ACAL_GRID_PIXELS_PER_HOUR") {
            self.grid.pixels_per_hour = parse_env("ACAL_GRID_PIXELS_PER_HOUR", &raw)?;
        }
        if let Some(raw) = lookup("ACAL_GRID_MIN_EVENT_HEIGHT_PX") {
            self.grid.min_event_height_px = parse_env("ACAL_GRID_MIN_EVENT_HEIGHT_PX", &raw)?;
        }

        // layout
        if let Some(raw) = lookup("ACAL_LAYOUT_CLUSTER_MODE") {
            self.layout.cluster_mode =
                raw.parse::<ClusterMode>()
                    .map_err(|details| CalError::ConfigParse {
                        context: "env",
                        details: format!("ACAL_LAYOUT_CLUSTER_MODE={raw:?}: {details}"),
                    })?;
        }
        if let Some(raw) = lookup("ACAL_LAYOUT_CACHE_ENTRIES") {
            self.layout.cache_entries = parse_env("ACAL_LAYOUT_CACHE_ENTRIES", &raw)?;
        }

        // capacity
        if let Some(raw) = lookup("ACAL_CAPACITY_AT_RISK_PERCENT") {
            self.capacity.at_risk_percent = parse_env("ACAL_CAPACITY_AT_RISK_PERCENT", &raw)?;
        }

        // week
        if let Some(raw) = lookup("ACAL_WEEK_STARTS_ON") {
            self.week.starts_on = raw
                .trim()
                .parse::<Weekday>()
                .map_err(|error| CalError::ConfigParse {
                    context: "env",
                    details: format!("ACAL_WEEK_STARTS_ON={raw:?}: {error}"),
                })?;
        }

        // telemetry
        if let Some(raw) = lookup("ACAL_TELEMETRY_ENABLED") {
            self.telemetry.enabled = parse_env("ACAL_TELEMETRY_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("ACAL_TELEMETRY_MAX_LOG_BYTES") {
            self.telemetry.max_log_bytes = parse_env("ACAL_TELEMETRY_MAX_LOG_BYTES", &raw)?;
        }

        // paths
        if let Some(raw) = lookup("ACAL_PATHS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.grid_window().map_err(|err| CalError::InvalidConfig {
            details: format!("grid: {err}"),
        })?;
        if self.capacity.at_risk_percent > 100 {
            return Err(CalError::InvalidConfig {
                details: format!(
                    "capacity.at_risk_percent must be in [0, 100], got {}",
                    self.capacity.at_risk_percent
                ),
            });
        }
        if self.layout.cache_entries == 0 {
            return Err(CalError::InvalidConfig {
                details: "layout.cache_entries must be >= 1".to_string(),
            });
        }
        if self.telemetry.enabled
            && (self.telemetry.max_log_bytes == 0 || self.telemetry.max_rotated_files == 0)
        {
            return Err(CalError::InvalidConfig {
                details: "telemetry.max_log_bytes and telemetry.max_rotated_files must be > 0"
                    .to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| CalError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

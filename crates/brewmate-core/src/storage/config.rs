//! TOML-based application configuration.
//!
//! Holds the knobs that are not part of the tea data itself:
//! - Timing loop granularity
//! - Log filter used when `RUST_LOG` is unset
//! - Report image width
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::write_atomic;
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::{clamp_resolution, MAX_SLEEP_RESOLUTION, MIN_SLEEP_RESOLUTION};

/// Timing loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_sleep_resolution_ms")]
    pub sleep_resolution_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, e.g. `info` or `brewmate_core=debug`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Daily report rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_width")]
    pub width: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_sleep_resolution_ms() -> u64 {
    100
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_report_width() -> u32 {
    800
}

/// Narrowest report that still fits a card.
pub const MIN_REPORT_WIDTH: u32 = 400;

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            sleep_resolution_ms: default_sleep_resolution_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            width: default_report_width(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                        .into(),
                ),
                serde_json::Value::Object(_) => return Err(unknown()),
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::flatten(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    /// Load from `path`, writing the defaults there if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(ConfigError::from)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::storage(path, e)),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::from)?;
        write_atomic(path, content.as_bytes())
    }

    /// Load from `path`, returning defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. The caller persists with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or falls outside its allowed range.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf setting as `(dot.key, value)`, sorted by key.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::flatten("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Restore every setting to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Timing loop granularity, clamped into the supported range.
    pub fn sleep_resolution(&self) -> Duration {
        clamp_resolution(Duration::from_millis(self.timer.sleep_resolution_ms))
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        let ms = self.timer.sleep_resolution_ms;
        let min = MIN_SLEEP_RESOLUTION.as_millis() as u64;
        let max = MAX_SLEEP_RESOLUTION.as_millis() as u64;
        if !(min..=max).contains(&ms) {
            return Err(ConfigError::InvalidValue {
                key: "timer.sleep_resolution_ms".into(),
                message: format!("must be between {min} and {max}, got {ms}"),
            });
        }
        if self.report.width < MIN_REPORT_WIDTH {
            return Err(ConfigError::InvalidValue {
                key: "report.width".into(),
                message: format!("must be at least {MIN_REPORT_WIDTH}"),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "logging.filter".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

//! TOML-based application configuration.
//!
//! Stores tuning that is not a user preference:
//! - Reminder scheduler constants (fallback delay, minimum delay, drift threshold)
//! - Logging level
//!
//! Configuration is stored at `~/.config/moneyminder/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use super::json_path;
use crate::error::ConfigError;

/// Reminder scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay applied when a target is in the past or unparseable.
    #[serde(default = "default_fallback_delay_secs")]
    pub fallback_delay_secs: u64,
    /// Smallest delay ever handed to the platform.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,
    /// Late deliveries beyond this trigger the drift warning.
    #[serde(default = "default_drift_threshold_secs")]
    pub drift_threshold_secs: u64,
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/moneyminder/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_fallback_delay_secs() -> u64 {
    60
}
fn default_min_delay_secs() -> u64 {
    5
}
fn default_drift_threshold_secs() -> u64 {
    60
}
fn default_channel_id() -> String {
    "reminders".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl SchedulerConfig {
    /// Upper bound for every `*_secs` field: one week.
    pub const MAX_SECS: u64 = 7 * 24 * 60 * 60;

    /// Check that every delay is within `0..=MAX_SECS` and the minimum
    /// delay is at least one second.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("scheduler.fallback_delay_secs", self.fallback_delay_secs),
            ("scheduler.min_delay_secs", self.min_delay_secs),
            ("scheduler.drift_threshold_secs", self.drift_threshold_secs),
        ];
        for (key, value) in fields {
            if value > Self::MAX_SECS {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{value} exceeds the maximum of {} seconds", Self::MAX_SECS),
                });
            }
        }
        if self.min_delay_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.min_delay_secs".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fallback_delay_secs: default_fallback_delay_secs(),
            min_delay_secs: default_min_delay_secs(),
            drift_threshold_secs: default_drift_threshold_secs(),
            channel_id: default_channel_id(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from a specific path, writing defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.scheduler.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Persist to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = json_path::get(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or a scheduler delay falls outside its allowed range. On error the
    /// config is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        json_path::set(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.scheduler.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unreadable, using defaults");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = AppConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.scheduler.fallback_delay_secs, 60);
        assert_eq!(parsed.scheduler.min_delay_secs, 5);
        assert_eq!(parsed.scheduler.drift_threshold_secs, 60);
        assert_eq!(parsed.scheduler.channel_id, "reminders");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: AppConfig = toml::from_str("[scheduler]\nmin_delay_secs = 10\n").unwrap();
        assert_eq!(parsed.scheduler.min_delay_secs, 10);
        assert_eq!(parsed.scheduler.fallback_delay_secs, 60);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("scheduler.min_delay_secs").as_deref(), Some("5"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("info"));
        assert!(cfg.get("scheduler.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_string() {
        let mut cfg = AppConfig::default();
        cfg.set("scheduler.drift_threshold_secs", "120").unwrap();
        cfg.set("logging.level", "debug").unwrap();
        assert_eq!(cfg.scheduler.drift_threshold_secs, 120);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_value() {
        let mut cfg = AppConfig::default();
        assert!(matches!(
            cfg.set("scheduler.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("scheduler.min_delay_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn set_rejects_out_of_range_delays() {
        let mut cfg = AppConfig::default();
        for key in [
            "scheduler.fallback_delay_secs",
            "scheduler.min_delay_secs",
            "scheduler.drift_threshold_secs",
        ] {
            match cfg.set(key, "10000000000000000") {
                Err(ConfigError::InvalidValue { key: rejected, .. }) => assert_eq!(rejected, key),
                other => panic!("expected InvalidValue for {key}, got {other:?}"),
            }
            assert!(cfg.set(key, "-1").is_err());
        }
        assert!(cfg.set("scheduler.min_delay_secs", "0").is_err());
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn set_accepts_the_upper_bound() {
        let mut cfg = AppConfig::default();
        let max = SchedulerConfig::MAX_SECS.to_string();
        cfg.set("scheduler.drift_threshold_secs", &max).unwrap();
        cfg.set("scheduler.fallback_delay_secs", "0").unwrap();
        assert_eq!(cfg.scheduler.drift_threshold_secs, SchedulerConfig::MAX_SECS);
        assert_eq!(cfg.scheduler.fallback_delay_secs, 0);
    }

    #[test]
    fn load_from_rejects_out_of_range_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\ndrift_threshold_secs = 4611686018427387903\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("scheduler.min_delay_secs", "8").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().scheduler.min_delay_secs, 8);
    }

    #[test]
    fn load_from_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}

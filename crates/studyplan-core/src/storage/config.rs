//! TOML-based application configuration.
//!
//! Stores planner settings:
//! - Planning zone, day window and daily target
//! - Placeholder sizing and cutoff
//! - Calendar fetch timeout and user agent
//! - Default technique and view
//! - Output labels
//!
//! Configuration is stored at `~/.config/studyplan/config.toml`.

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::scheduler::SchedulerConfig;

/// Planning window and engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// IANA zone name
    pub timezone: String,
    /// `HH:MM`
    pub day_start: String,
    /// `HH:MM`
    pub day_end: String,
    pub daily_target_minutes: i64,
    pub min_block_minutes: i64,
    pub merge_gap_seconds: i64,
    pub placeholder_minutes: i64,
    pub placeholder_cutoff_hour: u32,
    pub all_day_events_busy: bool,
}

/// Calendar URL retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Defaults for omitted request fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub technique: String,
    pub view: String,
}

/// User-visible labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub generic_subject: String,
    pub placeholder_prefix: String,
    pub no_blocks: String,
    pub calendar_name: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyplan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Stockholm".into(),
            day_start: "08:00".into(),
            day_end: "20:00".into(),
            daily_target_minutes: 180,
            min_block_minutes: 15,
            merge_gap_seconds: 60,
            placeholder_minutes: 30,
            placeholder_cutoff_hour: 17,
            all_day_events_busy: false,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            user_agent: concat!("studyplan/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            technique: crate::technique::DEFAULT_TECHNIQUE.into(),
            view: "weekly".into(),
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            generic_subject: "General".into(),
            placeholder_prefix: "Unscheduled".into(),
            no_blocks: "No blocks".into(),
            calendar_name: "Study Plan".into(),
        }
    }
}

fn parse_clock(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}' is not HH:MM ({e})"),
    })
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
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
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
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(format!("'{value}': {e}")))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<i64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("not a leaf key".to_string()));
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/studyplan"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Change a value in memory.
    ///
    /// The updated configuration must still convert into a scheduler
    /// configuration; otherwise nothing changes.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.scheduler_config()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    /// Immutable engine settings derived from this file.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        let p = &self.planning;
        let timezone: Tz = p.timezone.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: "planning.timezone".to_string(),
            message: format!("{e}"),
        })?;
        let day_start = parse_clock("planning.day_start", &p.day_start)?;
        let day_end = parse_clock("planning.day_end", &p.day_end)?;
        if day_start >= day_end {
            return Err(ConfigError::InvalidValue {
                key: "planning.day_end".to_string(),
                message: format!("{} is not after {}", p.day_end, p.day_start),
            });
        }
        if p.placeholder_cutoff_hour > 24 {
            return Err(ConfigError::InvalidValue {
                key: "planning.placeholder_cutoff_hour".to_string(),
                message: "must be between 0 and 24".to_string(),
            });
        }

        Ok(SchedulerConfig {
            timezone,
            day_start,
            day_end,
            daily_target_minutes: p.daily_target_minutes.max(0),
            min_block_minutes: p.min_block_minutes.max(1),
            merge_gap: Duration::seconds(p.merge_gap_seconds.max(0)),
            placeholder_minutes: p.placeholder_minutes.max(1),
            placeholder_cutoff_hour: p.placeholder_cutoff_hour,
            all_day_events_busy: p.all_day_events_busy,
            generic_subject: self.labels.generic_subject.clone(),
            placeholder_prefix: self.labels.placeholder_prefix.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[planning]\nday_start = \"09:00\"\n").unwrap();
        assert_eq!(parsed.planning.day_start, "09:00");
        assert_eq!(parsed.planning.day_end, "20:00");
        assert_eq!(parsed.fetch.timeout_secs, 12);
        assert_eq!(parsed.labels.calendar_name, "Study Plan");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("planning.day_start").as_deref(), Some("08:00"));
        assert_eq!(cfg.get("planning.daily_target_minutes").as_deref(), Some("180"));
        assert_eq!(cfg.get("planning.all_day_events_busy").as_deref(), Some("false"));
        assert!(cfg.get("planning.missing_key").is_none());
        assert!(cfg.get("planning").is_none());
    }

    #[test]
    fn update_changes_typed_values() {
        let mut cfg = Config::default();
        cfg.update("planning.daily_target_minutes", "120").unwrap();
        cfg.update("planning.all_day_events_busy", "true").unwrap();
        cfg.update("labels.placeholder_prefix", "Ej schemalagt").unwrap();
        assert_eq!(cfg.planning.daily_target_minutes, 120);
        assert!(cfg.planning.all_day_events_busy);
        assert_eq!(cfg.labels.placeholder_prefix, "Ej schemalagt");
    }

    #[test]
    fn update_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.update("planning.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.update("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn update_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.update("planning.all_day_events_busy", "maybe").is_err());
        assert!(cfg.update("planning.min_block_minutes", "ten").is_err());
    }

    #[test]
    fn update_rejects_values_the_engine_cannot_use() {
        let mut cfg = Config::default();
        assert!(cfg.update("planning.timezone", "Mars/Olympus").is_err());
        assert!(cfg.update("planning.day_end", "07:00").is_err());
        assert!(cfg.update("planning.day_start", "8am").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn scheduler_config_from_defaults() {
        let sc = Config::default().scheduler_config().unwrap();
        assert_eq!(sc.timezone, chrono_tz::Europe::Stockholm);
        assert_eq!(sc.day_start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(sc.day_end, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
        assert_eq!(sc.merge_gap, Duration::seconds(60));
        assert_eq!(sc.placeholder_prefix, "Unscheduled");
    }

    #[test]
    fn entries_list_every_leaf() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("fetch.timeout_secs".to_string(), "12".to_string())));
        assert!(entries.contains(&("defaults.view".to_string(), "weekly".to_string())));
        assert!(entries.iter().all(|(k, _)| k.contains('.')));
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.update("planning.day_end", "18:30").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.planning.day_end, "18:30");
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn load_from_broken_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "planning = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseFailed(_))));
    }
}

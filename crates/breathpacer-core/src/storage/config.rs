//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default technique and session length
//! - Pacer timing (settle delay, display refresh)
//! - Cue playback and volume
//! - Terminal output options
//! - Additional user-defined techniques
//!
//! Configuration is stored at `~/.config/breathpacer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::pacer::{SessionOptions, DEFAULT_DISPLAY_TICK_MS, DEFAULT_SETTLE_DELAY_MS};
use crate::technique::{Catalog, Technique};

/// Display refreshes faster than this only burn CPU.
const MIN_DISPLAY_TICK_MS: u64 = 10;

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_technique")]
    pub default_technique: String,
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_display_tick_ms")]
    pub display_tick_ms: u64,
}

/// Cue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

/// Terminal output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tint the orb with the phase colour (truecolor escapes).
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_true")]
    pub show_cycles: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathpacer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Techniques offered next to the built-in ones.
    #[serde(default)]
    pub custom_techniques: Vec<Technique>,
}

// Default functions
fn default_technique() -> String {
    "5-5".into()
}
fn default_duration_secs() -> u32 {
    300
}
fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}
fn default_display_tick_ms() -> u64 {
    DEFAULT_DISPLAY_TICK_MS
}
fn default_true() -> bool {
    true
}
fn default_volume() -> f64 {
    crate::audio::DEFAULT_VOLUME
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_technique: default_technique(),
            default_duration_secs: default_duration_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            display_tick_ms: default_display_tick_ms(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_cycles: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            audio: AudioConfig::default(),
            ui: UiConfig::default(),
            custom_techniques: Vec::new(),
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
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("cannot parse '{value}' as bool: {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        if let Err(e) = cfg.validate() {
            tracing::warn!(path = %path.display(), "config loaded with invalid values: {e}");
        }
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// The new value must parse as the type of the value it replaces and
    /// the resulting config must validate; otherwise nothing changes.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check values the pacer relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session.default_duration_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "session.default_duration_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.session.display_tick_ms < MIN_DISPLAY_TICK_MS {
            return Err(ValidationError::InvalidValue {
                field: "session.display_tick_ms".into(),
                message: format!("must be at least {MIN_DISPLAY_TICK_MS}"),
            });
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ValidationError::InvalidValue {
                field: "audio.volume".into(),
                message: "must be between 0.0 and 1.0".into(),
            });
        }
        let catalog = self.catalog()?;
        catalog.require(&self.session.default_technique)?;
        Ok(())
    }

    /// Built-in techniques plus `custom_techniques`.
    pub fn catalog(&self) -> Result<Catalog, ValidationError> {
        Catalog::with_custom(self.custom_techniques.clone())
    }

    /// Look up `id`, or `session.default_technique` when `id` is `None`,
    /// in the built-in plus custom techniques.
    pub fn technique(&self, id: Option<&str>) -> Result<Technique> {
        let catalog = self.catalog()?;
        let id = id.unwrap_or(&self.session.default_technique);
        Ok(catalog.require(id)?.clone())
    }

    /// Pacer options derived from this config.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            settle_delay_ms: self.session.settle_delay_ms,
            display_tick_ms: self.session.display_tick_ms.max(MIN_DISPLAY_TICK_MS),
            volume: self.audio.volume,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

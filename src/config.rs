//! Configuration file support for memomo.
//!
//! Preferences cover logging, debounce timing, gesture tuning and print
//! layout. Every field has a default, so partial files load cleanly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_NOTE_HEADER_PX, DEFAULT_REORDER_THRESHOLD_PX, debounce, print,
};
use crate::geometry::Size;

/// Verbosity of the `log` facade, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Config file format version written by this build.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemomoConfig {
    pub version: u32,

    #[serde(default)]
    pub preferences: Preferences,
}

/// Tunables for a session and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Quiet period before structural edits are saved
    #[serde(default = "default_meta_debounce_ms")]
    pub meta_debounce_ms: u64,

    /// Quiet period before note edits are saved
    #[serde(default = "default_notes_debounce_ms")]
    pub notes_debounce_ms: u64,

    /// Quiet period before a viewport resize triggers a re-render
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,

    /// Pointer travel before a thumbnail press becomes a reorder
    #[serde(default = "default_reorder_threshold_px")]
    pub reorder_threshold_px: f64,

    /// Height of the note header strip
    #[serde(default = "default_note_header_px")]
    pub note_header_px: f64,

    /// Printable sheet size in CSS pixels
    #[serde(default = "default_print_sheet")]
    pub print_sheet: Size,

    /// Override for the local store directory
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

fn default_meta_debounce_ms() -> u64 {
    debounce::META_MS
}

fn default_notes_debounce_ms() -> u64 {
    debounce::NOTES_MS
}

fn default_resize_debounce_ms() -> u64 {
    debounce::RESIZE_MS
}

fn default_reorder_threshold_px() -> f64 {
    DEFAULT_REORDER_THRESHOLD_PX
}

fn default_note_header_px() -> f64 {
    DEFAULT_NOTE_HEADER_PX
}

fn default_print_sheet() -> Size {
    Size::new(print::SHEET_WIDTH_PX, print::SHEET_HEIGHT_PX)
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            meta_debounce_ms: default_meta_debounce_ms(),
            notes_debounce_ms: default_notes_debounce_ms(),
            resize_debounce_ms: default_resize_debounce_ms(),
            reorder_threshold_px: default_reorder_threshold_px(),
            note_header_px: default_note_header_px(),
            print_sheet: default_print_sheet(),
            store_dir: None,
        }
    }
}

impl Preferences {
    /// Meta save delay.
    pub fn meta_debounce(&self) -> Duration {
        Duration::from_millis(self.meta_debounce_ms)
    }

    /// Notes save delay.
    pub fn notes_debounce(&self) -> Duration {
        Duration::from_millis(self.notes_debounce_ms)
    }

    /// Viewport re-render delay.
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl MemomoConfig {
    /// Current-version config with default preferences.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
        }
    }

    /// Pretty JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a config file, refusing formats newer than this build knows.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// File name under the config directory.
    pub fn default_filename() -> &'static str {
        "memomo-config.json"
    }

    /// `<config dir>/memomo/memomo-config.json`, or under `~/.config` when
    /// the platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(base.join("memomo").join(Self::default_filename()))
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load `path`. A missing file is silent; an unreadable or invalid one
    /// is logged. Either way the caller falls back to defaults.
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.is_file() {
            log::debug!("No config at {:?}, using defaults", path);
            return None;
        }
        match Self::read(path) {
            Ok(config) => {
                log::info!("Config loaded from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Ignoring config {:?}: {}", path, e);
                None
            }
        }
    }

    /// Load the config from its default location, if present and readable.
    pub fn load_from_default_path() -> Option<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Save to the default location.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }
}

impl Default for MemomoConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u32, supported: u32 },

    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("no config directory on this platform")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.meta_debounce(), Duration::from_millis(200));
        assert_eq!(prefs.notes_debounce(), Duration::from_millis(150));
        assert_eq!(prefs.resize_debounce(), Duration::from_millis(60));
        assert_eq!(prefs.reorder_threshold_px, 6.0);
        assert_eq!(prefs.note_header_px, 36.0);
        assert_eq!(log::LevelFilter::from(prefs.log_level), log::LevelFilter::Info);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config =
            MemomoConfig::from_json(r#"{"version":1,"preferences":{"log_level":"debug"}}"#)
                .unwrap();
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert_eq!(config.preferences.notes_debounce_ms, 150);
        assert!(config.preferences.store_dir.is_none());

        let config = MemomoConfig::from_json(r#"{"version":1}"#).unwrap();
        assert_eq!(config.preferences, Preferences::default());
    }

    #[test]
    fn test_version_too_new() {
        let err = MemomoConfig::from_json(r#"{"version":99}"#).unwrap_err();
        assert!(matches!(err, ConfigError::VersionTooNew { found: 99, .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memomo-config.json");
        let mut config = MemomoConfig::new();
        config.preferences.meta_debounce_ms = 500;
        config.save_to(&path).unwrap();

        let loaded = MemomoConfig::load_from(&path).unwrap();
        assert_eq!(loaded.preferences.meta_debounce_ms, 500);
        assert!((loaded.preferences.print_sheet.w - config.preferences.print_sheet.w).abs() < 1e-9);
    }

    #[test]
    fn test_load_garbage_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memomo-config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(MemomoConfig::load_from(&path).is_none());
        assert!(MemomoConfig::load_from(&dir.path().join("missing.json")).is_none());
    }
}

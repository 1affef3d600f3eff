//! TOML-based configuration for the display host.
//!
//! Reads and writes [`AppConfig`] from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Pixmux\config.toml`
//! - Linux:    `~/.config/pixmux/config.toml`
//! - macOS:    `~/Library/Application Support/Pixmux/config.toml`
//!
//! A path given on the command line takes precedence.
//!
//! # Example
//!
//! ```toml
//! [display]
//! width = 64
//! height = 64
//! refresh_interval_ms = 1000
//!
//! [sink]
//! kind = "terminal"
//!
//! # One clock instance shared by both layouts keeps its state across switches.
//! [[plugins]]
//! id = "clock"
//! factory = "clock"
//! options = { show_seconds = true }
//!
//! [[layouts]]
//! name = "pattern"
//! plugins = [
//!     { factory = "test", x = 0, y = 0, width = 64, height = 64 },
//!     { shared = "clock", x = 0, y = 24, width = 64, height = 16, z_index = 1 },
//! ]
//!
//! [[layouts]]
//! name = "plain"
//! plugins = [{ shared = "clock", x = 0, y = 0, width = 32, height = 32 }]
//!
//! [rotation]
//! start_layout = "pattern"
//! interval_secs = 15
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default ...)]`, so the host runs
//! with an absent file and accepts a partial one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub display: DisplaySection,
    #[serde(default)]
    pub sink: SinkConfig,
    /// Plugin instances that may be referenced by several layouts.
    #[serde(default)]
    pub plugins: Vec<SharedPluginEntry>,
    #[serde(default = "default_layouts")]
    pub layouts: Vec<LayoutEntry>,
    #[serde(default)]
    pub rotation: RotationConfig,
}

/// Screen and refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplaySection {
    /// Screen width in pixels.
    #[serde(default = "default_screen_width")]
    pub width: u32,
    /// Screen height in pixels.
    #[serde(default = "default_screen_height")]
    pub height: u32,
    /// Outline every plugin region with a random colour.
    #[serde(default)]
    pub debug_borders: bool,
    /// Period of full redraws in milliseconds; `0` disables them.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where finished frames go.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// No output device.
    Headless,
    /// ANSI true-colour preview on stdout.
    #[default]
    Terminal,
    /// Overwrite a PNG file with every frame.
    Png,
}

/// Display sink selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,
    /// Output file for the `png` sink.
    #[serde(default = "default_png_path")]
    pub path: PathBuf,
}

/// A named plugin instance shared between layouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedPluginEntry {
    /// Name layouts use to refer to this instance.
    pub id: String,
    /// Registered factory name (e.g. `"clock"`).
    pub factory: String,
    /// Factory-specific options.
    #[serde(default)]
    pub options: toml::Table,
    /// Size handed to the factory; defaults to the screen size.  Each layout
    /// resizes the instance to its own placement before drawing it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One named layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutEntry {
    pub name: String,
    #[serde(default)]
    pub plugins: Vec<LayoutPluginEntry>,
}

/// A plugin placed in a layout.
///
/// Exactly one of `shared` and `factory` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutPluginEntry {
    /// Reference to a [`SharedPluginEntry::id`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<String>,
    /// Factory for a plugin private to this layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    /// Options for `factory`; ignored for shared plugins.
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub options: toml::Table,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub z_index: i32,
}

/// Automatic cycling through layouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RotationConfig {
    /// Layout shown first; defaults to the first configured layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_layout: Option<String>,
    /// Seconds between layout switches; `0` never switches.
    #[serde(default)]
    pub interval_secs: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_screen_width() -> u32 {
    64
}
fn default_screen_height() -> u32 {
    64
}
fn default_refresh_interval_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_png_path() -> PathBuf {
    PathBuf::from("frame.png")
}
fn default_layouts() -> Vec<LayoutEntry> {
    vec![LayoutEntry {
        name: "main".to_string(),
        plugins: vec![
            LayoutPluginEntry {
                shared: None,
                factory: Some("test".to_string()),
                options: toml::Table::new(),
                x: 0,
                y: 0,
                width: default_screen_width(),
                height: default_screen_height(),
                z_index: 0,
            },
            LayoutPluginEntry {
                shared: None,
                factory: Some("clock".to_string()),
                options: toml::Table::new(),
                x: 0,
                y: 24,
                width: default_screen_width(),
                height: 16,
                z_index: 1,
            },
        ],
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display: DisplaySection::default(),
            sink: SinkConfig::default(),
            plugins: Vec::new(),
            layouts: default_layouts(),
            rotation: RotationConfig::default(),
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
            debug_borders: false,
            refresh_interval_ms: default_refresh_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            path: default_png_path(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config from the default location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Saves the config to the default location.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path` as pretty TOML, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory for this application.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Pixmux"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("pixmux"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Pixmux")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

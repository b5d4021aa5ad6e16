//! Layered configuration for the preview server.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - a TOML file (`.adoc-live.toml` in the working directory, otherwise
//!   `~/.adoc-live/settings.toml`, or an explicit path)
//! - environment variables
//! - CLI flags, applied by the caller after loading
//!
//! # Environment Variables
//!
//! Variables are prefixed with `ADOC_LIVE_`; a double underscore separates
//! nested levels:
//! - `ADOC_LIVE_SERVER__PORT=9000` sets `server.port`
//! - `ADOC_LIVE_WATCH__DEBOUNCE_MS=250` sets `watch.debounce_ms`
//! - `ADOC_LIVE_CONVERTER__COMMAND=/opt/bin/asciidoctor` sets `converter.command`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".adoc-live.toml";
const ENV_PREFIX: &str = "ADOC_LIVE_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ContentConfig {
    /// Content root. Relative paths resolve against the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Document file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names never descended into
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Polled by browser tabs while reconnecting
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quiet period before a modification is reported
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConverterConfig {
    /// Executable used to render documents
    #[serde(default = "default_command")]
    pub command: String,

    /// Extra arguments placed before the document path. Output is a
    /// standalone page by default so the stylesheet comes along; pass
    /// `--embedded` for a bare fragment.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_safe_mode")]
    pub safe_mode: String,

    /// Document attributes passed as `-a name=value`
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level applied to everything not listed in `modules`
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `tower_http = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_extensions() -> Vec<String> {
    vec!["adoc".to_string()]
}
fn default_excluded_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}
fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8081
}
fn default_health_path() -> String {
    "/ads-health".to_string()
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    100
}
fn default_command() -> String {
    "asciidoctor".to_string()
}
fn default_safe_mode() -> String {
    "safe".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: None,
            extensions: default_extensions(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            health_path: default_health_path(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            safe_mode: default_safe_mode(),
            attributes: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load from the default file locations and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(path),
            None => Self::figment(None).extract().map_err(|e| Box::new(e).into()),
        }
    }

    /// Load from a specific file and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::figment(Some(path.as_ref()))
            .extract()
            .map_err(|e| Box::new(e).into())
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        // Double underscore becomes a dot, single underscores stay in field names
        figment.merge(
            Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
        )
    }

    /// First existing config file: working directory, then home.
    pub fn find_config_file() -> Option<PathBuf> {
        let local = std::env::current_dir().ok()?.join(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        let global = dirs::home_dir()?.join(".adoc-live").join("settings.toml");
        global.is_file().then_some(global)
    }

    /// Content root resolved against `base` when relative.
    pub fn content_root(&self, base: &Path) -> PathBuf {
        match &self.content.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to a file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(write_err)
    }
}

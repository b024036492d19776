//! Configuration loading
//!
//! Bootstrap configuration comes from a TOML file located by priority:
//! 1. Command-line argument (highest priority)
//! 2. `CONFESS_CONFIG` environment variable
//! 3. Per-user config file (`~/.config/confessworld/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing per-user file is not an error. Individual remote settings can
//! be overridden by environment variables after the file is read.

use crate::verify::VerificationCodes;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CONFESS_CONFIG";
/// Environment override for `remote.url`
pub const REMOTE_URL_ENV_VAR: &str = "CONFESS_REMOTE_URL";
/// Environment override for `remote.anon_key`
pub const ANON_KEY_ENV_VAR: &str = "CONFESS_ANON_KEY";

/// Which gateway implementation backs the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted PostgREST-compatible service
    #[default]
    Http,
    /// Local SQLite file
    Sqlite,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Backend::Http),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown backend '{}' (expected 'http' or 'sqlite')",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Http => write!(f, "http"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub backend: Backend,
    pub remote: RemoteConfig,
    pub sqlite: SqliteConfig,
    /// Public origin used to build permalinks
    pub site_url: String,
    /// Replaces the built-in verification allow-list when present
    pub verification_codes: Option<Vec<String>>,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            remote: RemoteConfig::default(),
            sqlite: SqliteConfig::default(),
            site_url: "http://localhost:5173".to_string(),
            verification_codes: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Hosted service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Change-feed polling period
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            poll_interval_ms: 5000,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Local SQLite backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub path: Option<PathBuf>,
    /// Change-feed polling period for writes made by other processes
    pub poll_interval_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            poll_interval_ms: 1000,
        }
    }
}

impl SqliteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Configured database path, or the OS-dependent default
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_database_path)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `CONFESS_REMOTE_URL` / `CONFESS_ANON_KEY` if set and non-blank
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_blank_env(REMOTE_URL_ENV_VAR) {
            debug!("remote.url overridden by {}", REMOTE_URL_ENV_VAR);
            self.remote.url = url;
        }
        if let Some(key) = non_blank_env(ANON_KEY_ENV_VAR) {
            debug!("remote.anon_key overridden by {}", ANON_KEY_ENV_VAR);
            self.remote.anon_key = key;
        }
    }

    /// Allow-list from config, or the built-in default
    pub fn verification_codes(&self) -> VerificationCodes {
        match &self.verification_codes {
            Some(codes) => VerificationCodes::new(codes),
            None => VerificationCodes::default(),
        }
    }
}

/// Locate the configuration file
///
/// Explicit sources (CLI, environment) are returned even if the file does
/// not exist so the caller can report it; the per-user default is only
/// returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = non_blank_env(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: Per-user config file
    default_config_path().filter(|path| path.exists())
}

/// Resolve, read, and finalize the configuration
///
/// Falls back to compiled defaults when no file is found; an explicitly
/// named file that cannot be read is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => {
            let config = TomlConfig::load(&path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => {
            info!("No configuration file found, using defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Per-user config file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("confessworld").join("config.toml"))
}

/// OS-dependent default SQLite path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("confessworld").join("confessions.db"))
        .unwrap_or_else(|| PathBuf::from("./confessworld_data/confessions.db"))
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

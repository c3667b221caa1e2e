use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::persistence::{DEFAULT_DOCUMENT_PATH, EXPORT_FILENAME};

/// Resolve the data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. PC_BUILD_PATH environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. ~/.pc-build-planner
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("PC_BUILD_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("pc-build-planner"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".pc-build-planner"));
    }

    Err(BuildError::Config(
        "Could not determine data directory: no HOME or XDG data directory found".to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding the persisted build; defaults to `<data dir>/build.db`
    pub store_path: Option<PathBuf>,

    /// File path or http(s) URL of the default build document
    pub default_document: String,

    /// Name given to exported builds
    pub export_filename: String,

    /// Directory the HTTP server serves static files from
    pub static_dir: PathBuf,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Log file for the terminal editor; defaults to `<data dir>/pc-build.log`
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_path: None,
            default_document: DEFAULT_DOCUMENT_PATH.to_string(),
            export_filename: EXPORT_FILENAME.to_string(),
            static_dir: PathBuf::from("web"),
            bind_addr: "0.0.0.0:3000".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load from `$PC_BUILD_CONFIG`, else the default location
    pub fn load() -> Result<Self> {
        let path = match std::env::var("PC_BUILD_CONFIG") {
            Ok(explicit) => expand_tilde(&explicit),
            Err(_) => Self::default_path()?,
        };
        Self::load_from(&path)
    }

    /// Missing files yield the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        match dirs::config_dir() {
            Some(dir) => Ok(dir.join("pc-build-planner").join("config.toml")),
            None => Ok(resolve_data_dir(None)?.join("config.toml")),
        }
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(expand_tilde(&path.to_string_lossy())),
            None => Ok(resolve_data_dir(None)?.join("build.db")),
        }
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(expand_tilde(&path.to_string_lossy())),
            None => Ok(resolve_data_dir(None)?.join("pc-build.log")),
        }
    }
}

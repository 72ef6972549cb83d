use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::constants::{DEFAULT_ENDPOINT, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE};
use crate::core::session::SessionConfig;

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Read {
        path: PathBuf,
        source: io::Error,
    },

    /// The configuration file is not valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Application configuration, read once at startup.
///
/// Everything is optional in the file; a missing file yields the defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Base URL of the completions endpoint.
    pub endpoint: String,
    /// Default location for transcript dumps and history files.
    pub history_dir: PathBuf,
    /// Default location for system prompt files.
    pub prompt_dir: PathBuf,
    /// Session default overriding the built-in system prompt.
    pub system_prompt: Option<String>,
    /// Session default overriding the built-in sampling temperature.
    pub temperature: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            history_dir: PathBuf::from("history"),
            prompt_dir: PathBuf::from("prompt"),
            system_prompt: None,
            temperature: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    fn config_path() -> Option<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "peanut")?;
        Some(proj_dirs.config_dir().join("config.toml"))
    }

    /// Creates the storage directories if they do not exist yet.
    pub fn ensure_directories(&self) -> io::Result<()> {
        fs::create_dir_all(&self.history_dir)?;
        fs::create_dir_all(&self.prompt_dir)
    }

    /// Session defaults derived from the file, falling back to the
    /// built-in prompt and temperature.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(
            self.system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        )
    }
}

//! Config file discovery and loading.
//!
//! The first file found wins:
//! 1. `--config <path>` / `TESSERA_CONFIG`
//! 2. `./tessera.toml` (project-local)
//! 3. `<user config dir>/tessera/config.toml`
//! 4. Built-in defaults
//!
//! CLI flags are applied on top by the individual commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_session::RegistryConfig;

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "tessera.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "tessera";

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The `[session]` table was rejected by the registry.
    #[error("invalid [session] settings: {0}")]
    Session(#[from] tessera_session::Error),
}

/// Root configuration file.
///
/// ```toml
/// [session]
/// max_sessions = 10000
/// sweep_policy = "external"
/// sweep_interval_secs = 60
///
/// [logging]
/// filter = "tessera=debug"
/// json = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Session registry settings.
    pub session: RegistryConfig,

    /// Console logging settings.
    pub logging: LoggingConfig,
}

impl TesseraConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.session.validate()?;
        Ok(config)
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Console logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Emit log lines as JSON.
    pub json: bool,
}

/// A loaded config and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The effective configuration.
    pub config: TesseraConfig,

    /// File the config was read from; `None` means built-in defaults.
    pub source: Option<PathBuf>,
}

/// Load configuration, honoring an explicit path if given.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    let project_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover(&project_dir, user_config_path())
}

/// Load a specific config file.
pub fn load_config_file(path: &Path) -> Result<LoadedConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let config = TesseraConfig::from_toml(&text)?;

    Ok(LoadedConfig {
        config,
        source: Some(path.to_path_buf()),
    })
}

/// Path of the user-level config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(USER_CONFIG_FILE))
}

fn discover(project_dir: &Path, user_config: Option<PathBuf>) -> Result<LoadedConfig> {
    let project_config = project_dir.join(PROJECT_CONFIG_FILE);
    let candidates = std::iter::once(project_config).chain(user_config);

    for path in candidates {
        if path.is_file() {
            return load_config_file(&path);
        }
    }

    Ok(LoadedConfig {
        config: TesseraConfig::default(),
        source: None,
    })
}

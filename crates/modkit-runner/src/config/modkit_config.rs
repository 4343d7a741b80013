use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::{fs, io};

use directories::ProjectDirs;
use modkit_events::{KeyCode, KeyParseError};
use modkit_host::RunnerOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::{logging_config::LoggingConfig, scripting_config::ScriptingConfig};

/// Hotkey value that leaves a script without a binding
const UNBOUND: &str = "none";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Could not determine the config directory")]
    NoConfigDir,
    #[error("IO error on config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid hotkey for {script}: {source}")]
    InvalidHotkey {
        script: String,
        #[source]
        source: KeyParseError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModkitConfig {
    #[serde(default)]
    pub scripting: ScriptingConfig,

    /// Script ID -> key name, or "none" to unbind
    #[serde(default)]
    pub hotkeys: BTreeMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ModkitConfig {
    /// `<config_dir>/config.toml` for the platform
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "modkit")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the config, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(ConfigError::NotFound(path)) => {
                info!(target: "config", "No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!(target: "config", "{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        info!(target: "config", "Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_error)?;
        info!(target: "config", "Saved config to {}", path.display());
        Ok(())
    }

    /// Parsed `[hotkeys]` table. `None` means the script is explicitly unbound.
    pub fn hotkey_overrides(&self) -> Result<HashMap<String, Option<KeyCode>>, ConfigError> {
        let mut overrides = HashMap::with_capacity(self.hotkeys.len());

        for (script, name) in &self.hotkeys {
            let key = if name.trim().eq_ignore_ascii_case(UNBOUND) {
                None
            } else {
                let key = name
                    .parse::<KeyCode>()
                    .map_err(|source| ConfigError::InvalidHotkey {
                        script: script.clone(),
                        source,
                    })?;
                Some(key)
            };
            overrides.insert(script.clone(), key);
        }

        Ok(overrides)
    }

    /// Options for building the script runner out of the registry
    pub fn to_runner_options(&self) -> Result<RunnerOptions, ConfigError> {
        Ok(RunnerOptions {
            notification_timeout: self.scripting.notification_timeout(),
            hotkey_overrides: self.hotkey_overrides()?,
            disabled: self.scripting.disabled_scripts.iter().cloned().collect(),
        })
    }
}

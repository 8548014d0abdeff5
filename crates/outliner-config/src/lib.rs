//! Settings for the outliner tools, kept in `~/.config/outliner/config.toml`.
//!
//! ```toml
//! notes_path = "~/notes"
//! start_page = "Contents"
//! collapse_state_path = "$XDG_STATE_HOME/outliner/collapsed.json"
//! ```
//!
//! Paths may use `~` and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR: &str = "~/.config/outliner";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No notes directory given and no config file at {0}")]
    NoNotesPath(PathBuf),
}

fn default_start_page() -> String {
    "Contents".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub notes_path: PathBuf,
    /// Page opened when no page is named.
    #[serde(default = "default_start_page")]
    pub start_page: String,
    /// Where collapsed-block flags are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_state_path: Option<PathBuf>,
}

impl Config {
    pub fn new(notes_path: impl Into<PathBuf>) -> Self {
        Self {
            notes_path: notes_path.into(),
            start_page: default_start_page(),
            collapse_state_path: None,
        }
    }

    /// Settings from the config file, with `notes_override` taking precedence
    /// over its `notes_path`. Without either there is nothing to open.
    pub fn resolve(notes_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve_from_path(Self::config_path(), notes_override)
    }

    pub fn resolve_from_path<P: AsRef<Path>>(
        config_path: P,
        notes_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        match (Self::load_from_path(config_path)?, notes_override) {
            (Some(config), Some(notes_path)) => Ok(Self {
                notes_path,
                ..config
            }),
            (Some(config), None) => Ok(config),
            (None, Some(notes_path)) => Ok(Self::new(notes_path)),
            (None, None) => Err(ConfigError::NoNotesPath(config_path.to_path_buf())),
        }
    }

    /// `None` when there is no config file.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config.expanded()))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(CONFIG_DIR).as_ref()).join(CONFIG_FILE)
    }

    /// The collapse flag file, falling back to one inside the notes directory.
    pub fn collapse_state_file(&self) -> PathBuf {
        self.collapse_state_path
            .clone()
            .unwrap_or_else(|| self.notes_path.join(".outliner").join("collapsed.json"))
    }

    /// Expand `~` and environment variables; paths that fail to expand are
    /// kept as written.
    fn expanded(self) -> Self {
        Self {
            notes_path: expand_path(self.notes_path),
            collapse_state_path: self.collapse_state_path.map(expand_path),
            ..self
        }
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    match shellexpand::full(&path.to_string_lossy()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path,
    }
}

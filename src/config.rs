//! Configuration management for layerlog
//!
//! Every [`LogBuffer`](crate::logging::LogBuffer) owns its own [`BufferConfig`];
//! there is no process-wide mutable state. Applications that want a shared
//! default can load one from `~/.layerlog/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::Level;

/// Default maximum number of retained messages
pub const DEFAULT_MAX_CAPACITY: usize = 49_999;

/// Per-buffer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Identifying name of the buffer, shown by viewers
    #[serde(default = "default_name")]
    pub name: String,

    /// Maximum retained messages; 0 means unbounded (default: 49_999)
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,

    /// Keep only the most recent message for each distinct content
    #[serde(default)]
    pub dedup: bool,

    /// Minimum level mirrored to the sink (default: info)
    #[serde(default)]
    pub verbosity: Level,
}

fn default_name() -> String {
    "layerlog".to_string()
}

fn default_max_capacity() -> usize {
    DEFAULT_MAX_CAPACITY
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_capacity: default_max_capacity(),
            dedup: false,
            verbosity: Level::default(),
        }
    }
}

impl BufferConfig {
    /// Create a default configuration with the given buffer name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Level) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Whether a capacity limit is in effect
    pub fn is_bounded(&self) -> bool {
        self.max_capacity > 0
    }

    /// Load configuration from the default file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a file, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the base configuration directory (~/.layerlog)
/// Falls back to ./.layerlog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".layerlog")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".layerlog"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

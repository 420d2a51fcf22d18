//! Workspace settings

use crate::{ConfigResult, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the built-in assets and the output archive
///
/// Relative paths are resolved against [`Settings::root_path`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Installation root that every relative path below is resolved against
    pub root_path: PathBuf,

    /// Tree of built-in bootstrap scripts mirrored into the archive root
    pub node_scripts_dir: PathBuf,

    /// Directory whose subdirectories are the built-in plugins
    pub base_plugins_dir: PathBuf,

    /// Utility source file copied to the archive root on every build
    pub utility_file: PathBuf,

    /// Default destination of the node-data archive
    pub destination: PathBuf,

    /// Base-name globs skipped while mirroring the node scripts tree
    pub node_script_exclusions: Vec<String>,

    /// Initial log level
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            node_scripts_dir: PathBuf::from("node_scripts"),
            base_plugins_dir: PathBuf::from("base_plugins"),
            utility_file: PathBuf::from("utils/command_builder.py"),
            destination: PathBuf::from("tmp/node-scripts.zip"),
            node_script_exclusions: vec!["*.pyc".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Default settings rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
            ..Self::default()
        }
    }

    /// Parse settings from JSON bytes; empty input yields the defaults
    pub fn from_json(bytes: &[u8]) -> ConfigResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse settings from a TOML document; empty input yields the defaults
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML settings file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn node_scripts_path(&self) -> PathBuf {
        self.resolve(&self.node_scripts_dir)
    }

    pub fn base_plugins_path(&self) -> PathBuf {
        self.resolve(&self.base_plugins_dir)
    }

    pub fn utility_path(&self) -> PathBuf {
        self.resolve(&self.utility_file)
    }

    pub fn destination_path(&self) -> PathBuf {
        self.resolve(&self.destination)
    }

    /// Configured log level, falling back to `Info` for unknown names
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }
}

//! bootpack-core - Cluster configuration model and workspace settings
//!
//! This crate provides the types shared by every bootpack crate:
//! - [`ClusterConfiguration`] describing what goes into a node-data bundle
//! - [`RunOn`] for selecting which node role runs a script or plugin step
//! - [`Settings`] locating the built-in scripts, plugins and output archive
//! - [`ConfigError`] for configuration parsing errors

mod cluster;
mod config;
mod error;

pub use cluster::{
    ClusterConfiguration, CustomScript, PluginConfiguration, RunOn, SparkConfiguration,
    SshKeyPair, UserConfiguration,
};
pub use config::Settings;
pub use error::{ConfigError, ConfigResult};

/// Log levels understood by the logging setup
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    /// Parse a level name case-insensitively, `None` for unknown names
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ClusterConfiguration, ConfigError, CustomScript, LogLevel, PluginConfiguration, RunOn,
        Settings, SparkConfiguration, SshKeyPair, UserConfiguration,
    };
}

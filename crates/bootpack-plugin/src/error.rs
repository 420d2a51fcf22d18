//! Error types for plugin loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Error type for plugin loading and argument processing
#[derive(Error, Debug)]
pub enum PluginError {
    /// Plugin directory does not exist
    #[error("plugin cannot be loaded: path '{}' doesn't exist", .path.display())]
    NotFound { path: PathBuf },

    /// Plugin directory has no entry file
    #[error("plugin cannot be loaded: path '{}' doesn't contain an entry file {entry}", .path.display())]
    EntryPointMissing { path: PathBuf, entry: &'static str },

    /// Entry file does not provide a usable definition
    #[error("invalid plugin definition in '{}': {reason}", .path.display())]
    InvalidDefinition { path: PathBuf, reason: String },

    /// User-supplied arguments don't match the declared ones
    #[error("invalid arguments for plugin '{plugin}': {reason}")]
    InvalidArguments { plugin: String, reason: String },

    /// Another load of the same path has not finished
    #[error("plugin at '{}' is already loading", .path.display())]
    LoadInProgress { path: PathBuf },

    /// Filesystem error while reading a plugin
    #[error("I/O error reading plugin '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PluginError {
    pub(crate) fn invalid_definition(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PluginError::InvalidDefinition {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PluginError::Io {
            path: path.into(),
            source,
        }
    }
}

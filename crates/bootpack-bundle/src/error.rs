//! Error types for bundle operations.

use bootpack_plugin::PluginError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a node-data bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The archive could not be created, written or finalized.
    #[error("Storage error for {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive was already closed.
    #[error("Archive already closed: {}", .0.display())]
    ArchiveClosed(PathBuf),

    /// I/O error reading an input file.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declared input file does not exist.
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// A custom script does not exist.
    #[error("Custom script '{}' doesn't exist", .0.display())]
    InvalidCustomScript(PathBuf),

    /// A text-mode input is not valid UTF-8.
    #[error("Not a UTF-8 text file: {}", .0.display())]
    InvalidText(PathBuf),

    /// An exclusion glob could not be compiled.
    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    /// The cluster references a plugin that isn't loaded.
    #[error("Plugin '{0}' is not loaded")]
    UnknownPlugin(String),

    /// The cluster configuration can't be bundled as given.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The credential cipher failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Plugin contract violation.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl BundleError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}

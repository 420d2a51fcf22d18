//! Error types for configuration loading

use thiserror::Error;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration is malformed
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration is malformed
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

//! # bootpack
//!
//! Builds the node-data archive a cluster-bootstrap workflow ships to every
//! compute node: built-in node scripts, user custom scripts, plugin files and
//! their manifest, Spark configuration, and encrypted user credentials.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bootpack::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::with_root("/opt/bootpack");
//! let registry = bootpack::initialize(&settings)?;
//!
//! let mut cluster = ClusterConfiguration::new("spark-cluster");
//! cluster.plugins.push(PluginConfiguration::new("jupyter"));
//! let archive = BundleBuilder::new(&settings, &cluster, registry).build()?;
//! println!("wrote {}", archive.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`bootpack_core`] - Cluster configuration model and settings
//! - [`bootpack_plugin`] - Plugin definitions and the plugin registry
//! - [`bootpack_bundle`] - Archive writer and bundle builder
//! - [`bootpack_logging`] - Tracing subscriber setup

// Re-export core types
pub use bootpack_core::{
    ClusterConfiguration, ConfigError, ConfigResult, CustomScript, LogLevel, PluginConfiguration,
    RunOn, Settings, SparkConfiguration, SshKeyPair, UserConfiguration,
};

// Re-export plugin types
pub use bootpack_plugin::{
    ENTRY_POINT, LoadPolicy, LoadState, LoadSummary, PluginArgument, PluginDefinition,
    PluginError, PluginRegistry, PluginResult, global,
};

// Re-export bundle types
pub use bootpack_bundle::{
    ArchiveWriter, BundleBuilder, BundleError, BundleResult, CredentialCipher, EncryptedPassword,
    FileMode,
};

// Re-export logging
pub use bootpack_logging::{ReloadHandle, init_logging};

// Re-export common dependencies
pub use serde;
pub use tracing;

/// Process startup: install logging and load the built-in plugins
///
/// Logging is installed at `settings.log_level` unless a global subscriber
/// already exists. Built-in plugins are loaded fail-fast from
/// `settings.base_plugins_dir` into the process-wide registry; later calls
/// return that same registry.
pub fn initialize(settings: &Settings) -> PluginResult<&'static PluginRegistry> {
    if !init_logging(settings.log_level()) {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
    bootpack_plugin::initialize(settings.base_plugins_path())
}

/// Prelude module for convenient imports.
///
/// Use `use bootpack::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        BundleBuilder, BundleError, ClusterConfiguration, CredentialCipher, CustomScript,
        PluginConfiguration, PluginError, PluginRegistry, RunOn, Settings, SparkConfiguration,
        UserConfiguration,
    };
}

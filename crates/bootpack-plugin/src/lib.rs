//! bootpack-plugin - Plugin contract, loader and registry
//!
//! This crate provides:
//! - [`PluginDefinition`] describing the files and execute step a plugin adds
//!   to the node-data bundle
//! - [`PluginRegistry`] that discovers plugin directories, evaluates their
//!   entry file and indexes definitions by name
//! - [`initialize`] / [`global`] for the process-wide registry of built-in
//!   plugins
//!
//! # Plugin Layout
//!
//! ```text
//! base_plugins/
//! ├── ganglia/
//! │   ├── plugin.toml      # entry file, see [`definition`]
//! │   └── run.sh
//! └── jupyter/
//!     ├── plugin.toml
//!     └── jupyter.sh
//! ```
//!
//! # Example
//!
//! ```no_run
//! use bootpack_plugin::PluginRegistry;
//!
//! let registry = PluginRegistry::new();
//! registry.load_all("base_plugins")?;
//! let ganglia = registry.get("ganglia");
//! # Ok::<(), bootpack_plugin::PluginError>(())
//! ```

mod error;
mod state;

pub mod definition;
pub mod registry;

pub use definition::{ENTRY_POINT, PluginArgument, PluginDefinition};
pub use error::{PluginError, PluginResult};
pub use registry::{LoadPolicy, LoadSummary, PluginRegistry, global, initialize};
pub use state::LoadState;

//! Node-data bundle for bootpack
//!
//! This crate builds the single zip archive a cluster ships to every node:
//! built-in bootstrap scripts, user custom scripts, plugin files, Spark
//! configuration and the encrypted user credentials.
//!
//! # Bundle Structure
//!
//! ```text
//! node-scripts.zip
//! ├── <node scripts tree>
//! ├── command_builder.py           # utility file
//! ├── custom-scripts/
//! │   ├── 0_setup.sh
//! │   └── custom-scripts.yaml      # [{script, runOn}]
//! ├── plugins/
//! │   ├── ganglia/
//! │   │   └── run.sh
//! │   └── plugins-manifest.json    # [{name, execute, args, runOn}]
//! ├── conf/                        # spark-defaults.conf, spark-env.sh, core-site.xml
//! ├── jars/
//! ├── id_rsa
//! ├── id_rsa.pub
//! └── user.yaml                    # encrypted credentials
//! ```

mod error;

pub mod archive;
pub mod builder;
pub mod credentials;
pub mod manifest;

pub use archive::{ArchiveWriter, FileMode, normalize_line_endings};
pub use builder::BundleBuilder;
pub use credentials::{CredentialCipher, EncryptedPassword, UserRecord};
pub use error::BundleError;
pub use manifest::{CustomScriptRecord, PluginManifestEntry};

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;

/// Folder holding the renamed custom scripts.
pub const CUSTOM_SCRIPT_FOLDER: &str = "custom-scripts";

/// Custom scripts metadata file within [`CUSTOM_SCRIPT_FOLDER`].
pub const CUSTOM_SCRIPT_METADATA_FILE: &str = "custom-scripts.yaml";

/// Folder holding one subfolder per plugin.
pub const PLUGIN_FOLDER: &str = "plugins";

/// Plugins manifest file within [`PLUGIN_FOLDER`].
pub const PLUGIN_MANIFEST_FILE: &str = "plugins-manifest.json";

pub const CONF_FOLDER: &str = "conf";

pub const JARS_FOLDER: &str = "jars";

pub const SSH_PUBLIC_KEY_FILE: &str = "id_rsa.pub";

pub const SSH_PRIVATE_KEY_FILE: &str = "id_rsa";

/// Encrypted user credentials record.
pub const USER_CONFIG_FILE: &str = "user.yaml";

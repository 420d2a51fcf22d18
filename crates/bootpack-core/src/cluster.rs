//! Cluster configuration consumed by the bundle builder

use crate::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Node role that runs a custom script or plugin step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOn {
    /// Only the master node
    #[default]
    Master,
    /// Only worker nodes
    Worker,
    /// Every node in the cluster
    AllNodes,
}

impl RunOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOn::Master => "master",
            RunOn::Worker => "worker",
            RunOn::AllNodes => "all-nodes",
        }
    }
}

impl std::fmt::Display for RunOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the node-data bundle is built from
///
/// Supplied once per build and never mutated by bootpack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfiguration {
    /// Identifier recorded alongside the user credentials
    #[serde(default)]
    pub cluster_id: String,

    /// User scripts, in the order they should run
    #[serde(default)]
    pub custom_scripts: Vec<CustomScript>,

    /// Plugin references, in the order they should run
    #[serde(default)]
    pub plugins: Vec<PluginConfiguration>,

    #[serde(default)]
    pub spark_configuration: Option<SparkConfiguration>,

    #[serde(default)]
    pub user_configuration: Option<UserConfiguration>,
}

impl ClusterConfiguration {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            ..Self::default()
        }
    }

    /// Parse a cluster configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> ConfigResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse a cluster configuration from a TOML document
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// A user-supplied script scheduled during bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomScript {
    /// Local path of the script
    pub script: PathBuf,

    #[serde(default)]
    pub run_on: RunOn,
}

impl CustomScript {
    pub fn new(script: impl Into<PathBuf>, run_on: RunOn) -> Self {
        Self {
            script: script.into(),
            run_on,
        }
    }
}

/// Reference from a cluster to a loaded plugin
///
/// Resolved against the plugin registry when the bundle is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfiguration {
    /// Name of the plugin definition
    pub name: String,

    /// User-supplied plugin arguments
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl PluginConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    /// Add an argument (builder style)
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Spark runtime configuration shipped to the nodes
///
/// There is no default: every Spark configuration carries a keypair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkConfiguration {
    #[serde(default)]
    pub spark_defaults_conf: Option<PathBuf>,

    #[serde(default)]
    pub spark_env_sh: Option<PathBuf>,

    #[serde(default)]
    pub core_site_xml: Option<PathBuf>,

    /// Library jars copied verbatim
    #[serde(default)]
    pub jars: Option<Vec<PathBuf>>,

    /// Keypair used for passwordless ssh between nodes
    pub ssh_key_pair: SshKeyPair,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SshKeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl SshKeyPair {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }
}

impl std::fmt::Debug for SshKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshKeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Credentials of the cluster user
#[derive(Clone, Serialize, Deserialize)]
pub struct UserConfiguration {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub ssh_key: Option<String>,
}

impl std::fmt::Debug for UserConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfiguration")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ssh_key", &self.ssh_key)
            .finish()
    }
}

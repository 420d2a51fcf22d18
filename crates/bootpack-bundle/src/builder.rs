//! Node-data bundle creation.
//!
//! The [`BundleBuilder`] turns a [`ClusterConfiguration`] into the archive
//! shipped to every node. Stages run in a fixed order because later stages
//! may overwrite entries written by earlier ones.

use crate::archive::{ArchiveWriter, FileMode};
use crate::credentials::{CredentialCipher, UserRecord};
use crate::manifest::{self, CustomScriptRecord, PluginManifestEntry};
use crate::{
    BundleError, BundleResult, CONF_FOLDER, CUSTOM_SCRIPT_FOLDER, CUSTOM_SCRIPT_METADATA_FILE,
    JARS_FOLDER, PLUGIN_FOLDER, PLUGIN_MANIFEST_FILE, SSH_PRIVATE_KEY_FILE, SSH_PUBLIC_KEY_FILE,
    USER_CONFIG_FILE,
};
use bootpack_core::{ClusterConfiguration, Settings};
use bootpack_plugin::PluginRegistry;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Builder for the node-data archive of one cluster.
///
/// # Example
///
/// ```no_run
/// use bootpack_bundle::BundleBuilder;
/// use bootpack_core::{ClusterConfiguration, Settings};
/// use bootpack_plugin::PluginRegistry;
///
/// let settings = Settings::with_root("/opt/bootpack");
/// let registry = PluginRegistry::new();
/// registry.load_all(settings.base_plugins_path())?;
///
/// let cluster = ClusterConfiguration::new("spark-cluster");
/// let archive = BundleBuilder::new(&settings, &cluster, &registry).build()?;
/// # Ok::<(), bootpack_bundle::BundleError>(())
/// ```
pub struct BundleBuilder<'a> {
    settings: &'a Settings,
    cluster: &'a ClusterConfiguration,
    registry: &'a PluginRegistry,
    cipher: Option<&'a dyn CredentialCipher>,
    destination: PathBuf,
}

impl<'a> BundleBuilder<'a> {
    /// Create a builder writing to the settings' default destination.
    #[must_use]
    pub fn new(
        settings: &'a Settings,
        cluster: &'a ClusterConfiguration,
        registry: &'a PluginRegistry,
    ) -> Self {
        Self {
            settings,
            cluster,
            registry,
            cipher: None,
            destination: settings.destination_path(),
        }
    }

    /// Set the cipher used to protect the user password.
    ///
    /// Required when the cluster has a user configuration.
    #[must_use]
    pub fn with_cipher(mut self, cipher: &'a dyn CredentialCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Write the archive somewhere other than the default destination.
    #[must_use]
    pub fn with_destination<P: AsRef<Path>>(mut self, destination: P) -> Self {
        self.destination = destination.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Build the archive and return its path.
    ///
    /// The archive is closed exactly once whether or not a stage fails; a
    /// stage error is reported in preference to a close error.
    pub fn build(&self) -> BundleResult<PathBuf> {
        let mut archive = ArchiveWriter::open(&self.destination)?;

        let staged = self.add_core(&mut archive);
        let closed = archive.close();
        staged?;
        closed?;

        info!(
            cluster = %self.cluster.cluster_id,
            path = %self.destination.display(),
            "Built node data archive"
        );
        Ok(self.destination.clone())
    }

    fn add_core(&self, archive: &mut ArchiveWriter) -> BundleResult<()> {
        self.add_node_scripts(archive)?;
        self.add_custom_scripts(archive)?;
        self.add_plugins(archive)?;
        self.add_spark_configuration(archive)?;
        self.add_user_configuration(archive)?;
        archive.add_file(self.settings.utility_path(), "", FileMode::Text)
    }

    fn add_node_scripts(&self, archive: &mut ArchiveWriter) -> BundleResult<()> {
        let written = archive.add_tree(
            self.settings.node_scripts_path(),
            "",
            &self.settings.node_script_exclusions,
        )?;
        debug!(count = written, "Added node scripts");
        Ok(())
    }

    fn add_custom_scripts(&self, archive: &mut ArchiveWriter) -> BundleResult<()> {
        let mut records = Vec::with_capacity(self.cluster.custom_scripts.len());

        for (index, custom_script) in self.cluster.custom_scripts.iter().enumerate() {
            let path = &custom_script.script;
            let file_name = match path.file_name() {
                Some(name) if path.is_file() => name.to_string_lossy(),
                _ => return Err(BundleError::InvalidCustomScript(path.clone())),
            };
            let renamed = format!("{index}_{file_name}");

            archive.add_file_as(
                path,
                &format!("{CUSTOM_SCRIPT_FOLDER}/{renamed}"),
                FileMode::Text,
            )?;
            records.push(CustomScriptRecord {
                script: renamed,
                run_on: custom_script.run_on,
            });
        }

        let metadata = manifest::custom_scripts_yaml(&records)?;
        archive.write_bytes(
            &format!("{CUSTOM_SCRIPT_FOLDER}/{CUSTOM_SCRIPT_METADATA_FILE}"),
            metadata.as_bytes(),
        )
    }

    fn add_plugins(&self, archive: &mut ArchiveWriter) -> BundleResult<()> {
        let mut entries = Vec::new();

        for plugin_conf in &self.cluster.plugins {
            let definition = self
                .registry
                .get(&plugin_conf.name)
                .ok_or_else(|| BundleError::UnknownPlugin(plugin_conf.name.clone()))?;

            let target_dir = format!("{PLUGIN_FOLDER}/{}", definition.name);
            for file in &definition.files {
                archive.add_file(file, &target_dir, FileMode::Text)?;
            }

            if let Some(execute) = definition.execute() {
                entries.push(PluginManifestEntry {
                    name: definition.name.clone(),
                    execute: format!("{}/{execute}", definition.name),
                    args: definition.process_args(&plugin_conf.args)?,
                    run_on: definition.run_on,
                });
            }
            debug!(plugin = %definition.name, files = definition.files.len(), "Added plugin");
        }

        let manifest = manifest::plugins_manifest_json(&entries)?;
        archive.write_bytes(
            &format!("{PLUGIN_FOLDER}/{PLUGIN_MANIFEST_FILE}"),
            manifest.as_bytes(),
        )
    }

    fn add_spark_configuration(&self, archive: &mut ArchiveWriter) -> BundleResult<()> {
        let Some(spark) = &self.cluster.spark_configuration else {
            return Ok(());
        };

        for file in [
            &spark.spark_defaults_conf,
            &spark.spark_env_sh,
            &spark.core_site_xml,
        ]
        .into_iter()
        .flatten()
        {
            archive.add_file(file, CONF_FOLDER, FileMode::Text)?;
        }

        // Keypair for passwordless ssh between nodes
        archive.write_bytes(SSH_PUBLIC_KEY_FILE, spark.ssh_key_pair.public_key.as_bytes())?;
        archive.write_bytes(SSH_PRIVATE_KEY_FILE, spark.ssh_key_pair.private_key.as_bytes())?;

        for jar in spark.jars.iter().flatten() {
            archive.add_file(jar, JARS_FOLDER, FileMode::Binary)?;
        }

        Ok(())
    }

    fn add_user_configuration(&self, archive: &mut ArchiveWriter) -> BundleResult<()> {
        let Some(user) = &self.cluster.user_configuration else {
            return Ok(());
        };

        let cipher = self.cipher.ok_or_else(|| {
            BundleError::InvalidConfiguration(
                "user configuration requires a credential cipher".to_string(),
            )
        })?;
        let public_key = self
            .cluster
            .spark_configuration
            .as_ref()
            .map(|spark| spark.ssh_key_pair.public_key.as_str())
            .ok_or_else(|| {
                BundleError::InvalidConfiguration(
                    "user configuration requires a spark configuration ssh key pair".to_string(),
                )
            })?;

        let encrypted = cipher.encrypt(public_key, &user.password)?;
        let record = UserRecord::new(user, &encrypted, &self.cluster.cluster_id);
        archive.write_bytes(USER_CONFIG_FILE, record.to_yaml()?.as_bytes())
    }
}

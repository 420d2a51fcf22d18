//! Integration tests for building node-data archives.
//!
//! Each test lays out a bootpack root in a temp directory (node scripts,
//! utility file, base plugins) and inspects the produced zip.

#![allow(non_snake_case)]

use bootpack_bundle::{
    BundleBuilder, BundleError, BundleResult, CredentialCipher, CustomScriptRecord,
    EncryptedPassword, PluginManifestEntry,
};
use bootpack_core::{
    ClusterConfiguration, CustomScript, PluginConfiguration, RunOn, Settings, SparkConfiguration,
    SshKeyPair, UserConfiguration,
};
use bootpack_plugin::{ENTRY_POINT, PluginError, PluginRegistry};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

const PASSWORD: &str = "hunter2-plaintext";

/// Bootpack root with built-in node scripts and the utility file.
struct Fixture {
    temp: TempDir,
    settings: Settings,
    registry: PluginRegistry,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let settings = Settings::with_root(temp.path());
        let fixture = Self {
            temp,
            settings,
            registry: PluginRegistry::new(),
        };
        fixture.write("node_scripts/setup_node.sh", "#!/bin/bash\r\necho setup\r\n");
        fixture.write("node_scripts/install/install.py", "print('install')\r\n");
        fixture.write("node_scripts/install/__init__.pyc", "compiled");
        fixture.write("utils/command_builder.py", "class CommandBuilder:\r\n    pass\r\n");
        fixture
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn plugin(&self, folder: &str, entry: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.root().join("base_plugins").join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ENTRY_POINT), entry).unwrap();
        for (name, contents) in files {
            fs::write(dir.join(name), contents).unwrap();
        }
        dir
    }

    fn build(&self, cluster: &ClusterConfiguration) -> BundleResult<PathBuf> {
        BundleBuilder::new(&self.settings, cluster, &self.registry)
            .with_cipher(&FakeCipher)
            .build()
    }
}

/// Deterministic stand-in for the hybrid encryption primitive.
struct FakeCipher;

impl CredentialCipher for FakeCipher {
    fn encrypt(&self, recipient_public_key: &str, plaintext: &str) -> BundleResult<EncryptedPassword> {
        Ok(EncryptedPassword {
            encrypted_session_key: recipient_public_key.bytes().rev().collect(),
            nonce: vec![0x11; 16],
            tag: vec![0x22; 16],
            ciphertext: plaintext.bytes().map(|b| b ^ 0x5a).collect(),
        })
    }
}

fn read_archive(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            (file.name().to_string(), contents)
        })
        .collect()
}

fn text(entries: &BTreeMap<String, Vec<u8>>, name: &str) -> String {
    let bytes = entries
        .get(name)
        .unwrap_or_else(|| panic!("missing entry {name}, have {:?}", entries.keys()));
    String::from_utf8(bytes.clone()).unwrap()
}

fn spark_configuration(fixture: &Fixture) -> SparkConfiguration {
    SparkConfiguration {
        spark_defaults_conf: Some(fixture.write("conf/spark-defaults.conf", "spark.master x\r\n")),
        spark_env_sh: Some(fixture.write("conf/spark-env.sh", "export A=1\r\n")),
        core_site_xml: None,
        jars: Some(vec![fixture.write("jars/azure-storage.jar", "PK\r\nbinary")]),
        ssh_key_pair: SshKeyPair::new("ssh-rsa PUBLIC", "-----PRIVATE-----"),
    }
}

// =============================================================================
// Layout
// =============================================================================

mod layout {
    use super::*;

    #[test]
    fn build___empty_cluster___contains_node_scripts_utility_and_empty_records() {
        let fixture = Fixture::new();

        let path = fixture.build(&ClusterConfiguration::new("c1")).unwrap();

        let entries = read_archive(&path);
        assert_eq!(path, fixture.settings.destination_path());
        assert_eq!(text(&entries, "setup_node.sh"), "#!/bin/bash\necho setup\n");
        assert_eq!(text(&entries, "install/install.py"), "print('install')\n");
        assert!(!entries.contains_key("install/__init__.pyc"));
        assert_eq!(
            text(&entries, "command_builder.py"),
            "class CommandBuilder:\n    pass\n"
        );
        assert_eq!(text(&entries, "plugins/plugins-manifest.json"), "[]");
        let scripts: Vec<CustomScriptRecord> =
            serde_yaml::from_str(&text(&entries, "custom-scripts/custom-scripts.yaml")).unwrap();
        assert!(scripts.is_empty());
        assert!(!entries.contains_key("user.yaml"));
        assert!(!entries.contains_key("id_rsa"));
        assert!(!entries.keys().any(|k| k.starts_with("conf/") || k.starts_with("jars/")));
    }

    #[test]
    fn build___text_entries___never_contain_crlf() {
        let fixture = Fixture::new();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.custom_scripts.push(CustomScript::new(
            fixture.write("scripts/win.sh", "a\r\nb\r\n"),
            RunOn::Master,
        ));
        cluster.spark_configuration = Some(spark_configuration(&fixture));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        for (name, contents) in &entries {
            if name.starts_with("jars/") {
                continue;
            }
            assert!(
                !contents.windows(2).any(|w| w == b"\r\n"),
                "{name} contains CRLF"
            );
        }
    }

    #[test]
    fn build___spark_configuration___adds_conf_keys_and_binary_jars() {
        let fixture = Fixture::new();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.spark_configuration = Some(spark_configuration(&fixture));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        assert_eq!(text(&entries, "conf/spark-defaults.conf"), "spark.master x\n");
        assert_eq!(text(&entries, "conf/spark-env.sh"), "export A=1\n");
        assert!(!entries.contains_key("conf/core-site.xml"));
        assert_eq!(text(&entries, "id_rsa.pub"), "ssh-rsa PUBLIC");
        assert_eq!(text(&entries, "id_rsa"), "-----PRIVATE-----");
        assert_eq!(entries["jars/azure-storage.jar"], b"PK\r\nbinary");
    }

    #[test]
    fn build___custom_destination___writes_there() {
        let fixture = Fixture::new();
        let destination = fixture.root().join("out/cluster-7.zip");
        let cluster = ClusterConfiguration::new("cluster-7");

        let path = BundleBuilder::new(&fixture.settings, &cluster, &fixture.registry)
            .with_destination(&destination)
            .build()
            .unwrap();

        assert_eq!(path, destination);
        assert!(destination.is_file());
    }

    #[test]
    fn build___later_stage___overwrites_node_script_entry() {
        let fixture = Fixture::new();
        fixture.write("node_scripts/id_rsa.pub", "placeholder");
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.spark_configuration = Some(spark_configuration(&fixture));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        assert_eq!(text(&entries, "id_rsa.pub"), "ssh-rsa PUBLIC");
    }
}

// =============================================================================
// Custom scripts
// =============================================================================

mod custom_scripts {
    use super::*;

    #[test]
    fn build___single_custom_script___renamed_with_index_and_recorded() {
        let fixture = Fixture::new();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.custom_scripts.push(CustomScript::new(
            fixture.write("scripts/foo.sh", "echo foo\r\n"),
            RunOn::Worker,
        ));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        assert_eq!(text(&entries, "custom-scripts/0_foo.sh"), "echo foo\n");
        let records: Vec<CustomScriptRecord> =
            serde_yaml::from_str(&text(&entries, "custom-scripts/custom-scripts.yaml")).unwrap();
        assert_eq!(
            records,
            vec![CustomScriptRecord {
                script: "0_foo.sh".to_string(),
                run_on: RunOn::Worker,
            }]
        );
    }

    #[test]
    fn build___many_custom_scripts___keep_declared_order() {
        let fixture = Fixture::new();
        let mut cluster = ClusterConfiguration::new("c1");
        for (name, run_on) in [
            ("zeta.sh", RunOn::Master),
            ("alpha.sh", RunOn::AllNodes),
            ("zeta-dup/zeta.sh", RunOn::Worker),
        ] {
            cluster.custom_scripts.push(CustomScript::new(
                fixture.write(&format!("scripts/{name}"), "true\n"),
                run_on,
            ));
        }

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        let records: Vec<CustomScriptRecord> =
            serde_yaml::from_str(&text(&entries, "custom-scripts/custom-scripts.yaml")).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.script.as_str()).collect();
        assert_eq!(names, vec!["0_zeta.sh", "1_alpha.sh", "2_zeta.sh"]);
        assert_eq!(records[1].run_on, RunOn::AllNodes);
        assert!(entries.contains_key("custom-scripts/2_zeta.sh"));
    }

    #[test]
    fn build___missing_custom_script___fails_and_leaves_closed_archive() {
        let fixture = Fixture::new();
        let missing = fixture.root().join("scripts/absent.sh");
        let mut cluster = ClusterConfiguration::new("c1");
        cluster
            .custom_scripts
            .push(CustomScript::new(&missing, RunOn::Master));

        let result = fixture.build(&cluster);

        assert!(matches!(result, Err(BundleError::InvalidCustomScript(ref p)) if *p == missing));
        assert!(result.unwrap_err().to_string().contains("absent.sh"));
        // The archive was finalized and is readable despite the failure
        let entries = read_archive(&fixture.settings.destination_path());
        assert!(entries.contains_key("setup_node.sh"));
    }
}

// =============================================================================
// Plugins
// =============================================================================

mod plugins {
    use super::*;

    const GANGLIA: &str = r#"
        [definition]
        name = "ganglia"
        files = ["run.sh", "gmond.conf"]
        execute = "run.sh"
        run_on = "all-nodes"

        [definition.args.port]
        default = "8649"
    "#;

    const NOTES: &str = r#"
        [definition]
        name = "notes"
        files = ["README.txt"]
    "#;

    #[test]
    fn build___plugin_with_execute___adds_files_and_manifest_entry() {
        let fixture = Fixture::new();
        fixture.plugin(
            "ganglia",
            GANGLIA,
            &[("run.sh", "start\r\n"), ("gmond.conf", "conf\n")],
        );
        fixture
            .registry
            .load_all(fixture.settings.base_plugins_path())
            .unwrap();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.plugins.push(PluginConfiguration::new("ganglia"));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        assert_eq!(text(&entries, "plugins/ganglia/run.sh"), "start\n");
        assert_eq!(text(&entries, "plugins/ganglia/gmond.conf"), "conf\n");
        let manifest: Vec<PluginManifestEntry> =
            serde_json::from_str(&text(&entries, "plugins/plugins-manifest.json")).unwrap();
        assert_eq!(
            manifest,
            vec![PluginManifestEntry {
                name: "ganglia".to_string(),
                execute: "ganglia/run.sh".to_string(),
                args: BTreeMap::from([("port".to_string(), "8649".to_string())]),
                run_on: RunOn::AllNodes,
            }]
        );
    }

    #[test]
    fn build___plugin_without_execute___adds_files_but_no_manifest_entry() {
        let fixture = Fixture::new();
        let dir = fixture.plugin("notes", NOTES, &[("README.txt", "read me")]);
        fixture.registry.load(&dir).unwrap();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.plugins.push(PluginConfiguration::new("notes"));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        assert_eq!(text(&entries, "plugins/notes/README.txt"), "read me");
        assert_eq!(text(&entries, "plugins/plugins-manifest.json"), "[]");
    }

    #[test]
    fn build___several_plugins___manifest_keeps_declared_order() {
        let fixture = Fixture::new();
        for name in ["zookeeper", "alluxio"] {
            let dir = fixture.plugin(
                name,
                &format!("[definition]\nname = \"{name}\"\nfiles = [\"go.sh\"]\nexecute = \"go.sh\"\n"),
                &[("go.sh", "go")],
            );
            fixture.registry.load(&dir).unwrap();
        }
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.plugins.push(PluginConfiguration::new("zookeeper"));
        cluster.plugins.push(PluginConfiguration::new("alluxio"));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        let manifest: Vec<PluginManifestEntry> =
            serde_json::from_str(&text(&entries, "plugins/plugins-manifest.json")).unwrap();
        let names: Vec<&str> = manifest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zookeeper", "alluxio"]);
    }

    #[test]
    fn build___user_args___are_processed_by_definition() {
        let fixture = Fixture::new();
        let dir = fixture.plugin("ganglia", GANGLIA, &[("run.sh", ""), ("gmond.conf", "")]);
        fixture.registry.load(&dir).unwrap();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster
            .plugins
            .push(PluginConfiguration::new("ganglia").with_arg("port", "9000"));

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        let manifest: Vec<PluginManifestEntry> =
            serde_json::from_str(&text(&entries, "plugins/plugins-manifest.json")).unwrap();
        assert_eq!(manifest[0].args["port"], "9000");
    }

    #[test]
    fn build___invalid_user_args___fails_with_plugin_error() {
        let fixture = Fixture::new();
        let dir = fixture.plugin("ganglia", GANGLIA, &[("run.sh", ""), ("gmond.conf", "")]);
        fixture.registry.load(&dir).unwrap();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster
            .plugins
            .push(PluginConfiguration::new("ganglia").with_arg("colour", "blue"));

        let result = fixture.build(&cluster);

        assert!(matches!(
            result,
            Err(BundleError::Plugin(PluginError::InvalidArguments { .. }))
        ));
    }

    #[test]
    fn build___unknown_plugin___fails_with_unknown_plugin() {
        let fixture = Fixture::new();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.plugins.push(PluginConfiguration::new("ganglia"));

        let result = fixture.build(&cluster);

        assert!(matches!(result, Err(BundleError::UnknownPlugin(ref n)) if n == "ganglia"));
    }

    #[test]
    fn build___plugin_name_with_traversal___is_never_loaded_or_archived() {
        let fixture = Fixture::new();
        let dir = fixture.plugin(
            "evil",
            "[definition]\nname = \"../../etc\"\nfiles = [\"run.sh\"]\nexecute = \"../../x.sh\"\n",
            &[("run.sh", "rm -rf /")],
        );

        let loaded = fixture.registry.load(&dir);
        assert!(matches!(loaded, Err(PluginError::InvalidDefinition { .. })));
        assert!(fixture.registry.is_empty());

        let mut cluster = ClusterConfiguration::new("c1");
        cluster.plugins.push(PluginConfiguration::new("../../etc"));
        let result = fixture.build(&cluster);

        assert!(matches!(result, Err(BundleError::UnknownPlugin(_))));
        let entries = read_archive(&fixture.settings.destination_path());
        assert!(!entries.keys().any(|k| k.contains("..")));
    }

    #[test]
    fn build___plugin_file_deleted_after_load___fails_with_missing_file() {
        let fixture = Fixture::new();
        let dir = fixture.plugin("notes", NOTES, &[("README.txt", "read me")]);
        fixture.registry.load(&dir).unwrap();
        fs::remove_file(dir.join("README.txt")).unwrap();
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.plugins.push(PluginConfiguration::new("notes"));

        let result = fixture.build(&cluster);

        assert!(matches!(result, Err(BundleError::MissingFile(_))));
    }
}

// =============================================================================
// User configuration
// =============================================================================

mod user_configuration {
    use super::*;

    fn cluster_with_user(fixture: &Fixture) -> ClusterConfiguration {
        let mut cluster = ClusterConfiguration::new("spark-cluster-3");
        cluster.spark_configuration = Some(spark_configuration(fixture));
        cluster.user_configuration = Some(UserConfiguration {
            username: "spark".to_string(),
            password: PASSWORD.to_string(),
            ssh_key: Some("ssh-rsa USERKEY".to_string()),
        });
        cluster
    }

    #[test]
    fn build___user_configuration___writes_encrypted_record_without_plaintext() {
        let fixture = Fixture::new();
        let cluster = cluster_with_user(&fixture);

        let entries = read_archive(&fixture.build(&cluster).unwrap());

        let record: serde_yaml::Mapping =
            serde_yaml::from_str(&text(&entries, "user.yaml")).unwrap();
        let field = |key: &str| record.get(key).and_then(|v| v.as_str()).unwrap().to_string();
        assert_eq!(record.len(), 7);
        assert_eq!(field("username"), "spark");
        assert_eq!(field("ssh-key"), "ssh-rsa USERKEY");
        assert_eq!(field("cluster_id"), "spark-cluster-3");
        for key in ["password", "aes_session_key", "cipher_aes_nonce", "tag"] {
            assert!(!field(key).is_empty(), "{key} should be populated");
        }
        for (name, contents) in &entries {
            assert!(
                !contents.windows(PASSWORD.len()).any(|w| w == PASSWORD.as_bytes()),
                "{name} leaks the plaintext password"
            );
        }
    }

    #[test]
    fn build___user_configuration_without_cipher___fails() {
        let fixture = Fixture::new();
        let cluster = cluster_with_user(&fixture);

        let result = BundleBuilder::new(&fixture.settings, &cluster, &fixture.registry).build();

        assert!(matches!(result, Err(BundleError::InvalidConfiguration(_))));
    }

    #[test]
    fn build___user_configuration_without_spark_keys___fails() {
        let fixture = Fixture::new();
        let mut cluster = cluster_with_user(&fixture);
        cluster.spark_configuration = None;

        let result = fixture.build(&cluster);

        assert!(matches!(result, Err(BundleError::InvalidConfiguration(_))));
    }

    #[test]
    fn build___failing_cipher___propagates_encryption_error() {
        struct BrokenCipher;
        impl CredentialCipher for BrokenCipher {
            fn encrypt(&self, _: &str, _: &str) -> BundleResult<EncryptedPassword> {
                Err(BundleError::Encryption("bad public key".to_string()))
            }
        }
        let fixture = Fixture::new();
        let cluster = cluster_with_user(&fixture);

        let result = BundleBuilder::new(&fixture.settings, &cluster, &fixture.registry)
            .with_cipher(&BrokenCipher)
            .build();

        assert!(matches!(result, Err(BundleError::Encryption(_))));
    }
}

// =============================================================================
// Error paths
// =============================================================================

mod errors {
    use super::*;

    #[test]
    fn build___missing_spark_conf_file___fails_with_missing_file() {
        let fixture = Fixture::new();
        let mut spark = spark_configuration(&fixture);
        spark.core_site_xml = Some(fixture.root().join("conf/core-site.xml"));
        let mut cluster = ClusterConfiguration::new("c1");
        cluster.spark_configuration = Some(spark);

        let result = fixture.build(&cluster);

        assert!(matches!(result, Err(BundleError::MissingFile(ref p)) if p.ends_with("core-site.xml")));
    }

    #[test]
    fn build___missing_node_scripts___fails_with_missing_file() {
        let fixture = Fixture::new();
        fs::remove_dir_all(fixture.root().join("node_scripts")).unwrap();

        let result = fixture.build(&ClusterConfiguration::new("c1"));

        assert!(matches!(result, Err(BundleError::MissingFile(_))));
    }

    #[test]
    fn build___unwritable_destination___fails_with_storage_error() {
        let fixture = Fixture::new();
        let blocker = fixture.write("blocker", "file, not a directory");
        let cluster = ClusterConfiguration::new("c1");

        let result = BundleBuilder::new(&fixture.settings, &cluster, &fixture.registry)
            .with_destination(blocker.join("out.zip"))
            .build();

        assert!(matches!(result, Err(BundleError::Storage { .. })));
    }
}

//! Generated records the node bootstrap reads to discover what to run.

use crate::BundleResult;
use bootpack_core::RunOn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One renamed custom script in `custom-scripts/custom-scripts.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomScriptRecord {
    /// File name inside the custom scripts folder (`<index>_<basename>`).
    pub script: String,

    #[serde(rename = "runOn")]
    pub run_on: RunOn,
}

/// One executable plugin step in `plugins/plugins-manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifestEntry {
    pub name: String,

    /// Script path relative to the plugins folder (`<name>/<execute>`).
    pub execute: String,

    /// Arguments after the plugin's own processing.
    pub args: BTreeMap<String, String>,

    #[serde(rename = "runOn")]
    pub run_on: RunOn,
}

/// Serialize the custom scripts metadata as a YAML list, in declared order.
pub fn custom_scripts_yaml(records: &[CustomScriptRecord]) -> BundleResult<String> {
    Ok(serde_yaml::to_string(records)?)
}

/// Serialize the plugins manifest as a JSON list, in declared order.
pub fn plugins_manifest_json(entries: &[PluginManifestEntry]) -> BundleResult<String> {
    Ok(serde_json::to_string(entries)?)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn custom_scripts_yaml___uses_run_on_key_and_keeps_order() {
        let records = vec![
            CustomScriptRecord {
                script: "0_b.sh".to_string(),
                run_on: RunOn::Worker,
            },
            CustomScriptRecord {
                script: "1_a.sh".to_string(),
                run_on: RunOn::AllNodes,
            },
        ];

        let yaml = custom_scripts_yaml(&records).unwrap();

        assert!(yaml.contains("runOn: worker"));
        assert!(yaml.contains("runOn: all-nodes"));
        assert!(yaml.find("0_b.sh").unwrap() < yaml.find("1_a.sh").unwrap());
        let parsed: Vec<CustomScriptRecord> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn custom_scripts_yaml___empty_list___is_valid_yaml() {
        let yaml = custom_scripts_yaml(&[]).unwrap();

        let parsed: Vec<CustomScriptRecord> = serde_yaml::from_str(&yaml).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn plugins_manifest_json___has_expected_shape() {
        let entries = vec![PluginManifestEntry {
            name: "ganglia".to_string(),
            execute: "ganglia/run.sh".to_string(),
            args: BTreeMap::from([("port".to_string(), "8649".to_string())]),
            run_on: RunOn::Master,
        }];

        let json = plugins_manifest_json(&entries).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "name": "ganglia",
                "execute": "ganglia/run.sh",
                "args": {"port": "8649"},
                "runOn": "master"
            }])
        );
    }
}

//! Plugin definition and entry-point evaluation
//!
//! A plugin is a directory containing an entry file, [`ENTRY_POINT`], whose
//! `[definition]` table describes the plugin:
//!
//! ```toml
//! [definition]
//! name = "ganglia"
//! files = ["run.sh", "gmond.conf"]
//! execute = "run.sh"
//! run_on = "all-nodes"
//!
//! [definition.args.port]
//! required = false
//! default = "8649"
//! ```
//!
//! The entry file is evaluated in isolation: only its own contents are
//! consulted, and nothing it declares is executed on the local machine.

use crate::{PluginError, PluginResult};
use bootpack_core::RunOn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Entry file every plugin directory must contain.
pub const ENTRY_POINT: &str = "plugin.toml";

/// Table of the entry file that yields the definition.
pub const DEFINITION_TABLE: &str = "definition";

/// Argument declared by a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginArgument {
    /// Whether the cluster configuration must supply a value.
    #[serde(default)]
    pub required: bool,

    /// Value used when the argument is omitted.
    #[serde(default)]
    pub default: Option<String>,
}

/// A loaded plugin.
///
/// Definitions are immutable once stored in the registry; re-loading a
/// plugin replaces the whole definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDefinition {
    /// Unique registry key.
    pub name: String,

    /// Absolute base directory of the plugin.
    pub path: PathBuf,

    /// Files shipped with the plugin, absolute and rooted at `path`.
    pub files: Vec<PathBuf>,

    /// File run on the node, relative to the plugin's archive directory.
    pub execute: Option<String>,

    /// Node role that runs `execute`.
    pub run_on: RunOn,

    /// Declared arguments by name.
    pub args: BTreeMap<String, PluginArgument>,
}

/// Shape of the `[definition]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionTable {
    name: String,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    execute: Option<String>,
    #[serde(default)]
    run_on: RunOn,
    #[serde(default)]
    args: BTreeMap<String, PluginArgument>,
}

impl PluginDefinition {
    /// Non-empty execute entry, if any.
    #[must_use]
    pub fn execute(&self) -> Option<&str> {
        self.execute.as_deref().filter(|e| !e.is_empty())
    }

    /// Validate user arguments against the declared ones.
    ///
    /// Every required argument must be supplied and unknown names are
    /// rejected. Omitted optional arguments take their declared default.
    pub fn process_args(
        &self,
        supplied: &BTreeMap<String, String>,
    ) -> PluginResult<BTreeMap<String, String>> {
        if let Some(unknown) = supplied.keys().find(|k| !self.args.contains_key(*k)) {
            return Err(PluginError::InvalidArguments {
                plugin: self.name.clone(),
                reason: format!("unknown argument '{unknown}'"),
            });
        }

        let mut processed = BTreeMap::new();
        for (name, arg) in &self.args {
            match (supplied.get(name), &arg.default) {
                (Some(value), _) => {
                    processed.insert(name.clone(), value.clone());
                }
                (None, _) if arg.required => {
                    return Err(PluginError::InvalidArguments {
                        plugin: self.name.clone(),
                        reason: format!("missing required argument '{name}'"),
                    });
                }
                (None, Some(default)) => {
                    processed.insert(name.clone(), default.clone());
                }
                (None, None) => {}
            }
        }

        Ok(processed)
    }
}

/// Evaluate the entry point of the plugin directory at `path`.
///
/// `path` must already be absolute; declared files are rewritten to be
/// rooted at it.
pub(crate) fn evaluate(path: &Path) -> PluginResult<PluginDefinition> {
    if !path.is_dir() {
        return Err(PluginError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let entry = path.join(ENTRY_POINT);
    if !entry.is_file() {
        return Err(PluginError::EntryPointMissing {
            path: path.to_path_buf(),
            entry: ENTRY_POINT,
        });
    }

    let source = fs::read_to_string(&entry).map_err(|e| PluginError::io(&entry, e))?;
    let table = parse_definition_table(path, &source)?;
    expand(path, table)
}

fn parse_definition_table(path: &Path, source: &str) -> PluginResult<DefinitionTable> {
    let mut document: toml::Table = toml::from_str(source)
        .map_err(|e| PluginError::invalid_definition(path, format!("{ENTRY_POINT}: {e}")))?;

    let value = document.remove(DEFINITION_TABLE).ok_or_else(|| {
        PluginError::invalid_definition(
            path,
            format!("{ENTRY_POINT} is missing a table called '{DEFINITION_TABLE}'"),
        )
    })?;

    if !value.is_table() {
        return Err(PluginError::invalid_definition(
            path,
            format!("'{DEFINITION_TABLE}' doesn't return a plugin definition"),
        ));
    }

    DefinitionTable::deserialize(value).map_err(|e| {
        PluginError::invalid_definition(
            path,
            format!("'{DEFINITION_TABLE}' doesn't return a plugin definition: {e}"),
        )
    })
}

fn expand(path: &Path, table: DefinitionTable) -> PluginResult<PluginDefinition> {
    if table.name.trim().is_empty() {
        return Err(PluginError::invalid_definition(
            path,
            "name must not be empty",
        ));
    }
    // The name becomes the plugin's directory inside the archive
    let mut components = Path::new(&table.name).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(PluginError::invalid_definition(
            path,
            format!("name '{}' must be a single path segment", table.name),
        ));
    }

    if let Some(execute) = table.execute.as_deref().filter(|e| !e.is_empty())
        && !is_inside_plugin(execute)
    {
        return Err(PluginError::invalid_definition(
            path,
            format!("execute '{execute}' must be a relative path inside the plugin"),
        ));
    }

    let files = table
        .files
        .iter()
        .map(|file| {
            if is_inside_plugin(file) {
                Ok(path.join(file))
            } else {
                Err(PluginError::invalid_definition(
                    path,
                    format!("file '{file}' must be a relative path inside the plugin"),
                ))
            }
        })
        .collect::<PluginResult<Vec<_>>>()?;

    Ok(PluginDefinition {
        name: table.name,
        path: path.to_path_buf(),
        files,
        execute: table.execute,
        run_on: table.run_on,
        args: table.args,
    })
}

/// True when `relative` names something below the plugin directory.
fn is_inside_plugin(relative: &str) -> bool {
    let mut has_segment = false;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(_) => has_segment = true,
            Component::CurDir => {}
            _ => return false,
        }
    }
    has_segment
}

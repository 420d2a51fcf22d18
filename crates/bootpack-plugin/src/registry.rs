//! Plugin registry
//!
//! The [`PluginRegistry`] maps plugin names to loaded definitions. Lookups
//! are safe from any number of threads; loading phases must be serialized
//! by the caller (the process-wide [`initialize`] does this for the
//! built-in plugins).

use crate::definition::{self, PluginDefinition};
use crate::{LoadState, PluginError, PluginResult};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What `load_all_with` does when one plugin directory fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Abort at the first failure.
    #[default]
    FailFast,
    /// Log the failure, record it, and continue with the next directory.
    Tolerant,
}

/// Outcome of loading a directory of plugins.
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Names of the plugins loaded, in load order.
    pub loaded: Vec<String>,
    /// Directories that failed (only populated under [`LoadPolicy::Tolerant`]).
    pub failed: Vec<(PathBuf, PluginError)>,
}

/// Registry of loaded plugin definitions, keyed by name.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<PluginDefinition>>>,
    states: RwLock<HashMap<PathBuf, LoadState>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the plugin directory at `path`.
    ///
    /// The stored definition replaces any previous definition with the same
    /// name.
    pub fn load(&self, path: impl AsRef<Path>) -> PluginResult<Arc<PluginDefinition>> {
        let path = std::path::absolute(path.as_ref())
            .map_err(|e| PluginError::io(path.as_ref(), e))?;

        self.transition(&path, LoadState::Loading)?;

        match definition::evaluate(&path) {
            Ok(definition) => {
                let definition = Arc::new(definition);
                let replaced = self
                    .plugins
                    .write()
                    .insert(definition.name.clone(), Arc::clone(&definition));
                self.transition(&path, LoadState::Loaded)?;

                if let Some(previous) = replaced {
                    debug!(
                        plugin = %definition.name,
                        previous = %previous.path.display(),
                        "Replaced plugin definition"
                    );
                }
                info!(plugin = %definition.name, path = %path.display(), "Loaded plugin");
                Ok(definition)
            }
            Err(e) => {
                self.transition(&path, LoadState::Failed)?;
                Err(e)
            }
        }
    }

    /// Load every immediate subdirectory of `directory`, stopping at the
    /// first failure.
    pub fn load_all(&self, directory: impl AsRef<Path>) -> PluginResult<LoadSummary> {
        self.load_all_with(directory, LoadPolicy::FailFast)
    }

    /// Load every immediate subdirectory of `directory`, in name order.
    pub fn load_all_with(
        &self,
        directory: impl AsRef<Path>,
        policy: LoadPolicy,
    ) -> PluginResult<LoadSummary> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(PluginError::NotFound {
                path: directory.to_path_buf(),
            });
        }

        let mut folders = Vec::new();
        for entry in fs::read_dir(directory).map_err(|e| PluginError::io(directory, e))? {
            let entry = entry.map_err(|e| PluginError::io(directory, e))?;
            if entry.path().is_dir() {
                folders.push(entry.path());
            }
        }
        folders.sort();

        let mut summary = LoadSummary::default();
        for folder in folders {
            match self.load(&folder) {
                Ok(definition) => summary.loaded.push(definition.name.clone()),
                Err(e) if policy == LoadPolicy::Tolerant => {
                    warn!(path = %folder.display(), error = %e, "Skipping plugin that failed to load");
                    summary.failed.push((folder, e));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Check if a plugin with this name is loaded.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.plugins.read().contains_key(name)
    }

    /// Look up a plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<PluginDefinition>> {
        self.plugins.read().get(name).cloned()
    }

    /// Names of all loaded plugins, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// Load state of a plugin directory.
    #[must_use]
    pub fn load_state(&self, path: impl AsRef<Path>) -> LoadState {
        let Ok(path) = std::path::absolute(path.as_ref()) else {
            return LoadState::Unloaded;
        };
        self.states.read().get(&path).copied().unwrap_or_default()
    }

    /// Drop every definition and load state.
    pub fn clear(&self) {
        self.plugins.write().clear();
        self.states.write().clear();
    }

    fn transition(&self, path: &Path, target: LoadState) -> PluginResult<()> {
        let mut states = self.states.write();
        let current = states.get(path).copied().unwrap_or_default();
        if !current.can_transition_to(target) {
            return Err(PluginError::LoadInProgress {
                path: path.to_path_buf(),
            });
        }
        states.insert(path.to_path_buf(), target);
        Ok(())
    }
}

static GLOBAL: OnceCell<PluginRegistry> = OnceCell::new();

/// Load the built-in plugins into the process-wide registry.
///
/// Runs once per process; later calls return the registry built by the
/// first successful call, whatever `base_dir` they pass. A failed
/// initialization leaves the registry unset so startup can be retried.
pub fn initialize(base_dir: impl AsRef<Path>) -> PluginResult<&'static PluginRegistry> {
    GLOBAL.get_or_try_init(|| {
        let registry = PluginRegistry::new();
        let summary = registry.load_all(base_dir.as_ref())?;
        info!(
            count = summary.loaded.len(),
            path = %base_dir.as_ref().display(),
            "Loaded built-in plugins"
        );
        Ok(registry)
    })
}

/// The process-wide registry, if [`initialize`] has completed.
#[must_use]
pub fn global() -> Option<&'static PluginRegistry> {
    GLOBAL.get()
}

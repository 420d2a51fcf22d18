//! Global subscriber installation

use crate::reload::{ReloadHandle, convert_level_to_filter};
use bootpack_core::LogLevel;
use tracing_subscriber::reload;

/// Initialize the logging system at `level`
///
/// Installs a formatted subscriber behind a reloadable level filter and
/// registers the filter with [`ReloadHandle::global`]. Returns `false` if a
/// global subscriber was already set, in which case nothing changes.
pub fn init_logging(level: LogLevel) -> bool {
    use tracing_subscriber::prelude::*;

    let (filter, handle) = reload::Layer::new(convert_level_to_filter(level));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    ReloadHandle::global().set_handle(handle);
    tracing::debug!(%level, "Logging initialized");
    true
}

//! Integration tests for the global logging setup.
//!
//! A global subscriber can only be installed once per process, so the
//! whole lifecycle is exercised in a single test.

#![allow(non_snake_case)]

use bootpack_logging::{LogLevel, ReloadHandle, init_logging};

#[test]
fn init_logging___lifecycle___installs_once_and_supports_reload() {
    assert!(!ReloadHandle::global().is_initialized());

    assert!(init_logging(LogLevel::Info));
    assert!(ReloadHandle::global().is_initialized());

    tracing::info!("visible at info");
    ReloadHandle::global().reload_level(LogLevel::Error).unwrap();
    tracing::info!("filtered after reload");

    // A second installation is refused and leaves the first in place
    assert!(!init_logging(LogLevel::Trace));
    assert!(ReloadHandle::global().reload_level(LogLevel::Debug).is_ok());
}

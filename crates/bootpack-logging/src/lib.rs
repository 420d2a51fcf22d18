//! bootpack-logging - Tracing subscriber setup
//!
//! This crate provides:
//! - [`init_logging`] installing a formatted `tracing` subscriber
//! - [`ReloadHandle`] for changing the log level at runtime

mod reload;
mod subscriber;

pub use bootpack_core::LogLevel;
pub use reload::ReloadHandle;
pub use subscriber::init_logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, ReloadHandle, init_logging};
}

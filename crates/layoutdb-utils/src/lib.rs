//! # layoutdb Utilities
//!
//! Shared utilities for the layoutdb workspace.
//!
//! Today that is logging: subscriber setup on top of `tracing-subscriber`
//! and `tracing-appender`, configured from the environment or the CLI.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_with_config, init_logging_with_level, LogFormat, LogLevel, LoggingConfig,
    LoggingError, LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};

//! # Logging Utilities
//!
//! Logging infrastructure for layoutdb using `tracing`.
//!
//! The library crates only emit events; binaries call one of the `init_*`
//! functions here once at startup. Console output goes to stderr so that it
//! never mixes with command output on stdout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use layoutdb_utils::init_logging;
//!
//! // Keep the guard alive for as long as logs should reach the log file
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=layoutdb_core=trace`)
//! - `LAYOUTDB_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `LAYOUTDB_LOG_FILE`: Optional log file, rotated daily (if not set, logs only to stderr)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "LAYOUTDB_LOG_FORMAT";
/// Environment variable naming the log file.
pub const LOG_FILE_ENV: &str = "LAYOUTDB_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig
{
    /// Explicit level; overrides `RUST_LOG` when set
    pub level: Option<LogLevel>,
    /// Output format for every sink
    pub format: LogFormat,
    /// Daily-rotated log file, in addition to stderr
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Settings from `LAYOUTDB_LOG_FORMAT` and `LAYOUTDB_LOG_FILE`.
    ///
    /// ## Errors
    ///
    /// `InvalidFormat` if `LAYOUTDB_LOG_FORMAT` is set to an unknown format.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        Ok(Self {
            level: None,
            format: parse_format(env::var(LOG_FORMAT_ENV).ok().as_deref())?,
            file: env::var_os(LOG_FILE_ENV).map(PathBuf::from),
        })
    }
}

fn parse_format(value: Option<&str>) -> Result<LogFormat, LoggingError>
{
    match value {
        None | Some("") => Ok(LogFormat::default()),
        Some(value) => value.parse().map_err(LoggingError::InvalidFormat),
    }
}

/// Keeps the background log-file writer alive.
///
/// Dropping it flushes and stops file logging; console logging is
/// unaffected.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging with default settings
///
/// Reads `RUST_LOG`, `LAYOUTDB_LOG_FORMAT` and `LAYOUTDB_LOG_FILE`.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `LAYOUTDB_LOG_FORMAT` holds an unknown format
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with_config(&LoggingConfig::from_env()?)
}

/// Initialize logging with explicit level and format
///
/// `LAYOUTDB_LOG_FILE` is still honoured.
///
/// ## Example
///
/// ```rust,no_run
/// use layoutdb_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_with_config(&LoggingConfig {
        level: Some(level),
        format,
        file: env::var_os(LOG_FILE_ENV).map(PathBuf::from),
    })
}

/// Initialize logging from resolved settings.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log file's
/// directory cannot be created.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError>
{
    let explicit_level = config.level.map(Level::from);
    let mut layers = vec![format_layer(config.format, io::stderr, true, build_filter(explicit_level))];

    let mut file_guard = None;
    if let Some(path) = &config.file {
        let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = path.file_name().unwrap_or_default();
        std::fs::create_dir_all(directory)?;
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, file_name));
        layers.push(format_layer(config.format, writer, false, build_filter(explicit_level)));
        file_guard = Some(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard { _file: file_guard })
}

/// Filter priority: explicit level, then `RUST_LOG`, then `info`.
fn build_filter(explicit_level: Option<Level>) -> EnvFilter
{
    match explicit_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Failed to initialize logging (usually: already initialized)
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

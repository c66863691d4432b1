//! Registry configuration.

use std::env;

/// Environment variable read by [`RegistryConfig::from_env`].
pub const TRACE_PROBES_ENV: &str = "LAYOUTDB_TRACE_PROBES";

/// Behaviour switches fixed when a registry is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryConfig
{
    /// Log every candidate type considered during dynamic type recovery
    /// (at `debug` level).
    pub trace_probes: bool,
}

impl RegistryConfig
{
    /// Read the configuration from the environment.
    ///
    /// `LAYOUTDB_TRACE_PROBES` enables probe tracing when set to `1`, `true`,
    /// `yes` or `on` (case-insensitive). Anything else, or unset, leaves it
    /// off.
    #[must_use]
    pub fn from_env() -> Self
    {
        let trace_probes = env::var(TRACE_PROBES_ENV).is_ok_and(|value| parse_flag(&value));
        Self { trace_probes }
    }
}

fn parse_flag(value: &str) -> bool
{
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

//! Shared configuration for embedders of the switchboard dispatch engine.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `SWITCHBOARD_*` environment variables,
//! then command-line flags. The resolved [`Config`] drives how the command
//! registry shapes routable paths and which introspection routes it binds,
//! and how the process-wide tracing subscriber renders events.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HELP_ROUTES, DEFAULT_LOG_FILTER, DEFAULT_ROUTE_PREFIX, DEFAULT_STRICT_ACTIVATION,
    default_help_routes, default_log_filter, default_log_filter_string, default_log_format,
    default_route_prefix, default_strict_activation,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for a switchboard process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SWITCHBOARD")]
pub struct Config {
    /// Prefix prepended to every routable command path (for example `/api`).
    #[serde(default = "defaults::default_route_prefix")]
    pub route_prefix: String,
    /// Whether `<path>/help` introspection routes are bound at all.
    #[serde(default = "defaults::default_help_routes")]
    pub help_routes: bool,
    /// Whether a command whose activation hook declines aborts startup.
    #[serde(default = "defaults::default_strict_activation")]
    pub strict_activation: bool,
    /// Tracing filter expression in `EnvFilter` syntax.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            route_prefix: default_route_prefix(),
            help_routes: DEFAULT_HELP_ROUTES,
            strict_activation: DEFAULT_STRICT_ACTIVATION,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, file, environment and the process
    /// arguments.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any layer fails to parse.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration using `args` in place of the process arguments.
    ///
    /// The first item is treated as the binary name.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any layer fails to parse.
    pub fn load_from_iter<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = OsString>,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Returns the route prefix with any trailing slash removed.
    ///
    /// An empty prefix, or one consisting only of `/`, yields `""` so that
    /// joining it with a link never produces a double slash.
    #[must_use]
    pub fn route_prefix(&self) -> &str {
        self.route_prefix.trim_end_matches('/')
    }

    /// Returns whether introspection routes are enabled.
    #[must_use]
    pub const fn help_routes(&self) -> bool {
        self.help_routes
    }

    /// Returns whether activation failures are fatal.
    #[must_use]
    pub const fn strict_activation(&self) -> bool {
        self.strict_activation
    }

    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

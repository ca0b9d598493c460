//! Structured telemetry initialisation.
//!
//! A bare level in `log_filter` (for example `debug`) applies to the
//! `switchboard::*` targets only; everything else stays at
//! [`DEPENDENCY_LEVEL`]. Any other expression is passed to [`EnvFilter`]
//! verbatim, so embedders can still tune third-party targets themselves.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use switchboard_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Root target shared by every event the engine emits.
pub const ROOT_TARGET: &str = "switchboard";

/// Level applied to non-switchboard targets when `log_filter` is a bare level.
pub const DEPENDENCY_LEVEL: &str = "warn";

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another subscriber was installed by someone else.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the process-wide tracing subscriber on first use.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching global
/// state, so embedders and tests may call this freely.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a foreign
/// subscriber is already installed.
///
/// # Examples
///
/// ```rust
/// use switchboard::telemetry;
/// use switchboard_config::Config;
///
/// # fn main() -> Result<(), telemetry::TelemetryError> {
/// let config = Config::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// drop(first);
/// drop(second);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(filter_directives(config.log_filter()))
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |env_filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

/// Expands `log_filter` into the directives handed to [`EnvFilter`].
///
/// ```rust
/// use switchboard::telemetry::filter_directives;
///
/// assert_eq!(filter_directives("debug"), "warn,switchboard=debug");
/// assert_eq!(filter_directives("info,hyper=debug"), "info,hyper=debug");
/// ```
#[must_use]
pub fn filter_directives(log_filter: &str) -> String {
    let trimmed = log_filter.trim();
    if LevelFilter::from_str(trimmed).is_ok() {
        format!(
            "{DEPENDENCY_LEVEL},{ROOT_TARGET}={}",
            trimmed.to_ascii_lowercase()
        )
    } else {
        trimmed.to_owned()
    }
}

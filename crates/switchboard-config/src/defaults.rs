use crate::logging::LogFormat;

/// Default prefix prepended to routable command paths.
pub const DEFAULT_ROUTE_PREFIX: &str = "";

/// Introspection routes are bound unless disabled.
pub const DEFAULT_HELP_ROUTES: bool = true;

/// Declined activation hooks exclude the command instead of aborting startup.
pub const DEFAULT_STRICT_ACTIVATION: bool = false;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default route prefix as an owned value for serde.
pub fn default_route_prefix() -> String {
    DEFAULT_ROUTE_PREFIX.to_owned()
}

/// Default introspection route switch for serde.
pub const fn default_help_routes() -> bool {
    DEFAULT_HELP_ROUTES
}

/// Default activation strictness for serde.
pub const fn default_strict_activation() -> bool {
    DEFAULT_STRICT_ACTIVATION
}

/// Default log filter expression.
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

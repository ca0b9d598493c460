//! Lifecycle reporting for bootstrap and registry construction.

use std::sync::Arc;

use switchboard_config::Config;

use crate::bootstrap::BootstrapError;
use crate::registry::CommandRegistry;

/// Tracing target for lifecycle events.
pub const LIFECYCLE_TARGET: &str = "switchboard::health";

/// Observer notified as a switchboard starts up.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the command registry has been built.
    fn registry_built(&self, registry: &CommandRegistry);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn registry_built(&self, registry: &CommandRegistry) {
        (**self).registry_built(registry);
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Reporter that records lifecycle events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_starting",
            "starting switchboard bootstrap"
        );
    }

    fn registry_built(&self, registry: &CommandRegistry) {
        let inactive = registry.inactive();
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "registry_built",
            commands = registry.len(),
            inactive = ?inactive,
            route_prefix = %registry.options().route_prefix(),
            "command registry ready"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_succeeded",
            route_prefix = %config.route_prefix(),
            help_routes = config.help_routes(),
            strict_activation = config.strict_activation(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "switchboard bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "switchboard bootstrap failed"
        );
    }
}

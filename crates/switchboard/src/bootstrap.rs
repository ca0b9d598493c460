//! Start-up orchestration.
//!
//! Bootstrap loads configuration, installs telemetry, and builds the command
//! registry against the embedder's transport binding. Any failure is fatal:
//! the caller must not start serving.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use switchboard_config::Config;

use crate::dispatch::Dispatcher;
use crate::lifecycle::{LifecycleReporter, StructuredLifecycleReporter};
use crate::registry::{
    CommandRegistry, RegistryBuilder, RegistryError, RegistryOptions, TransportBinding,
};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Abstracts configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no valid configuration can be
    /// resolved.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`], reading files, environment,
/// and process arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that always yields the same, already resolved configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The command registry could not be built.
    #[error("failed to build command registry: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// A bootstrapped switchboard, ready to serve.
#[derive(Debug)]
pub struct Switchboard {
    config: Config,
    registry: Arc<CommandRegistry>,
    dispatcher: Dispatcher,
    telemetry: TelemetryHandle,
}

impl Switchboard {
    /// Returns the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the command registry.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Returns the dispatcher; clone it into each transport worker.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

/// Bootstraps using the process configuration and structured lifecycle logs.
///
/// # Errors
///
/// Returns [`BootstrapError`] when any start-up step fails.
pub fn bootstrap(
    builder: RegistryBuilder,
    binding: &mut dyn TransportBinding,
) -> Result<Switchboard, BootstrapError> {
    bootstrap_with(
        &SystemConfigLoader,
        Arc::new(StructuredLifecycleReporter::new()),
        builder,
        binding,
    )
}

/// Bootstraps using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when any start-up step fails. The reporter is
/// told about the failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn LifecycleReporter>,
    builder: RegistryBuilder,
    binding: &mut dyn TransportBinding,
) -> Result<Switchboard, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let options = RegistryOptions::from_config(&config);
    let registry = match builder.build(&options, binding) {
        Ok(registry) => Arc::new(registry),
        Err(source) => {
            let error = BootstrapError::Registry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };
    reporter.registry_built(&registry);
    reporter.bootstrap_succeeded(&config);

    Ok(Switchboard {
        config,
        dispatcher: Dispatcher::new(Arc::clone(&registry)),
        registry,
        telemetry,
    })
}

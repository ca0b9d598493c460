//! Shared world for bootstrap scenarios.

use std::sync::Arc;

use switchboard_config::Config;

use crate::auth::AuthRequirement;
use crate::bootstrap::{BootstrapError, ConfigLoader, StaticConfigLoader, Switchboard, bootstrap_with};
use crate::outcome::Outcome;
use crate::registry::{RegistryBuilder, RouteTable};

use super::{FailingConfigLoader, RecordingLifecycleReporter, get, replying};

/// Mutable state threaded through bootstrap steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    builder: Option<RegistryBuilder>,
    /// Reporter capturing lifecycle events.
    pub reporter: Arc<RecordingLifecycleReporter>,
    /// Routes bound during bootstrap.
    pub routes: RouteTable,
    result: Option<Result<Switchboard, BootstrapError>>,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(Config::default())),
            builder: Some(RegistryBuilder::new()),
            reporter: Arc::new(RecordingLifecycleReporter::default()),
            routes: RouteTable::new(),
            result: None,
        }
    }

    /// Loads the default configuration.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(StaticConfigLoader::new(Config::default()));
    }

    /// Loads a configuration that cannot be parsed.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    /// Loads a configuration that mounts commands under `prefix`.
    pub fn use_route_prefix(&mut self, prefix: &str) {
        let config = Config {
            route_prefix: prefix.to_owned(),
            ..Config::default()
        };
        self.loader = Box::new(StaticConfigLoader::new(config));
    }

    /// Declares a public `GET` command answering `"hi"`.
    pub fn register_hello(&mut self, link: &str) {
        self.builder_mut()
            .register(replying(get(link), Outcome::ok("hi")));
    }

    /// Declares a command guarded by a predicate nobody registered.
    pub fn register_guarded_by_unknown_predicate(&mut self, link: &str) {
        self.builder_mut().register(replying(
            get(link).with_auth(AuthRequirement::predicate("missing")),
            Outcome::ok("hi"),
        ));
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        let builder = self.builder.take().unwrap_or_default();
        let reporter = Arc::clone(&self.reporter);
        self.result = Some(bootstrap_with(
            self.loader.as_ref(),
            reporter,
            builder,
            &mut self.routes,
        ));
    }

    /// Returns the bootstrap error, if bootstrap failed.
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.result.as_ref().and_then(|result| result.as_ref().err())
    }

    /// Returns the running switchboard, if bootstrap succeeded.
    pub fn switchboard(&self) -> Option<&Switchboard> {
        self.result.as_ref().and_then(|result| result.as_ref().ok())
    }

    fn builder_mut(&mut self) -> &mut RegistryBuilder {
        self.builder.get_or_insert_with(RegistryBuilder::new)
    }
}

/// Builds a fresh world using the default configuration.
pub fn world() -> TestWorld {
    TestWorld::new()
}

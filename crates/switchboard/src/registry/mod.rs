//! Command registry.
//!
//! Commands and authorization predicates are collected on a
//! [`RegistryBuilder`]. Building validates every declaration, runs each
//! command's activation check exactly once, and binds the public, active
//! commands (plus their `/help` introspection routes) to a
//! [`TransportBinding`]. The resulting [`CommandRegistry`] never changes and
//! is shared with dispatchers through an `Arc`.

mod binding;
mod help;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use switchboard_config::Config;
use thiserror::Error;

use crate::auth::{AuthContext, AuthError, AuthGate, AuthPredicate};
use crate::command::{Command, CommandDescriptor, Method, Visibility};
use crate::secrecy::Secrecy;

pub use self::binding::{BindError, Route, RouteTable, TransportBinding};
pub use self::help::HelpDocument;

/// Tracing target for registry events.
pub const REGISTRY_TARGET: &str = "switchboard::registry";

/// Suffix appended to a command's path for its introspection route.
pub const HELP_SUFFIX: &str = "/help";

/// Options shaping how commands are bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    route_prefix: String,
    help_routes: bool,
    strict_activation: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            route_prefix: String::new(),
            help_routes: true,
            strict_activation: false,
        }
    }
}

impl RegistryOptions {
    /// Creates options with no prefix, help routes on, and lenient activation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives options from the process configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            route_prefix: config.route_prefix().to_owned(),
            help_routes: config.help_routes(),
            strict_activation: config.strict_activation(),
        }
    }

    /// Sets the prefix prepended to every routable path.
    #[must_use]
    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into().trim_end_matches('/').to_owned();
        self
    }

    /// Enables or disables `/help` routes globally.
    #[must_use]
    pub const fn with_help_routes(mut self, enabled: bool) -> Self {
        self.help_routes = enabled;
        self
    }

    /// Makes a declined activation check abort the build.
    #[must_use]
    pub const fn with_strict_activation(mut self, strict: bool) -> Self {
        self.strict_activation = strict;
        self
    }

    /// Returns the route prefix.
    #[must_use]
    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Returns whether `/help` routes are bound.
    #[must_use]
    pub const fn help_routes(&self) -> bool {
        self.help_routes
    }

    /// Returns whether declined activation checks are fatal.
    #[must_use]
    pub const fn strict_activation(&self) -> bool {
        self.strict_activation
    }
}

/// Errors that prevent a registry from being built.
///
/// Every variant is fatal: a process whose registry fails to build must not
/// start serving.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A command names an authorization predicate nobody registered.
    #[error("command '{command}' requires unknown authorization predicate '{predicate}'")]
    UnknownAuthPredicate {
        /// Name of the command.
        command: String,
        /// The missing predicate name.
        predicate: String,
    },
    /// A command's activation check declined while activation is strict.
    #[error("command '{command}' declined activation")]
    ActivationFailed {
        /// Name of the command.
        command: String,
    },
    /// Two commands share a verb and link.
    #[error("{method} {link} is declared by both '{first}' and '{second}'")]
    DuplicateCommand {
        /// Shared verb.
        method: Method,
        /// Shared link.
        link: String,
        /// Command registered first.
        first: String,
        /// Command registered second.
        second: String,
    },
    /// A command's link is empty or does not start with `/`.
    #[error("command '{command}' has invalid link '{link}': links must start with '/'")]
    InvalidLink {
        /// Name of the command.
        command: String,
        /// The offending link.
        link: String,
    },
    /// The transport binding refused a route.
    #[error(transparent)]
    Binding(#[from] BindError),
}

/// A command as the registry resolved it.
pub struct RegisteredCommand {
    command: Arc<dyn Command>,
    secrecy: Secrecy,
    active: bool,
    effective_path: String,
}

impl RegisteredCommand {
    /// Returns the command's declaration.
    #[must_use]
    pub fn descriptor(&self) -> &CommandDescriptor {
        self.command.descriptor()
    }

    /// Returns the command's hooks.
    #[must_use]
    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }

    /// Returns the resolved secrecy.
    #[must_use]
    pub const fn secrecy(&self) -> Secrecy {
        self.secrecy
    }

    /// Returns whether the activation check accepted the command.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns whether the command is bound to the transport.
    #[must_use]
    pub fn is_routable(&self) -> bool {
        self.active && self.descriptor().visibility() == Visibility::Public
    }

    /// Returns the path the command is (or would be) bound at.
    #[must_use]
    pub fn effective_path(&self) -> &str {
        &self.effective_path
    }

    /// Returns the path of the command's introspection route.
    #[must_use]
    pub fn help_path(&self) -> String {
        format!("{}{HELP_SUFFIX}", self.effective_path.trim_end_matches('/'))
    }
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let descriptor = self.descriptor();
        f.debug_struct("RegisteredCommand")
            .field("name", &descriptor.name())
            .field("method", &descriptor.method())
            .field("link", &descriptor.link())
            .field("secrecy", &self.secrecy)
            .field("active", &self.active)
            .field("effective_path", &self.effective_path)
            .finish_non_exhaustive()
    }
}

/// Collects commands and predicates before the registry is built.
#[derive(Default)]
pub struct RegistryBuilder {
    commands: Vec<Arc<dyn Command>>,
    gate: AuthGate,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already populated authorization gate.
    #[must_use]
    pub fn with_gate(gate: AuthGate) -> Self {
        Self {
            commands: Vec::new(),
            gate,
        }
    }

    /// Adds a command.
    pub fn register(&mut self, command: impl Command + 'static) -> &mut Self {
        self.commands.push(Arc::new(command));
        self
    }

    /// Adds a command that is already shared.
    pub fn register_shared(&mut self, command: Arc<dyn Command>) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Registers a named authorization predicate.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicatePredicate`] if the name is taken.
    pub fn register_predicate(
        &mut self,
        name: impl Into<String>,
        predicate: Arc<dyn AuthPredicate>,
    ) -> Result<&mut Self, AuthError> {
        self.gate.register(name, predicate)?;
        Ok(self)
    }

    /// Registers a synchronous closure as a named authorization predicate.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicatePredicate`] if the name is taken.
    pub fn register_predicate_fn<F>(
        &mut self,
        name: impl Into<String>,
        check: F,
    ) -> Result<&mut Self, AuthError>
    where
        F: Fn(&AuthContext) -> bool + Send + Sync + 'static,
    {
        self.gate.register_fn(name, check)?;
        Ok(self)
    }

    /// Returns the number of commands collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when no commands have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Validates, activates, and binds every collected command.
    ///
    /// Declarations are validated before any activation check runs, so an
    /// invalid registry never triggers a command's start-up side effects.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] for the first invalid declaration, declined
    /// activation under strict mode, or refused route.
    pub fn build(
        self,
        options: &RegistryOptions,
        binding: &mut dyn TransportBinding,
    ) -> Result<CommandRegistry, RegistryError> {
        self.validate()?;

        let mut commands = Vec::with_capacity(self.commands.len());
        let mut index = HashMap::with_capacity(self.commands.len());
        for command in self.commands {
            let registered = Arc::new(activate(command, options)?);
            bind(&registered, options, binding)?;
            let descriptor = registered.descriptor();
            index.insert(
                (descriptor.method(), descriptor.link().to_owned()),
                commands.len(),
            );
            commands.push(registered);
        }

        tracing::info!(
            target: REGISTRY_TARGET,
            event = "registry_built",
            commands = commands.len(),
            active = commands.iter().filter(|command| command.is_active()).count(),
            predicates = self.gate.len(),
            "command registry built"
        );

        Ok(CommandRegistry {
            commands,
            index,
            gate: self.gate,
            options: options.clone(),
        })
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut seen: HashMap<(Method, &str), &str> = HashMap::new();
        for command in &self.commands {
            let descriptor = command.descriptor();
            if !descriptor.link().starts_with('/') {
                return Err(RegistryError::InvalidLink {
                    command: descriptor.name().to_owned(),
                    link: descriptor.link().to_owned(),
                });
            }
            if let Some(predicate) = descriptor.auth().predicate_name()
                && !self.gate.contains(predicate)
            {
                return Err(RegistryError::UnknownAuthPredicate {
                    command: descriptor.name().to_owned(),
                    predicate: predicate.to_owned(),
                });
            }
            let key = (descriptor.method(), descriptor.link());
            if let Some(first) = seen.insert(key, descriptor.name()) {
                return Err(RegistryError::DuplicateCommand {
                    method: descriptor.method(),
                    link: descriptor.link().to_owned(),
                    first: first.to_owned(),
                    second: descriptor.name().to_owned(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .commands
            .iter()
            .map(|command| command.descriptor().name())
            .collect();
        f.debug_struct("RegistryBuilder")
            .field("commands", &names)
            .field("gate", &self.gate)
            .finish()
    }
}

fn activate(
    command: Arc<dyn Command>,
    options: &RegistryOptions,
) -> Result<RegisteredCommand, RegistryError> {
    let descriptor = command.descriptor();
    let active = command.start();
    if !active {
        if options.strict_activation() {
            return Err(RegistryError::ActivationFailed {
                command: descriptor.name().to_owned(),
            });
        }
        tracing::info!(
            target: REGISTRY_TARGET,
            event = "command_inactive",
            command = %descriptor.name(),
            method = %descriptor.method(),
            link = %descriptor.link(),
            "command declined activation and will not be routed"
        );
    }

    let secrecy = Secrecy::resolve(descriptor.secrecy());
    let effective_path = descriptor.effective_path(options.route_prefix());
    Ok(RegisteredCommand {
        command,
        secrecy,
        active,
        effective_path,
    })
}

fn bind(
    registered: &Arc<RegisteredCommand>,
    options: &RegistryOptions,
    binding: &mut dyn TransportBinding,
) -> Result<(), RegistryError> {
    if !registered.is_routable() {
        return Ok(());
    }
    let method = registered.descriptor().method();
    binding.bind(
        method,
        registered.effective_path(),
        Route::Command(Arc::clone(registered)),
    )?;
    tracing::debug!(
        target: REGISTRY_TARGET,
        event = "route_bound",
        command = %registered.descriptor().name(),
        method = %method,
        path = %registered.effective_path(),
        "command bound"
    );

    if options.help_routes() && registered.secrecy().help_route_allowed() {
        let help_path = registered.help_path();
        let document = Arc::new(HelpDocument::describe(registered));
        binding.bind(method, &help_path, Route::Help(document))?;
        tracing::debug!(
            target: REGISTRY_TARGET,
            event = "help_bound",
            command = %registered.descriptor().name(),
            method = %method,
            path = %help_path,
            "help route bound"
        );
    }
    Ok(())
}

/// The immutable table of registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<RegisteredCommand>>,
    index: HashMap<(Method, String), usize>,
    gate: AuthGate,
    options: RegistryOptions,
}

impl CommandRegistry {
    /// Looks a command up by exact verb and link.
    ///
    /// Inactive commands are returned too; callers decide how to treat them.
    #[must_use]
    pub fn lookup(&self, method: Method, link: &str) -> Option<&Arc<RegisteredCommand>> {
        self.index
            .get(&(method, link.to_owned()))
            .and_then(|position| self.commands.get(*position))
    }

    /// Returns the authorization gate.
    #[must_use]
    pub const fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Returns the options the registry was built with.
    #[must_use]
    pub const fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Iterates over commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredCommand>> {
        self.commands.iter()
    }

    /// Returns the names of commands that declined activation.
    #[must_use]
    pub fn inactive(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|command| !command.is_active())
            .map(|command| command.descriptor().name())
            .collect()
    }

    /// Returns the number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands)
            .field("gate", &self.gate)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;

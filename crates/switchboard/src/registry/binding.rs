//! The boundary between the registry and a network transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::{HelpDocument, RegisteredCommand};
use crate::command::Method;

/// What a bound path resolves to.
#[derive(Debug, Clone)]
pub enum Route {
    /// A command; calls go through the dispatcher.
    Command(Arc<RegisteredCommand>),
    /// An introspection document; served as is.
    Help(Arc<HelpDocument>),
}

/// Errors a transport binding may raise while routes are bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The verb and path are already bound.
    #[error("{method} {path} is already bound")]
    Conflict {
        /// Contested verb.
        method: Method,
        /// Contested path.
        path: String,
    },
    /// The transport rejected the route for its own reasons.
    #[error("transport rejected {method} {path}: {message}")]
    Rejected {
        /// Verb of the rejected route.
        method: Method,
        /// Path of the rejected route.
        path: String,
        /// Transport-supplied explanation.
        message: String,
    },
}

/// Receives routes while a registry is built.
///
/// Implementations own path pattern matching; the engine hands over the
/// declared paths verbatim.
pub trait TransportBinding {
    /// Binds `route` at `path` for `method`.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] when the route cannot be bound.
    fn bind(&mut self, method: Method, path: &str, route: Route) -> Result<(), BindError>;
}

/// In-memory binding keyed by exact verb and path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<(Method, String), Route>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the route bound at exactly `path` for `method`.
    #[must_use]
    pub fn get(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes.get(&(method, path.to_owned()))
    }

    /// Returns `true` when something is bound at `path` for `method`.
    #[must_use]
    pub fn contains(&self, method: Method, path: &str) -> bool {
        self.get(method, path).is_some()
    }

    /// Iterates over bindings ordered by verb, then path.
    pub fn iter(&self) -> impl Iterator<Item = (Method, &str, &Route)> {
        self.routes
            .iter()
            .map(|((method, path), route)| (*method, path.as_str(), route))
    }

    /// Returns the number of bound routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl TransportBinding for RouteTable {
    fn bind(&mut self, method: Method, path: &str, route: Route) -> Result<(), BindError> {
        let key = (method, path.to_owned());
        if self.routes.contains_key(&key) {
            return Err(BindError::Conflict {
                method,
                path: key.1,
            });
        }
        self.routes.insert(key, route);
        Ok(())
    }
}

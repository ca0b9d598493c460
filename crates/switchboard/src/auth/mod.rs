//! Authorization gate.
//!
//! Every command declares an [`AuthRequirement`]. Literal requirements are
//! resolved without any lookup; named requirements are answered by an
//! [`AuthPredicate`] registered on the [`AuthGate`] before the command
//! registry is built. The registry refuses to build when a command names a
//! predicate the gate does not know, so evaluation never meets an unknown
//! name in practice.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::request::{RequestContext, StringMap};

/// Tracing target for authorization events.
pub const AUTH_TARGET: &str = "switchboard::auth";

/// Access requirement declared by a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RequirementRepr", into = "RequirementRepr")]
pub enum AuthRequirement {
    /// Every caller is allowed (`true`).
    #[default]
    Allow,
    /// Every caller is denied (`false`).
    Deny,
    /// The named predicate decides.
    Predicate(String),
}

impl AuthRequirement {
    /// Builds a requirement answered by the named predicate.
    #[must_use]
    pub fn predicate(name: impl Into<String>) -> Self {
        Self::Predicate(name.into())
    }

    /// Returns the predicate name, if the requirement references one.
    #[must_use]
    pub fn predicate_name(&self) -> Option<&str> {
        match self {
            Self::Predicate(name) => Some(name),
            Self::Allow | Self::Deny => None,
        }
    }
}

impl From<bool> for AuthRequirement {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

impl fmt::Display for AuthRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("true"),
            Self::Deny => f.write_str("false"),
            Self::Predicate(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RequirementRepr {
    Flag(bool),
    Named(String),
}

impl From<RequirementRepr> for AuthRequirement {
    fn from(repr: RequirementRepr) -> Self {
        match repr {
            RequirementRepr::Flag(allowed) => Self::from(allowed),
            RequirementRepr::Named(name) => Self::Predicate(name),
        }
    }
}

impl From<AuthRequirement> for RequirementRepr {
    fn from(requirement: AuthRequirement) -> Self {
        match requirement {
            AuthRequirement::Allow => Self::Flag(true),
            AuthRequirement::Deny => Self::Flag(false),
            AuthRequirement::Predicate(name) => Self::Named(name),
        }
    }
}

/// The slice of a request an authorization predicate may inspect.
///
/// Uploaded files and cookies are never exposed to predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    template: Option<usize>,
    body: Option<Value>,
    headers: StringMap,
    path_vars: StringMap,
    query: StringMap,
}

impl AuthContext {
    /// Returns the index of the input contract the body matched.
    #[must_use]
    pub const fn template(&self) -> Option<usize> {
        self.template
    }

    /// Returns the normalized body, absent when the command takes no input.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &StringMap {
        &self.headers
    }

    /// Returns a single header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns the path variables extracted by the transport.
    #[must_use]
    pub const fn path_vars(&self) -> &StringMap {
        &self.path_vars
    }

    /// Returns the query values.
    #[must_use]
    pub const fn query(&self) -> &StringMap {
        &self.query
    }
}

impl From<&RequestContext> for AuthContext {
    fn from(request: &RequestContext) -> Self {
        Self {
            template: request.template(),
            body: request.body().cloned(),
            headers: request.headers().clone(),
            path_vars: request.path_vars().clone(),
            query: request.query().clone(),
        }
    }
}

/// A named access check consulted for [`AuthRequirement::Predicate`].
///
/// Predicates may suspend on I/O and are evaluated concurrently for
/// overlapping calls, so they must not rely on exclusive access to any state.
#[async_trait]
pub trait AuthPredicate: Send + Sync {
    /// Returns `true` when the caller described by `context` is allowed.
    async fn allows(&self, context: &AuthContext) -> bool;
}

/// Adapts a synchronous closure into an [`AuthPredicate`].
pub struct FnPredicate<F> {
    check: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&AuthContext) -> bool + Send + Sync,
{
    /// Wraps `check`.
    #[must_use]
    pub const fn new(check: F) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<F> AuthPredicate for FnPredicate<F>
where
    F: Fn(&AuthContext) -> bool + Send + Sync,
{
    async fn allows(&self, context: &AuthContext) -> bool {
        (self.check)(context)
    }
}

/// Errors raised while populating an [`AuthGate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A predicate with the same name was already registered.
    #[error("authorization predicate '{name}' is already registered")]
    DuplicatePredicate {
        /// The contested name.
        name: String,
    },
}

/// Registry of named authorization predicates.
#[derive(Clone, Default)]
pub struct AuthGate {
    predicates: HashMap<String, Arc<dyn AuthPredicate>>,
}

impl AuthGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a predicate under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicatePredicate`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        predicate: Arc<dyn AuthPredicate>,
    ) -> Result<(), AuthError> {
        let key = name.into();
        if self.predicates.contains_key(&key) {
            return Err(AuthError::DuplicatePredicate { name: key });
        }
        self.predicates.insert(key, predicate);
        Ok(())
    }

    /// Registers a synchronous closure as a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicatePredicate`] if the name is taken.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, check: F) -> Result<(), AuthError>
    where
        F: Fn(&AuthContext) -> bool + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnPredicate::new(check)))
    }

    /// Returns `true` when a predicate named `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Returns the number of registered predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns `true` when no predicates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Decides whether `requirement` admits the caller in `context`.
    ///
    /// An unknown predicate name denies the call.
    pub async fn evaluate(&self, requirement: &AuthRequirement, context: &AuthContext) -> bool {
        match requirement {
            AuthRequirement::Allow => true,
            AuthRequirement::Deny => false,
            AuthRequirement::Predicate(name) => {
                let Some(predicate) = self.predicates.get(name) else {
                    tracing::warn!(
                        target: AUTH_TARGET,
                        event = "unknown_predicate",
                        predicate = %name,
                        "authorization predicate missing at evaluation time"
                    );
                    return false;
                };
                predicate.allows(context).await
            }
        }
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AuthGate")
            .field("predicates", &names)
            .finish()
    }
}

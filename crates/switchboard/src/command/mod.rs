//! Command declarations.
//!
//! A command pairs an immutable [`CommandDescriptor`] (where it lives, who may
//! call it, which shapes it accepts and returns) with two hooks: an activation
//! check run once when the registry is built, and the business logic run for
//! every call.

mod descriptor;

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::outcome::Outcome;
use crate::request::RequestContext;

pub use self::descriptor::CommandDescriptor;

/// HTTP verb a command answers to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the canonical upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

/// Whether a command is reachable over the transport.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Visibility {
    /// Bound to the transport and reachable by direct invocation.
    #[default]
    Public,
    /// Reachable only by direct invocation; authorization still applies
    /// unless the caller forces it.
    Private,
}

/// A self-contained request handler.
///
/// Implementations are shared between concurrent calls and must not assume
/// exclusive access to their own state while `run` is executing.
#[async_trait]
pub trait Command: Send + Sync {
    /// Returns the command's declaration.
    fn descriptor(&self) -> &CommandDescriptor;

    /// Decides, once at registry build time, whether the command is routable.
    fn start(&self) -> bool {
        true
    }

    /// Runs the business logic for one call.
    ///
    /// Returned errors and panics are logged and answered with a generic
    /// server error; neither reaches the caller.
    async fn run(&self, context: RequestContext) -> anyhow::Result<Outcome>;
}

type Activation = Box<dyn Fn() -> bool + Send + Sync>;

/// A [`Command`] backed by an async closure.
pub struct FnCommand<F> {
    descriptor: CommandDescriptor,
    handler: F,
    activation: Option<Activation>,
}

impl<F, Fut> FnCommand<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
{
    /// Wraps `handler` as the business logic for `descriptor`.
    #[must_use]
    pub const fn new(descriptor: CommandDescriptor, handler: F) -> Self {
        Self {
            descriptor,
            handler,
            activation: None,
        }
    }

    /// Installs an activation check; without one the command is always active.
    #[must_use]
    pub fn with_activation(mut self, activation: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.activation = Some(Box::new(activation));
        self
    }
}

#[async_trait]
impl<F, Fut> Command for FnCommand<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
{
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn start(&self) -> bool {
        self.activation.as_ref().is_none_or(|activation| activation())
    }

    async fn run(&self, context: RequestContext) -> anyhow::Result<Outcome> {
        (self.handler)(context).await
    }
}

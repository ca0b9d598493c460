//! Request dispatch.
//!
//! The [`Dispatcher`] is the single place a call is decided. Transport
//! bindings hand it the command they matched ([`Dispatcher::dispatch_bound`]
//! or [`Dispatcher::dispatch_route`]); privileged in-process callers address a
//! command by exact verb and link ([`Dispatcher::dispatch`]) and may bypass
//! authorization. Both paths run the same pipeline:
//!
//! 1. select the first input contract the body satisfies, normalizing it;
//! 2. authorize, unless the caller forces it (a panicking predicate is a
//!    server error, not a denial);
//! 3. reject a body that matched no declared input contract;
//! 4. run the business logic, containing errors and panics;
//! 5. validate and normalize the answer against the output contracts, or
//!    confirm a returned file can be read.
//!
//! Denial is decided before contract rejection, so callers who may not use a
//! command learn nothing about the shapes it accepts.

mod errors;

use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;

use crate::auth::AuthContext;
use crate::command::Method;
use crate::contract::{Selection, conform_output, select};
use crate::outcome::Outcome;
use crate::registry::{CommandRegistry, RegisteredCommand, Route};
use crate::request::RawRequest;

pub use self::errors::{DISPATCH_TARGET, DispatchFailure};

/// Decides the outcome of calls against an immutable registry.
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry calls are resolved against.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Invokes the command declared at exactly `method` and `link`.
    ///
    /// This is the only way to reach private commands. With `force_auth` the
    /// authorization step is skipped; contracts are still enforced. Unknown and
    /// inactive commands answer `("Command not found", 404)`.
    pub async fn dispatch(
        &self,
        method: Method,
        link: &str,
        force_auth: bool,
        request: RawRequest,
    ) -> Outcome {
        let Some(command) = self
            .registry
            .lookup(method, link)
            .filter(|command| command.is_active())
        else {
            let failure = DispatchFailure::NotFound {
                method,
                link: link.to_owned(),
            };
            failure.log();
            return failure.outcome();
        };
        self.execute(command, force_auth, request).await
    }

    /// Invokes a command a transport binding has already matched.
    ///
    /// Authorization always runs on this path.
    pub async fn dispatch_bound(&self, command: &RegisteredCommand, request: RawRequest) -> Outcome {
        self.execute(command, false, request).await
    }

    /// Answers a call on any route the registry bound.
    pub async fn dispatch_route(&self, route: &Route, request: RawRequest) -> Outcome {
        match route {
            Route::Command(command) => self.dispatch_bound(command, request).await,
            Route::Help(document) => document.to_outcome().unwrap_or_else(|error| {
                tracing::error!(
                    target: DISPATCH_TARGET,
                    event = "help_render_failed",
                    command = %document.name(),
                    error = %error,
                    "failed to render help document"
                );
                Outcome::internal_error()
            }),
        }
    }

    async fn execute(
        &self,
        command: &RegisteredCommand,
        force_auth: bool,
        request: RawRequest,
    ) -> Outcome {
        let descriptor = command.descriptor();
        match self.pipeline(command, force_auth, request).await {
            Ok(outcome) => {
                tracing::debug!(
                    target: DISPATCH_TARGET,
                    event = "dispatch_succeeded",
                    command = %descriptor.name(),
                    method = %descriptor.method(),
                    link = %descriptor.link(),
                    force_auth,
                    status = outcome.status().as_u16(),
                    "dispatch succeeded"
                );
                outcome
            }
            Err(failure) => {
                failure.log();
                failure.outcome()
            }
        }
    }

    async fn pipeline(
        &self,
        command: &RegisteredCommand,
        force_auth: bool,
        request: RawRequest,
    ) -> Result<Outcome, DispatchFailure> {
        let descriptor = command.descriptor();
        let contracts = descriptor.input_contracts();

        let selection = if contracts.is_empty() {
            Ok(None)
        } else {
            select(&request.body_or_empty(), contracts).map(Some).ok_or(())
        };
        let (template, body) = match &selection {
            Ok(Some(Selection { index, value })) => (Some(*index), Some(value.clone())),
            Ok(None) | Err(()) => (None, None),
        };
        let context = request.into_context(template, body, command.effective_path());

        if !force_auth {
            let auth_context = AuthContext::from(&context);
            let allowed = AssertUnwindSafe(
                self.registry
                    .gate()
                    .evaluate(descriptor.auth(), &auth_context),
            )
            .catch_unwind()
            .await
            .map_err(|payload| DispatchFailure::PredicatePanicked {
                command: descriptor.name().to_owned(),
                message: panic_message(payload.as_ref()),
            })?;
            if !allowed {
                return Err(DispatchFailure::Denied {
                    command: descriptor.name().to_owned(),
                    secrecy: command.secrecy(),
                });
            }
        }

        if selection.is_err() {
            return Err(DispatchFailure::BadRequest {
                command: descriptor.name().to_owned(),
                declared: contracts.len(),
            });
        }

        let outcome = AssertUnwindSafe(command.command().run(context))
            .catch_unwind()
            .await
            .map_err(|payload| DispatchFailure::HandlerPanicked {
                command: descriptor.name().to_owned(),
                message: panic_message(payload.as_ref()),
            })?
            .map_err(|source| DispatchFailure::HandlerFailed {
                command: descriptor.name().to_owned(),
                source,
            })?;

        check_outcome(command, outcome).await
    }
}

async fn check_outcome(
    command: &RegisteredCommand,
    outcome: Outcome,
) -> Result<Outcome, DispatchFailure> {
    let descriptor = command.descriptor();
    match outcome {
        Outcome::Body { body, status } => {
            let normalized = conform_output(body.as_ref(), descriptor.output_contracts())
                .map_err(|source| DispatchFailure::OutputContractViolation {
                    command: descriptor.name().to_owned(),
                    source,
                })?;
            Ok(Outcome::Body {
                body: normalized,
                status,
            })
        }
        Outcome::File { path, status } => match ensure_readable(&path).await {
            Ok(()) => Ok(Outcome::File { path, status }),
            Err(source) => Err(DispatchFailure::UnreadableFile {
                command: descriptor.name().to_owned(),
                path,
                source,
            }),
        },
    }
}

async fn ensure_readable(path: &Path) -> io::Result<()> {
    let file = tokio::fs::File::open(path).await?;
    if file.metadata().await?.is_file() {
        Ok(())
    } else {
        Err(io::Error::other("not a regular file"))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

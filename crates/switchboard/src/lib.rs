//! Request dispatch and contract validation.
//!
//! Application authors declare self-contained commands: a link, an HTTP
//! verb, an authorization requirement, shape contracts for the request body
//! and the result, and whether the command is reachable over the network. The
//! engine binds, authorizes, validates, and invokes them.
//!
//! Start-up is explicit. Commands and authorization predicates are collected
//! on a [`RegistryBuilder`], which validates every declaration, runs each
//! command's activation check once, and hands the public, active commands to
//! the embedder's [`TransportBinding`]. From then on the [`CommandRegistry`]
//! is immutable and the [`Dispatcher`] answers every call with exactly one
//! [`Outcome`]:
//!
//! * the network path ([`Dispatcher::dispatch_bound`]) receives the command
//!   the transport matched and always runs authorization;
//! * the direct path ([`Dispatcher::dispatch`]) addresses a command by exact
//!   verb and link, reaches private commands, and may skip authorization.
//!
//! Both paths select the first matching input [`Contract`], authorize, reject
//! unmatched bodies, contain business-logic failures, and hold results to the
//! command's own output contracts. Failures become plain-string outcomes; their
//! causes are only logged.
//!
//! ```
//! use std::sync::Arc;
//!
//! use http::StatusCode;
//! use switchboard::{
//!     CommandDescriptor, Dispatcher, FnCommand, Method, Outcome, RawRequest, RegistryBuilder,
//!     RegistryOptions, RouteTable,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = RegistryBuilder::new();
//! builder.register(FnCommand::new(
//!     CommandDescriptor::new("hello", Method::Get, "/hello"),
//!     |_context| async { anyhow::Ok(Outcome::ok("hi")) },
//! ));
//!
//! let mut routes = RouteTable::new();
//! let registry = builder.build(&RegistryOptions::new(), &mut routes)?;
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let outcome = dispatcher
//!     .dispatch(Method::Get, "/hello", false, RawRequest::new())
//!     .await;
//! assert_eq!(outcome.status(), StatusCode::OK);
//! # Ok(())
//! # }
//! ```

pub mod auth;
mod bootstrap;
pub mod command;
pub mod contract;
pub mod dispatch;
mod lifecycle;
mod outcome;
pub mod registry;
mod request;
pub mod secrecy;
pub mod telemetry;

pub use auth::{AuthContext, AuthGate, AuthPredicate, AuthRequirement};
pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, Switchboard, SystemConfigLoader, bootstrap,
    bootstrap_with,
};
pub use command::{Command, CommandDescriptor, FnCommand, Method, Visibility};
pub use contract::{Contract, ContractError, Field};
pub use dispatch::{DispatchFailure, Dispatcher};
pub use lifecycle::{LIFECYCLE_TARGET, LifecycleReporter, StructuredLifecycleReporter};
pub use outcome::{
    BAD_REQUEST_MESSAGE, INTERNAL_ERROR_MESSAGE, NOT_FOUND_MESSAGE, Outcome, UNAUTHORIZED_MESSAGE,
};
pub use registry::{
    CommandRegistry, HelpDocument, RegisteredCommand, RegistryBuilder, RegistryError,
    RegistryOptions, Route, RouteTable, TransportBinding,
};
pub use request::{FileMap, RawRequest, RequestContext, StringMap, UploadedFile};
pub use secrecy::{Secrecy, SecrecySpec};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;

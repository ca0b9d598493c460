//! Classification of per-call dispatch failures.
//!
//! Failures never leave the dispatcher as errors. Each one is logged under
//! [`DISPATCH_TARGET`] with its own `event` name and then answered with a
//! plain-string [`Outcome`]; the underlying cause stays in the logs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::command::Method;
use crate::contract::OutputViolation;
use crate::outcome::Outcome;
use crate::secrecy::Secrecy;

/// Tracing target for dispatch events.
pub const DISPATCH_TARGET: &str = "switchboard::dispatch";

/// Why a call did not succeed.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    /// No active command answers the verb and link.
    #[error("no active command answers {method} {link}")]
    NotFound {
        /// Requested verb.
        method: Method,
        /// Requested link.
        link: String,
    },
    /// Authorization denied the caller.
    #[error("authorization denied for command '{command}'")]
    Denied {
        /// Name of the command.
        command: String,
        /// Secrecy deciding how the denial is answered.
        secrecy: Secrecy,
    },
    /// An authorization predicate panicked while deciding the call.
    #[error("authorization predicate for command '{command}' panicked: {message}")]
    PredicatePanicked {
        /// Name of the command.
        command: String,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// The body matched none of the command's input contracts.
    #[error("body matched none of the {declared} input contracts of command '{command}'")]
    BadRequest {
        /// Name of the command.
        command: String,
        /// Number of input contracts declared.
        declared: usize,
    },
    /// The business logic returned an error.
    #[error("command '{command}' failed: {source}")]
    HandlerFailed {
        /// Name of the command.
        command: String,
        /// Error returned by the business logic.
        #[source]
        source: anyhow::Error,
    },
    /// The business logic panicked.
    #[error("command '{command}' panicked: {message}")]
    HandlerPanicked {
        /// Name of the command.
        command: String,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// The business logic answered with a body its own output contracts
    /// forbid.
    #[error("command '{command}' violated its output contract: {source}")]
    OutputContractViolation {
        /// Name of the command.
        command: String,
        /// The violation.
        #[source]
        source: OutputViolation,
    },
    /// The business logic answered with a file that cannot be read.
    #[error("command '{command}' returned unreadable file {}: {source}", .path.display())]
    UnreadableFile {
        /// Name of the command.
        command: String,
        /// The file location.
        path: PathBuf,
        /// Error raised while opening the file.
        #[source]
        source: io::Error,
    },
}

impl DispatchFailure {
    /// Returns the outcome answered to the caller.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::NotFound { .. } => Outcome::not_found(),
            Self::Denied { secrecy, .. } => secrecy.denial(),
            Self::BadRequest { .. } => Outcome::bad_request(),
            Self::PredicatePanicked { .. }
            | Self::HandlerFailed { .. }
            | Self::HandlerPanicked { .. }
            | Self::OutputContractViolation { .. }
            | Self::UnreadableFile { .. } => Outcome::internal_error(),
        }
    }

    /// Returns the `event` field value logged for this failure.
    #[must_use]
    pub const fn event(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "command_not_found",
            Self::Denied { .. } => "authorization_denied",
            Self::PredicatePanicked { .. } => "predicate_panicked",
            Self::BadRequest { .. } => "input_contract_rejected",
            Self::HandlerFailed { .. } => "handler_failed",
            Self::HandlerPanicked { .. } => "handler_panicked",
            Self::OutputContractViolation { .. } => "output_contract_violation",
            Self::UnreadableFile { .. } => "file_unreadable",
        }
    }

    /// Returns `true` for failures caused by the server rather than the
    /// caller.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::PredicatePanicked { .. }
                | Self::HandlerFailed { .. }
                | Self::HandlerPanicked { .. }
                | Self::OutputContractViolation { .. }
                | Self::UnreadableFile { .. }
        )
    }

    /// Emits the failure as a structured log event.
    pub fn log(&self) {
        let event = self.event();
        let status = self.outcome().status().as_u16();
        if self.is_server_fault() {
            tracing::error!(
                target: DISPATCH_TARGET,
                event,
                status,
                error = %self,
                "dispatch failed"
            );
        } else {
            tracing::info!(
                target: DISPATCH_TARGET,
                event,
                status,
                reason = %self,
                "dispatch rejected"
            );
        }
    }
}

//! Secrecy policy.
//!
//! Command authors write secrecy in shorthand: a single flag, or an object
//! setting exactly one of `command` and `helper` (the other flag is its
//! negation). The shorthand is resolved once, at registration, into a
//! [`Secrecy`] holding both flags explicitly.
//!
//! | shorthand                            | `/help` bound | denial status |
//! |--------------------------------------|---------------|---------------|
//! | `true`                               | no            | 404           |
//! | `false`                              | yes           | 401           |
//! | `{command: true}` / `{helper: false}`| yes           | 404           |
//! | `{command: false}` / `{helper: true}`| no            | 401           |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::Outcome;

/// Secrecy as a command author declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SecrecyRepr", into = "SecrecyRepr")]
pub enum SecrecySpec {
    /// Both the command and its help route are secret (`true`), or neither is
    /// (`false`).
    Flag(bool),
    /// Whether the command itself is secret; its help route is the opposite.
    Command(bool),
    /// Whether the help route is secret; the command itself is the opposite.
    Helper(bool),
}

impl Default for SecrecySpec {
    fn default() -> Self {
        Self::Flag(false)
    }
}

/// Errors raised when a secrecy object is neither one flag nor a consistent
/// pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecrecyError {
    /// The object set neither `command` nor `helper`.
    #[error("secrecy object must set 'command' or 'helper'")]
    Empty,
    /// The object set both flags to the same value.
    #[error("secrecy flags 'command' and 'helper' must be complementary")]
    Contradictory,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SecrecyRepr {
    Flag(bool),
    Flags(SecrecyFlags),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecrecyFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    helper: Option<bool>,
}

impl TryFrom<SecrecyRepr> for SecrecySpec {
    type Error = SecrecyError;

    fn try_from(repr: SecrecyRepr) -> Result<Self, Self::Error> {
        match repr {
            SecrecyRepr::Flag(secret) => Ok(Self::Flag(secret)),
            SecrecyRepr::Flags(SecrecyFlags { command, helper }) => match (command, helper) {
                (None, None) => Err(SecrecyError::Empty),
                (Some(command), None) => Ok(Self::Command(command)),
                (None, Some(helper)) => Ok(Self::Helper(helper)),
                (Some(command), Some(helper)) if command != helper => Ok(Self::Command(command)),
                (Some(_), Some(_)) => Err(SecrecyError::Contradictory),
            },
        }
    }
}

impl From<SecrecySpec> for SecrecyRepr {
    fn from(spec: SecrecySpec) -> Self {
        match spec {
            SecrecySpec::Flag(secret) => Self::Flag(secret),
            SecrecySpec::Command(command) => Self::Flags(SecrecyFlags {
                command: Some(command),
                helper: None,
            }),
            SecrecySpec::Helper(helper) => Self::Flags(SecrecyFlags {
                command: None,
                helper: Some(helper),
            }),
        }
    }
}

/// Resolved secrecy of a registered command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Secrecy {
    command_secret: bool,
    helper_secret: bool,
}

impl Secrecy {
    /// Resolves an authoring shorthand.
    #[must_use]
    pub const fn resolve(spec: SecrecySpec) -> Self {
        let (command_secret, helper_secret) = match spec {
            SecrecySpec::Flag(secret) => (secret, secret),
            SecrecySpec::Command(command) => (command, !command),
            SecrecySpec::Helper(helper) => (!helper, helper),
        };
        Self {
            command_secret,
            helper_secret,
        }
    }

    /// Whether a denied caller must not learn the command exists.
    #[must_use]
    pub const fn command_secret(self) -> bool {
        self.command_secret
    }

    /// Whether the introspection route is withheld.
    #[must_use]
    pub const fn helper_secret(self) -> bool {
        self.helper_secret
    }

    /// Whether a `/help` route may be bound for the command.
    #[must_use]
    pub const fn help_route_allowed(self) -> bool {
        !self.helper_secret
    }

    /// Status answered when authorization denies a call.
    #[must_use]
    pub const fn denial_status(self) -> StatusCode {
        if self.command_secret {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::UNAUTHORIZED
        }
    }

    /// Outcome answered when authorization denies a call.
    #[must_use]
    pub fn denial(self) -> Outcome {
        if self.command_secret {
            Outcome::not_found()
        } else {
            Outcome::unauthorized()
        }
    }
}

impl From<SecrecySpec> for Secrecy {
    fn from(spec: SecrecySpec) -> Self {
        Self::resolve(spec)
    }
}

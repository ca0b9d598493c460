//! The single result of a dispatched call.

use std::path::{Path, PathBuf};

use http::StatusCode;
use serde_json::Value;

/// Body returned when no command answers a call, or when a secret command
/// denies one.
pub const NOT_FOUND_MESSAGE: &str = "Command not found";
/// Body returned when a non-secret command denies a call.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
/// Body returned when the request body matches none of the input contracts.
pub const BAD_REQUEST_MESSAGE: &str = "Bad request";
/// Body returned for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// What a command (or the dispatcher on its behalf) answers.
///
/// An outcome carries either a JSON body or a reference to a file on disk,
/// never both. Error outcomes produced by the dispatcher always carry a plain
/// string body.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A JSON payload, possibly absent.
    Body {
        /// Payload to render; `None` renders an empty response.
        body: Option<Value>,
        /// Status code to render.
        status: StatusCode,
    },
    /// A file the transport should stream back.
    File {
        /// Location of the file.
        path: PathBuf,
        /// Status code to render.
        status: StatusCode,
    },
}

impl Outcome {
    /// A `200 OK` outcome carrying `body`.
    #[must_use]
    pub fn ok(body: impl Into<Value>) -> Self {
        Self::with_status(body, StatusCode::OK)
    }

    /// An outcome carrying `body` with an explicit status.
    #[must_use]
    pub fn with_status(body: impl Into<Value>, status: StatusCode) -> Self {
        Self::Body {
            body: Some(body.into()),
            status,
        }
    }

    /// An outcome with no payload.
    #[must_use]
    pub const fn empty(status: StatusCode) -> Self {
        Self::Body { body: None, status }
    }

    /// An outcome pointing at a file.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, status: StatusCode) -> Self {
        Self::File {
            path: path.into(),
            status,
        }
    }

    /// `("Command not found", 404)`.
    #[must_use]
    pub fn not_found() -> Self {
        Self::with_status(NOT_FOUND_MESSAGE, StatusCode::NOT_FOUND)
    }

    /// `("Unauthorized", 401)`.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::with_status(UNAUTHORIZED_MESSAGE, StatusCode::UNAUTHORIZED)
    }

    /// `("Bad request", 400)`.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::with_status(BAD_REQUEST_MESSAGE, StatusCode::BAD_REQUEST)
    }

    /// `("Internal server error", 500)`.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::with_status(INTERNAL_ERROR_MESSAGE, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Body { status, .. } | Self::File { status, .. } => *status,
        }
    }

    /// Returns the JSON payload, if this is a body outcome with one.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Body { body, .. } => body.as_ref(),
            Self::File { .. } => None,
        }
    }

    /// Returns the file location, if this is a file outcome.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Body { .. } => None,
            Self::File { path, .. } => Some(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::not_found(Outcome::not_found(), StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)]
    #[case::unauthorized(Outcome::unauthorized(), StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)]
    #[case::bad_request(Outcome::bad_request(), StatusCode::BAD_REQUEST, BAD_REQUEST_MESSAGE)]
    #[case::internal(
        Outcome::internal_error(),
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_MESSAGE
    )]
    fn error_outcomes_carry_plain_strings(
        #[case] outcome: Outcome,
        #[case] status: StatusCode,
        #[case] message: &str,
    ) {
        assert_eq!(outcome.status(), status);
        assert_eq!(outcome.body(), Some(&json!(message)));
    }

    #[test]
    fn file_outcomes_expose_their_path() {
        let outcome = Outcome::file("/srv/assets/logo.png", StatusCode::OK);
        assert_eq!(outcome.file_path(), Some(Path::new("/srv/assets/logo.png")));
        assert_eq!(outcome.body(), None);
    }
}

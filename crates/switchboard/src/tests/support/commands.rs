//! Command doubles shared by unit and behaviour tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use http::StatusCode;
use serde_json::Value;

use crate::command::{Command, CommandDescriptor, FnCommand, Method};
use crate::outcome::Outcome;
use crate::request::RequestContext;

/// Declares a public `GET` command at `link` named after it.
pub fn get(link: &str) -> CommandDescriptor {
    CommandDescriptor::new(link.trim_start_matches('/'), Method::Get, link)
}

/// Declares a public `POST` command at `link` named after it.
pub fn post(link: &str) -> CommandDescriptor {
    CommandDescriptor::new(link.trim_start_matches('/'), Method::Post, link)
}

/// A command that always answers `outcome`.
pub fn replying(descriptor: CommandDescriptor, outcome: Outcome) -> impl Command {
    FnCommand::new(descriptor, move |_context: RequestContext| {
        let answer = outcome.clone();
        async move { anyhow::Ok(answer) }
    })
}

/// A command that answers `200` with the validated body it received, or with
/// the string `"empty"` when it received none.
pub fn echoing(descriptor: CommandDescriptor) -> impl Command {
    FnCommand::new(descriptor, |context: RequestContext| async move {
        let body = context
            .body()
            .cloned()
            .unwrap_or_else(|| Value::from("empty"));
        anyhow::Ok(Outcome::with_status(body, StatusCode::OK))
    })
}

/// A command whose business logic returns an error.
pub fn failing(descriptor: CommandDescriptor) -> impl Command {
    FnCommand::new(descriptor, |_context: RequestContext| async {
        Err::<Outcome, _>(anyhow::anyhow!("database unavailable"))
    })
}

/// A command whose business logic panics.
pub fn panicking(descriptor: CommandDescriptor) -> impl Command {
    FnCommand::new(descriptor, |_context: RequestContext| async { explode() })
}

fn explode() -> anyhow::Result<Outcome> {
    panic!("handler exploded")
}

/// A command whose activation check answers `active` and counts its calls.
pub fn activating(
    descriptor: CommandDescriptor,
    active: bool,
    starts: Arc<AtomicUsize>,
) -> impl Command {
    FnCommand::new(descriptor, |_context: RequestContext| async {
        anyhow::Ok(Outcome::ok("ok"))
    })
    .with_activation(move || {
        starts.fetch_add(1, Ordering::SeqCst);
        active
    })
}

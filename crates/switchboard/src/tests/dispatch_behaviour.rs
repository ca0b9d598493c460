//! Behavioural tests for request dispatch.

use std::cell::RefCell;
use std::str::FromStr;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::auth::AuthRequirement;
use crate::command::{CommandDescriptor, Method};
use crate::contract::Contract;
use crate::dispatch::Dispatcher;
use crate::outcome::Outcome;
use crate::registry::{RegistryBuilder, RegistryOptions, RouteTable};
use crate::request::RawRequest;
use crate::secrecy::SecrecySpec;

use super::support::{failing, replying};

type StepResult = Result<(), String>;

/// A quoted string value from a Gherkin feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotedString(String);

impl FromStr for QuotedString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim_matches('"').to_owned()))
    }
}

impl QuotedString {
    fn as_str(&self) -> &str {
        &self.0
    }
}

struct DispatchWorld {
    runtime: Runtime,
    builder: RegistryBuilder,
    dispatcher: Option<Dispatcher>,
    routes: RouteTable,
    outcome: Option<Outcome>,
}

impl DispatchWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime should build");
        Self {
            runtime,
            builder: RegistryBuilder::new(),
            dispatcher: None,
            routes: RouteTable::new(),
            outcome: None,
        }
    }

    fn dispatcher(&mut self) -> Dispatcher {
        if let Some(dispatcher) = &self.dispatcher {
            return dispatcher.clone();
        }
        let builder = std::mem::take(&mut self.builder);
        let registry = builder
            .build(&RegistryOptions::new(), &mut self.routes)
            .expect("registry should build");
        let dispatcher = Dispatcher::new(Arc::new(registry));
        self.dispatcher = Some(dispatcher.clone());
        dispatcher
    }

    fn dispatch(&mut self, method: Method, link: &str, force_auth: bool, request: RawRequest) {
        let dispatcher = self.dispatcher();
        let outcome = self
            .runtime
            .block_on(dispatcher.dispatch(method, link, force_auth, request));
        self.outcome = Some(outcome);
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_str(raw).map_err(|error| format!("unknown method '{raw}': {error}"))
}

fn descriptor(method: &str, link: &str) -> Result<CommandDescriptor, String> {
    let verb = parse_method(method)?;
    Ok(CommandDescriptor::new(
        link.trim_start_matches('/'),
        verb,
        link,
    ))
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("an admin predicate that denies everyone")]
fn given_denying_predicate(world: &RefCell<DispatchWorld>) {
    world
        .borrow_mut()
        .builder
        .register_predicate_fn("admin", |_context| false)
        .expect("predicate should register");
}

#[given("a command {method} {link} answering {answer}")]
fn given_answering_command(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
    answer: QuotedString,
) -> StepResult {
    let declared = descriptor(&method, &link)?;
    world
        .borrow_mut()
        .builder
        .register(replying(declared, Outcome::ok(answer.as_str())));
    Ok(())
}

#[given("a command {method} {link} guarded by {predicate}")]
fn given_guarded_command(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
    predicate: String,
) -> StepResult {
    let declared = descriptor(&method, &link)?.with_auth(AuthRequirement::predicate(predicate));
    world
        .borrow_mut()
        .builder
        .register(replying(declared, Outcome::ok("ok")));
    Ok(())
}

#[given("a secret command {method} {link} guarded by {predicate}")]
fn given_secret_command(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
    predicate: String,
) -> StepResult {
    let declared = descriptor(&method, &link)?
        .with_auth(AuthRequirement::predicate(predicate))
        .with_secrecy(SecrecySpec::Flag(true));
    world
        .borrow_mut()
        .builder
        .register(replying(declared, Outcome::ok("ok")));
    Ok(())
}

#[given("a command-secret command {method} {link} guarded by {predicate}")]
fn given_command_secret_command(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
    predicate: String,
) -> StepResult {
    let declared = descriptor(&method, &link)?
        .with_auth(AuthRequirement::predicate(predicate))
        .with_secrecy(SecrecySpec::Command(true));
    world
        .borrow_mut()
        .builder
        .register(replying(declared, Outcome::ok("ok")));
    Ok(())
}

#[given("a command {method} {link} accepting {template}")]
fn given_contracted_command(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
    template: String,
) -> StepResult {
    let parsed: Value =
        serde_json::from_str(&template).map_err(|error| format!("bad template: {error}"))?;
    let contract = Contract::try_from(parsed).map_err(|error| error.to_string())?;
    let declared = descriptor(&method, &link)?.with_input(contract);
    world
        .borrow_mut()
        .builder
        .register(replying(declared, Outcome::ok("accepted")));
    Ok(())
}

#[given("a failing command {method} {link}")]
fn given_failing_command(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
) -> StepResult {
    let declared = descriptor(&method, &link)?;
    world.borrow_mut().builder.register(failing(declared));
    Ok(())
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("{method} {link} is dispatched")]
fn when_dispatched(world: &RefCell<DispatchWorld>, method: String, link: String) -> StepResult {
    let verb = parse_method(&method)?;
    world
        .borrow_mut()
        .dispatch(verb, &link, false, RawRequest::new());
    Ok(())
}

#[when("{method} {link} is dispatched with forced authorization")]
fn when_dispatched_forced(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
) -> StepResult {
    let verb = parse_method(&method)?;
    world
        .borrow_mut()
        .dispatch(verb, &link, true, RawRequest::new());
    Ok(())
}

#[when("{method} {link} is dispatched with body {body}")]
fn when_dispatched_with_body(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
    body: String,
) -> StepResult {
    let verb = parse_method(&method)?;
    let parsed: Value =
        serde_json::from_str(&body).map_err(|error| format!("bad body: {error}"))?;
    world
        .borrow_mut()
        .dispatch(verb, &link, false, RawRequest::new().with_body(parsed));
    Ok(())
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the outcome is {status} with body {body}")]
fn then_outcome(world: &RefCell<DispatchWorld>, status: u16, body: QuotedString) {
    let state = world.borrow();
    let outcome = state.outcome.as_ref().expect("no call was dispatched");
    assert_eq!(outcome.status().as_u16(), status, "outcome: {outcome:?}");
    assert_eq!(
        outcome.body(),
        Some(&Value::from(body.as_str())),
        "outcome: {outcome:?}"
    );
}

#[then("a help route exists for {method} {link}")]
fn then_help_route(world: &RefCell<DispatchWorld>, method: String, link: String) -> StepResult {
    let verb = parse_method(&method)?;
    let help = format!("{link}/help");
    if world.borrow().routes.contains(verb, &help) {
        Ok(())
    } else {
        Err(format!("no {verb} route at {help}"))
    }
}

#[then("no help route exists for {method} {link}")]
fn then_no_help_route(
    world: &RefCell<DispatchWorld>,
    method: String,
    link: String,
) -> StepResult {
    let verb = parse_method(&method)?;
    let help = format!("{link}/help");
    if world.borrow().routes.contains(verb, &help) {
        Err(format!("unexpected {verb} route at {help}"))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A public command answers its caller"
)]
fn public_command_answers(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A secret command hides itself from denied callers"
)]
fn secret_command_hides(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A command-secret command keeps its documentation"
)]
fn command_secret_keeps_help(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A protected command reports unauthorized callers"
)]
fn protected_command_reports_unauthorized(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Forcing authorization reaches a guarded command"
)]
fn forced_authorization_reaches_command(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A body matching no contract is rejected"
)]
fn unmatched_body_is_rejected(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Failing business logic is contained"
)]
fn failing_logic_is_contained(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Unknown links are not found"
)]
fn unknown_link_is_not_found(world: RefCell<DispatchWorld>) {
    drop(world);
}

//! Unit tests for registry construction and route binding.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;
use serde_json::json;
use switchboard_config::Config;

use super::*;
use crate::auth::AuthRequirement;
use crate::contract::Contract;
use crate::outcome::Outcome;
use crate::secrecy::SecrecySpec;
use crate::tests::support::{activating, get, post, replying};

fn build(
    builder: RegistryBuilder,
    options: &RegistryOptions,
) -> Result<(CommandRegistry, RouteTable), RegistryError> {
    let mut table = RouteTable::new();
    let registry = builder.build(options, &mut table)?;
    Ok((registry, table))
}

#[test]
fn public_commands_are_bound_with_help_routes() {
    let mut builder = RegistryBuilder::new();
    builder.register(replying(get("/hello"), Outcome::ok("hi")));

    let (registry, table) = build(builder, &RegistryOptions::new()).expect("build");

    assert_eq!(registry.len(), 1);
    assert!(matches!(table.get(Method::Get, "/hello"), Some(Route::Command(_))));
    assert!(matches!(table.get(Method::Get, "/hello/help"), Some(Route::Help(_))));
    assert_eq!(table.len(), 2);
}

#[rstest]
#[case::plain("", None, "/hello")]
#[case::versioned("", Some(1), "/v1/hello")]
#[case::prefixed("/api/", Some(2), "/api/v2/hello")]
fn bound_path_combines_prefix_version_and_link(
    #[case] prefix: &str,
    #[case] version: Option<u32>,
    #[case] expected: &str,
) {
    let descriptor = version.map_or_else(|| get("/hello"), |number| get("/hello").with_version(number));
    let mut builder = RegistryBuilder::new();
    builder.register(replying(descriptor, Outcome::ok("hi")));

    let options = RegistryOptions::new().with_route_prefix(prefix);
    let (registry, table) = build(builder, &options).expect("build");

    assert!(table.contains(Method::Get, expected));
    let command = registry.lookup(Method::Get, "/hello").expect("lookup by link");
    assert_eq!(command.effective_path(), expected);
}

#[rstest]
#[case::root("", None, "/", "/", "/help")]
#[case::prefixed_root("/api", None, "/", "/api/", "/api/help")]
#[case::versioned_root("", Some(3), "/", "/v3/", "/v3/help")]
#[case::trailing_slash("", None, "/users/", "/users/", "/users/help")]
fn help_paths_never_double_the_slash(
    #[case] prefix: &str,
    #[case] version: Option<u32>,
    #[case] link: &str,
    #[case] bound: &str,
    #[case] help: &str,
) {
    let base = CommandDescriptor::new("index", Method::Get, link);
    let descriptor = version.map_or_else(|| base.clone(), |number| base.clone().with_version(number));
    let mut builder = RegistryBuilder::new();
    builder.register(replying(descriptor, Outcome::ok("index")));

    let options = RegistryOptions::new().with_route_prefix(prefix);
    let (_, table) = build(builder, &options).expect("build");

    assert!(table.contains(Method::Get, bound));
    assert!(matches!(table.get(Method::Get, help), Some(Route::Help(_))));
    assert_eq!(table.len(), 2);
}

#[test]
fn private_commands_are_registered_but_never_bound() {
    let mut builder = RegistryBuilder::new();
    builder.register(replying(
        post("/internal/reindex").with_visibility(Visibility::Private),
        Outcome::ok("done"),
    ));

    let (registry, table) = build(builder, &RegistryOptions::new()).expect("build");

    assert!(table.is_empty());
    let command = registry
        .lookup(Method::Post, "/internal/reindex")
        .expect("private commands stay addressable");
    assert!(!command.is_routable());
}

#[rstest]
#[case::secret(SecrecySpec::Flag(true), false)]
#[case::open(SecrecySpec::Flag(false), true)]
#[case::command_secret(SecrecySpec::Command(true), true)]
#[case::helper_secret(SecrecySpec::Helper(true), false)]
fn help_route_follows_secrecy(#[case] secrecy: SecrecySpec, #[case] bound: bool) {
    let mut builder = RegistryBuilder::new();
    builder.register(replying(get("/report").with_secrecy(secrecy), Outcome::ok("r")));

    let (_, table) = build(builder, &RegistryOptions::new()).expect("build");

    assert!(table.contains(Method::Get, "/report"));
    assert_eq!(table.contains(Method::Get, "/report/help"), bound);
}

#[test]
fn help_routes_can_be_disabled_globally() {
    let mut builder = RegistryBuilder::new();
    builder.register(replying(get("/hello"), Outcome::ok("hi")));

    let options = RegistryOptions::new().with_help_routes(false);
    let (_, table) = build(builder, &options).expect("build");

    assert!(!table.contains(Method::Get, "/hello/help"));
}

#[test]
fn unknown_predicate_aborts_before_activation() {
    let starts = Arc::new(AtomicUsize::new(0));
    let mut builder = RegistryBuilder::new();
    builder.register(activating(
        get("/admin").with_auth(AuthRequirement::predicate("admin")),
        true,
        Arc::clone(&starts),
    ));

    let error = build(builder, &RegistryOptions::new()).expect_err("missing predicate");

    assert!(matches!(
        error,
        RegistryError::UnknownAuthPredicate { ref predicate, .. } if predicate == "admin"
    ));
    assert_eq!(starts.load(Ordering::SeqCst), 0);
}

#[test]
fn registered_predicates_satisfy_named_requirements() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_predicate_fn("admin", |_| false)
        .expect("register predicate");
    builder.register(replying(
        get("/admin").with_auth(AuthRequirement::predicate("admin")),
        Outcome::ok("secret"),
    ));

    let (registry, _) = build(builder, &RegistryOptions::new()).expect("build");
    assert!(registry.gate().contains("admin"));
}

#[test]
fn duplicate_verb_and_link_is_fatal() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(replying(get("/hello"), Outcome::ok("first")))
        .register(replying(
            CommandDescriptor::new("hello-again", Method::Get, "/hello"),
            Outcome::ok("second"),
        ));

    let error = build(builder, &RegistryOptions::new()).expect_err("duplicate");
    assert_eq!(
        error.to_string(),
        "GET /hello is declared by both 'hello' and 'hello-again'"
    );
}

#[test]
fn same_link_on_different_verbs_is_allowed() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(replying(get("/items"), Outcome::ok("list")))
        .register(replying(post("/items"), Outcome::ok("created")));

    let (registry, _) = build(builder, &RegistryOptions::new()).expect("build");
    assert_eq!(registry.len(), 2);
}

#[rstest]
#[case::empty("")]
#[case::relative("hello")]
fn links_must_be_absolute(#[case] link: &str) {
    let mut builder = RegistryBuilder::new();
    builder.register(replying(
        CommandDescriptor::new("broken", Method::Get, link),
        Outcome::ok("x"),
    ));

    let error = build(builder, &RegistryOptions::new()).expect_err("invalid link");
    assert!(matches!(error, RegistryError::InvalidLink { .. }));
}

#[test]
fn inactive_commands_are_skipped_and_activated_once() {
    let starts = Arc::new(AtomicUsize::new(0));
    let mut builder = RegistryBuilder::new();
    builder.register(activating(get("/beta"), false, Arc::clone(&starts)));

    let (registry, table) = build(builder, &RegistryOptions::new()).expect("build");

    assert!(table.is_empty());
    assert_eq!(registry.inactive(), vec!["beta"]);
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[test]
fn strict_activation_turns_a_declined_start_into_an_error() {
    let mut builder = RegistryBuilder::new();
    builder.register(activating(
        get("/beta"),
        false,
        Arc::new(AtomicUsize::new(0)),
    ));

    let options = RegistryOptions::new().with_strict_activation(true);
    let error = build(builder, &options).expect_err("strict activation");
    assert!(matches!(error, RegistryError::ActivationFailed { ref command } if command == "beta"));
}

#[test]
fn colliding_routes_are_reported() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(replying(get("/docs"), Outcome::ok("docs")))
        .register(replying(get("/docs/help"), Outcome::ok("custom help")));

    let error = build(builder, &RegistryOptions::new()).expect_err("route conflict");
    assert!(matches!(
        error,
        RegistryError::Binding(BindError::Conflict { ref path, .. }) if path == "/docs/help"
    ));
}

#[test]
fn help_document_describes_contracts_as_templates() {
    let mut builder = RegistryBuilder::new();
    builder.register(replying(
        post("/users")
            .with_description("Create a user")
            .with_version(1)
            .with_input(Contract::try_from(json!({"name": "string"})).expect("template"))
            .with_output(Contract::String),
        Outcome::ok("created"),
    ));

    let (_, table) = build(builder, &RegistryOptions::new()).expect("build");
    let Some(Route::Help(document)) = table.get(Method::Post, "/v1/users/help") else {
        panic!("help route missing");
    };

    let outcome = document.to_outcome().expect("render help");
    assert_eq!(
        outcome.body(),
        Some(&json!({
            "name": "users",
            "description": "Create a user",
            "link": "/users",
            "path": "/v1/users",
            "method": "POST",
            "visibility": "PUBLIC",
            "auth": true,
            "inputContracts": [{"name": "string"}],
            "outputContracts": ["string"]
        }))
    );
}

#[test]
fn building_the_same_declarations_twice_binds_the_same_routes() {
    let declare = || {
        let mut builder = RegistryBuilder::new();
        builder
            .register(replying(get("/a"), Outcome::ok("a")))
            .register(replying(post("/b").with_secrecy(SecrecySpec::Flag(true)), Outcome::ok("b")));
        builder
    };

    let (_, first) = build(declare(), &RegistryOptions::new()).expect("first build");
    let (_, second) = build(declare(), &RegistryOptions::new()).expect("second build");

    let paths = |table: &RouteTable| {
        table
            .iter()
            .map(|(method, path, _)| format!("{method} {path}"))
            .collect::<Vec<_>>()
    };
    assert_eq!(paths(&first), paths(&second));
    assert_eq!(paths(&first), vec!["GET /a", "GET /a/help", "POST /b"]);
}

#[test]
fn options_follow_configuration() {
    let config = Config {
        route_prefix: String::from("/api/"),
        help_routes: false,
        strict_activation: true,
        ..Config::default()
    };
    let options = RegistryOptions::from_config(&config);
    assert_eq!(options.route_prefix(), "/api");
    assert!(!options.help_routes());
    assert!(options.strict_activation());
}

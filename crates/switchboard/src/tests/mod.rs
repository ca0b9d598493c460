//! Behaviour suites and shared test support.

mod dispatch_behaviour;
pub(crate) mod support;

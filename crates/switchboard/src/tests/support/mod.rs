//! Test harness utilities shared by unit and behaviour suites.

mod commands;
mod config_loader;
mod reporter;
mod world;

pub use commands::{activating, echoing, failing, get, panicking, post, replying};
pub use config_loader::FailingConfigLoader;
pub use reporter::{LifecycleEvent, RecordingLifecycleReporter};
pub use world::{TestWorld, world};

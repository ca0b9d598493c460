//! Configuration loader that fails the way a bad command line does.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::OrthoError;
use switchboard_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that intentionally fails by passing an unknown log format.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("switchboard"),
            OsString::from("--log-format"),
            OsString::from("bogus"),
        ];
        Config::load_from_iter(args)
    }
}

//! Built-in default configuration
//!
//! Seeded into every handler before any file is read.

use super::namespace::RawMapping;
use serde_json::{json, Value};

/// Directory searched for `conf.*` when no explicit file is given.
pub const DEFAULT_CONFIG_DIR: &str = "data/config/";

/// Glob matched against file names inside [`DEFAULT_CONFIG_DIR`].
pub const DEFAULT_CONFIG_GLOB: &str = "conf.*";

/// Default data-recorder tick in milliseconds.
pub const DEFAULT_RECORDER_TIME_MS: u64 = 1000;

pub fn default_mapping() -> RawMapping {
    let defaults = json!({
        // app
        "version": "VMAJOR.MINOR.PATCH",
        "appname": "ApplicationByReWi",
        "workDir": "./",
        "datasRecorderTime": DEFAULT_RECORDER_TIME_MS,
        "pluginDir": "plugins/",
        "moduleDir": "windowUI/",
        "configDir": DEFAULT_CONFIG_DIR,
        "import": [],
    });

    match defaults {
        Value::Object(map) => map,
        _ => RawMapping::new(),
    }
}

//! Shared CLI utilities.

use clap::Args;
use rewikit::config::{ConfigHandler, DEFAULT_CONFIG_DIR};
use serde_json::Value;
use std::path::PathBuf;

/// Flags controlling how the configuration is loaded.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Config file loaded before anything else (falls back to conf.* discovery)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory searched for conf.*
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Also load every yaml/json/toml file in the search directory
    #[arg(short = 'a', long)]
    pub auto_search: bool,

    /// Directory scanned by --auto-search (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub search_dir: Option<PathBuf>,

    /// Extra files merged last, in order (comma-separated)
    #[arg(long, value_name = "FILES")]
    pub add: Option<String>,
}

impl LoadArgs {
    pub fn load(&self) -> ConfigHandler {
        let mut options = ConfigHandler::builder()
            .config_dir(&self.config_dir)
            .auto_search(self.auto_search);
        if let Some(path) = &self.config {
            options = options.file_path(path);
        }
        if let Some(dir) = &self.search_dir {
            options = options.search_dir(dir);
        }

        let mut handler = options.build();
        for extra in parse_csv(&self.add).unwrap_or_default() {
            handler.add_config_file(&extra);
        }
        handler
    }
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Strings print bare, everything else as compact JSON.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

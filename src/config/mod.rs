//! Layered configuration loading
//!
//! Merges YAML/JSON/TOML files (and the files they `import`) on top of the
//! built-in defaults into a dot-addressable [`Namespace`].

pub mod defaults;
pub mod error;
pub mod format;
pub mod handler;
pub mod imports;
pub mod namespace;

pub use defaults::{default_mapping, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_GLOB};
pub use error::ConfigError;
pub use format::{read_config_file, ConfigFormat, SUPPORTED_EXTENSIONS};
pub use handler::{ConfigHandler, Diagnostic, HandlerOptions};
pub use imports::{resolve_imports, ImportStep, SkippedImport, IMPORT_KEY};
pub use namespace::{Entry, Namespace, RawMapping};

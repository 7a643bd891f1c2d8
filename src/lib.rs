//! rewikit: application toolkit built around layered configuration
//!
//! - [`config`]: YAML/JSON/TOML loading with recursive `import` and dotted access
//! - [`timing`]: per-label execution time tracking
//! - [`registry`]: one shared instance per type
//! - [`logs`]: rotating file logging on top of `tracing`
//! - [`utils`]: filesystem helpers and delays

pub mod config;
pub mod logs;
pub mod registry;
pub mod timing;
pub mod utils;

pub use config::{ConfigError, ConfigHandler, Entry, Namespace};
pub use logs::LogsRecorder;
pub use registry::InstanceRegistry;
pub use timing::TimeTracker;

//! File logging with rotation and retention
//!
//! [`LogsRecorder`] picks a unique log file under a directory and installs a
//! `tracing` subscriber that writes to it through a [`RotatingFile`].

pub mod rotating;

pub use rotating::RotatingFile;

use crate::utils::{ensure_folders, no_duplicate_file};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_DIR: &str = "./data/logs/";

/// Rotate once the active file reaches 10 MiB.
pub const DEFAULT_ROTATION_BYTES: u64 = 10 * 1024 * 1024;

/// Keep rotated files for 60 days.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct LogsRecorder {
    directory: PathBuf,
    path: PathBuf,
    rotation_bytes: u64,
    retention: Duration,
}

impl LogsRecorder {
    /// Prepare a log file in `directory`.
    ///
    /// Without a `name` the file is called `<program>--<timestamp>`. The name
    /// gets a numeric suffix if a file of that name already exists anywhere
    /// under `directory`.
    pub fn new(directory: impl AsRef<Path>, name: Option<&str>) -> Result<Self> {
        let directory = ensure_folders(directory.as_ref()).with_context(|| {
            format!("Failed creating log directory: {}", directory.as_ref().display())
        })?;
        let name = name.map(str::to_string).unwrap_or_else(default_log_name);
        let path = no_duplicate_file(&directory, &name, ".log");

        Ok(Self {
            directory,
            path,
            rotation_bytes: DEFAULT_ROTATION_BYTES,
            retention: DEFAULT_RETENTION,
        })
    }

    pub fn with_rotation(mut self, bytes: u64) -> Self {
        self.rotation_bytes = bytes;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (or create) the log file for appending.
    pub fn writer(&self) -> Result<RotatingFile> {
        RotatingFile::open(&self.path, self.rotation_bytes, self.retention)
            .with_context(|| format!("Failed opening log file: {}", self.path.display()))
    }

    /// Install a global subscriber logging to stderr and to the log file.
    ///
    /// `RUST_LOG` directives are honored on top of `level`. Fails if a global
    /// subscriber is already set.
    pub fn install(&self, level: Level) -> Result<()> {
        let writer = self.writer()?;
        let filter = EnvFilter::from_default_env().add_directive(level.into());
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(writer)))
            .with(filter)
            .try_init()
            .context("Failed installing log subscriber")?;

        info!("Logger initialized. Logs will be saved to: {}", self.path.display());
        Ok(())
    }
}

fn default_log_name() -> String {
    let program = std::env::args()
        .next()
        .and_then(|arg| Path::new(&arg).file_stem().map(|s| s.to_string_lossy().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "rewikit".to_string());
    format!("{program}--{}", Local::now().format("%Y-%m-%d_%H-%M-%S-%6f"))
}

//! `import` directive resolution

use super::namespace::RawMapping;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reserved top-level key listing further files to load.
pub const IMPORT_KEY: &str = "import";

/// One step emitted while walking an import list.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportStep {
    /// The target exists and should be loaded and merged now.
    Load(PathBuf),
    /// The entry was skipped; loading continues with the next one.
    Skip(SkippedImport),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkippedImport {
    /// The entry resolved to a path that does not exist.
    Missing { entry: String, path: PathBuf },
    /// The entry is not a string.
    NotAPath(Value),
    /// `import` is neither a list nor a single string.
    Malformed(Value),
}

impl fmt::Display for SkippedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkippedImport::Missing { entry, .. } => {
                write!(f, "import file '{entry}' not found, it will be skipped")
            }
            SkippedImport::NotAPath(value) => {
                write!(f, "import entry {value} is not a path string, it will be skipped")
            }
            SkippedImport::Malformed(value) => {
                write!(f, "'{IMPORT_KEY}' must be a list of paths, found {value}")
            }
        }
    }
}

/// Walk the `import` list of `mapping`, in declaration order.
///
/// Entries are resolved relative to `base_dir`. `visit` is called with
/// [`ImportStep::Load`] for each existing target before the next entry is
/// looked at, so a loader that recurses from `visit` produces a depth-first,
/// left-to-right load order.
pub fn resolve_imports<F>(mapping: &RawMapping, base_dir: &Path, mut visit: F)
where
    F: FnMut(ImportStep),
{
    let entries: Vec<&Value> = match mapping.get(IMPORT_KEY) {
        None | Some(Value::Null) => return,
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::String(_)) => vec![single],
        Some(other) => {
            visit(ImportStep::Skip(SkippedImport::Malformed(other.clone())));
            return;
        }
    };

    for entry in entries {
        let Some(rel) = entry.as_str() else {
            visit(ImportStep::Skip(SkippedImport::NotAPath(entry.clone())));
            continue;
        };

        let path = base_dir.join(rel);
        if path.exists() {
            visit(ImportStep::Load(path));
        } else {
            visit(ImportStep::Skip(SkippedImport::Missing { entry: rel.to_string(), path }));
        }
    }
}

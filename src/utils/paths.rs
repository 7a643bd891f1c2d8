//! Filesystem helpers: folders, duplicate-safe names, pruning and lookups

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Make sure a folder exists, creating it (and its parents) if needed.
///
/// Surrounding whitespace and trailing backslashes are stripped first.
pub fn ensure_folders(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    let cleaned = match path.to_str() {
        Some(s) => PathBuf::from(s.trim().trim_end_matches('\\')),
        None => path.to_path_buf(),
    };
    if !cleaned.exists() {
        fs::create_dir_all(&cleaned)?;
        debug!("Folder created: {}", cleaned.display());
    }
    Ok(cleaned)
}

/// Path for a new file in `directory` that does not clash with any existing
/// file name under it (searched recursively).
///
/// `filename + extension` is tried first, then `<stem>_1<ext>`, `<stem>_2<ext>`
/// and so on. With an empty `extension` the extension of `filename` is kept
/// at the end.
pub fn no_duplicate_file(directory: &Path, filename: &str, extension: &str) -> PathBuf {
    let existing: HashSet<String> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();

    let (stem, ext) = if extension.is_empty() {
        match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => (&filename[..filename.len() - ext.len() - 1], format!(".{ext}")),
            None => (filename, String::new()),
        }
    } else {
        (filename, extension.to_string())
    };

    let mut candidate = format!("{stem}{ext}");
    let mut index = 1usize;
    while existing.contains(&candidate) {
        debug!("File exists: {}", directory.join(&candidate).display());
        candidate = format!("{stem}_{index}{ext}");
        index += 1;
    }
    directory.join(candidate)
}

/// Counts from [`prune_empty`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub files_removed: usize,
    pub dirs_removed: usize,
}

/// Delete zero-byte files and empty directories below `root`.
///
/// Children are visited before their parent, so a directory that only held
/// empty items is removed as well. `root` itself is kept.
pub fn prune_empty(root: &Path) -> io::Result<PruneStats> {
    let mut stats = PruneStats::default();
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            if fs::read_dir(path)?.next().is_none() {
                fs::remove_dir(path)?;
                stats.dirs_removed += 1;
            }
        } else if entry.metadata().map_err(io::Error::from)?.len() == 0 {
            fs::remove_file(path)?;
            stats.files_removed += 1;
        }
    }
    Ok(stats)
}

/// Move `source` into `destination_dir`, replacing a same-named file there.
pub fn move_and_replace_file(source: &Path, destination_dir: &Path) -> io::Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("not a file: {}", source.display()))
    })?;
    let destination = destination_dir.join(file_name);
    if destination.exists() {
        fs::remove_file(&destination)?;
    }
    if fs::rename(source, &destination).is_err() {
        // Cross-device moves cannot be renamed.
        fs::copy(source, &destination)?;
        fs::remove_file(source)?;
    }
    Ok(destination)
}

/// Names of files in `directory` ending with `extension`, sorted.
///
/// With `keep_extension = false` the extension is stripped from each name.
/// A missing directory yields an empty list.
pub fn files_with_extension(directory: &Path, extension: &str, keep_extension: bool) -> Vec<String> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(extension))
        .map(|name| {
            if keep_extension {
                name
            } else {
                name[..name.len() - extension.len()].to_string()
            }
        })
        .collect();
    names.sort();
    names
}

/// Absolute path of an existing regular file, `None` otherwise.
pub fn file_full_path(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        return None;
    }
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    std::env::current_dir().ok().map(|cwd| cwd.join(path))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Log,
}

impl FileKind {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileKind::Image => &["png", "jpg", "jpeg", "bmp", "gif", "tiff"],
            FileKind::Video => &["mp4", "avi", "mov", "mkv", "flv"],
            FileKind::Log => &["log", "txt"],
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown expected file type: {0}")]
pub struct UnknownFileKind(pub String);

impl FromStr for FileKind {
    type Err = UnknownFileKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(FileKind::Image),
            "video" => Ok(FileKind::Video),
            "log" => Ok(FileKind::Log),
            _ => Err(UnknownFileKind(s.to_string())),
        }
    }
}

/// `true` if `path` is an existing file whose extension belongs to `kind`.
pub fn check_file(path: &Path, kind: FileKind) -> bool {
    if !path.is_file() {
        debug!("File '{}' does not exist.", path.display());
        return false;
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    kind.extensions().contains(&ext.as_str())
}

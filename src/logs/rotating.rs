//! Size-rotated log file with zip archives and age-based retention

use crate::utils::no_duplicate_file;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ROTATION_STAMP: &str = "%Y-%m-%d_%H-%M-%S_%6f";

// Shape of a formatted ROTATION_STAMP; `d` is any ASCII digit.
const STAMP_SHAPE: &str = "dddd-dd-dd_dd-dd-dd_dddddd";

/// Appends to `path`; once the file would grow past `max_bytes` it is moved
/// aside and compressed to `<stem>.<timestamp>.log.zip`, and a fresh file
/// takes its place. Rotated archives older than `retention` are deleted at
/// rotation time.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    retention: Duration,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, retention: Duration) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self { path, file, written, max_bytes: max_bytes.max(1), retention })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotated files belonging to this log, sorted by name.
    pub fn rotated_files(&self) -> io::Result<Vec<PathBuf>> {
        let Some(dir) = self.path.parent() else {
            return Ok(Vec::new());
        };
        let stem = self.stem();
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                *path != self.path
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| is_rotated_name(n, &stem))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn stem(&self) -> String {
        self.path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = format!("{}.{}", self.stem(), Local::now().format(ROTATION_STAMP));
        let archive = no_duplicate_file(dir, &name, ".log.zip");
        let rotated = archive.with_extension("");
        fs::rename(&self.path, &rotated)?;
        self.file = open_append(&self.path)?;
        self.written = 0;

        // A failed compression leaves the plain rotated file in place.
        compress(&rotated, &archive)?;
        fs::remove_file(&rotated)?;
        self.prune_expired()
    }

    fn prune_expired(&self) -> io::Result<()> {
        for path in self.rotated_files()? {
            let age = fs::metadata(&path)?.modified()?.elapsed().unwrap_or(Duration::ZERO);
            if age >= self.retention {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write `source` as the single deflated entry of a new zip at `archive`.
fn compress(source: &Path, archive: &Path) -> io::Result<()> {
    let entry_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "rotated.log".to_string());
    let mut writer = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(entry_name, options)?;
    io::copy(&mut File::open(source)?, &mut writer)?;
    writer.finish()?;
    Ok(())
}

/// `<stem>.<stamp>[_n].log` or the same with `.zip` appended.
fn is_rotated_name(name: &str, stem: &str) -> bool {
    let Some(rest) = name.strip_prefix(stem).and_then(|r| r.strip_prefix('.')) else {
        return false;
    };
    let Some(middle) = rest.strip_suffix(".log.zip").or_else(|| rest.strip_suffix(".log")) else {
        return false;
    };
    if middle.len() < STAMP_SHAPE.len() || !middle.is_char_boundary(STAMP_SHAPE.len()) {
        return false;
    }
    let (stamp, suffix) = middle.split_at(STAMP_SHAPE.len());
    let stamp_ok = stamp.bytes().zip(STAMP_SHAPE.bytes()).all(|(c, shape)| match shape {
        b'd' => c.is_ascii_digit(),
        other => c == other,
    });
    let suffix_ok = suffix.is_empty()
        || suffix
            .strip_prefix('_')
            .map(|n| !n.is_empty() && n.bytes().all(|c| c.is_ascii_digit()))
            .unwrap_or(false);
    stamp_ok && suffix_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn archived_content(archive: &Path) -> String {
        let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut content = String::new();
        zip.by_index(0).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_rotates_when_size_exceeded() {
        let tmp = TempDir::new().expect("tmp");
        let mut log = RotatingFile::open(tmp.path().join("app.log"), 16, DAY).unwrap();

        log.write_all(b"0123456789\n").unwrap();
        assert!(log.rotated_files().unwrap().is_empty());

        log.write_all(b"abcdefghij\n").unwrap();
        log.flush().unwrap();

        let rotated = log.rotated_files().unwrap();
        assert_eq!(rotated.len(), 1);
        let archive_name = rotated[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(archive_name.starts_with("app.") && archive_name.ends_with(".log.zip"));
        assert_eq!(archived_content(&rotated[0]), "0123456789\n");
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "abcdefghij\n");
    }

    #[test]
    fn test_rotation_leaves_no_plain_copy() {
        let tmp = TempDir::new().expect("tmp");
        let mut log = RotatingFile::open(tmp.path().join("app.log"), 4, DAY).unwrap();
        log.write_all(b"12345").unwrap();
        log.write_all(b"67890").unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 2, "unexpected files: {names:?}");
        assert!(names.iter().all(|n| n == "app.log" || n.ends_with(".log.zip")));
    }

    #[test]
    fn test_other_logs_sharing_the_stem_are_left_alone() {
        let tmp = TempDir::new().expect("tmp");
        let other = tmp.path().join("app.v1.log");
        fs::write(&other, "another recorder").unwrap();

        let mut log = RotatingFile::open(tmp.path().join("app.log"), 8, Duration::ZERO).unwrap();
        assert!(log.rotated_files().unwrap().is_empty());
        for _ in 0..3 {
            log.write_all(b"12345678").unwrap();
        }

        assert!(other.exists());
        assert_eq!(fs::read_to_string(&other).unwrap(), "another recorder");
    }

    #[test]
    fn test_rotated_name_shape() {
        assert!(is_rotated_name("app.2026-10-19_16-47-01_123456.log.zip", "app"));
        assert!(is_rotated_name("app.2026-10-19_16-47-01_123456_2.log.zip", "app"));
        assert!(is_rotated_name("app.2026-10-19_16-47-01_123456.log", "app"));
        assert!(!is_rotated_name("app.v1.log", "app"));
        assert!(!is_rotated_name("app.2026-10-19_16-47-01_123456_x.log.zip", "app"));
        assert!(!is_rotated_name("apple.2026-10-19_16-47-01_123456.log.zip", "app"));
    }

    #[test]
    fn test_single_oversized_write_is_not_split() {
        let tmp = TempDir::new().expect("tmp");
        let mut log = RotatingFile::open(tmp.path().join("big.log"), 4, DAY).unwrap();
        log.write_all(b"much longer than four bytes").unwrap();
        assert!(log.rotated_files().unwrap().is_empty());
    }

    #[test]
    fn test_zero_retention_removes_rotated_files() {
        let tmp = TempDir::new().expect("tmp");
        let mut log = RotatingFile::open(tmp.path().join("app.log"), 8, Duration::ZERO).unwrap();
        for _ in 0..3 {
            log.write_all(b"12345678").unwrap();
        }
        assert!(log.rotated_files().unwrap().is_empty());
        assert!(log.path().exists());
    }

    #[test]
    fn test_reopen_counts_existing_size() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("app.log");
        fs::write(&path, "existing-content").unwrap();

        let mut log = RotatingFile::open(&path, 20, DAY).unwrap();
        log.write_all(b"more-data").unwrap();
        assert_eq!(log.rotated_files().unwrap().len(), 1);
    }
}

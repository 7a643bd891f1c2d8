//! Filesystem and timing utilities

pub mod delay;
pub mod paths;

pub use delay::{delay_microseconds, delay_milliseconds, delay_nanoseconds, delay_seconds};
pub use paths::{
    check_file, ensure_folders, file_full_path, files_with_extension, move_and_replace_file,
    no_duplicate_file, prune_empty, FileKind, PruneStats,
};

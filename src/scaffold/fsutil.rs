//! Filesystem predicates.

use std::fs;
use std::path::Path;

/// A regular file (following symlinks).
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// A directory (following symlinks).
pub fn dir_exists(path: &Path) -> bool {
    path.is_dir()
}

/// A symlink, dangling or not.
pub fn symlink_exists(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

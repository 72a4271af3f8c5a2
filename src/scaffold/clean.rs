//! Removal of generated build artifacts.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::scaffold::fsutil::symlink_exists;
use crate::scaffold::ScaffoldError;

/// Delete build outputs and the public folder. Returns what was removed.
pub fn clean(root: &Path, config: &AppConfig) -> Result<Vec<PathBuf>, ScaffoldError> {
    let targets = [
        config.css.output.as_str(),
        config.js.output.as_str(),
        config.public_folder.as_str(),
    ];

    // Nothing is removed unless every target is safe.
    if let Some(bad) = targets.iter().find(|relative| !stays_inside(relative)) {
        return Err(ScaffoldError::OutsideProject {
            path: PathBuf::from(bad),
        });
    }

    let mut removed = Vec::new();
    for relative in targets {
        let path = root.join(relative);
        let result = if symlink_exists(&path) || path.is_file() {
            fs::remove_file(&path)
        } else if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            continue;
        };
        result.map_err(|source| ScaffoldError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Removed");
        removed.push(path);
    }
    Ok(removed)
}

/// Relative, non-empty, and never climbing above its base.
fn stays_inside(relative: &str) -> bool {
    let path = Path::new(relative);
    let mut depth = 0i32;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

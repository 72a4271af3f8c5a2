//! MVC folder layout and public symlinks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::scaffold::fsutil::{dir_exists, file_exists, symlink_exists};
use crate::scaffold::ScaffoldError;

/// The folder compiled assets and statics are linked into.
pub fn public_dir(root: &Path, config: &AppConfig, version: &str) -> PathBuf {
    let public = root.join(&config.public_folder);
    if config.versioned_public {
        public.join(version)
    } else {
        public
    }
}

/// What [`generate`] changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Generated {
    pub directories: Vec<PathBuf>,
    pub symlinks: Vec<PathBuf>,
}

/// Create the folder layout and public symlinks. Existing folders and correct
/// links are left alone.
pub fn generate(root: &Path, config: &AppConfig, version: &str) -> Result<Generated, ScaffoldError> {
    let mut generated = Generated::default();
    let statics = root.join(&config.statics_root);
    let public = public_dir(root, config, version);

    if config.generate_folder_structure {
        let folders = [
            root.join(&config.models_path),
            root.join(&config.views_path),
            root.join(&config.controllers_path),
            statics.join(&config.css.source_path),
            statics.join(&config.js.source_path),
            statics.join("images"),
            public.clone(),
        ];
        for folder in folders {
            if ensure_dir(&folder)? {
                tracing::info!(path = %folder.display(), "Created folder");
                generated.directories.push(folder);
            }
        }
    }

    let mut links: Vec<(PathBuf, PathBuf)> = config
        .statics_symlinks_to_public
        .iter()
        .map(|entry| {
            let (source, dest) = entry.split_once(':').unwrap_or((entry.as_str(), entry.as_str()));
            (statics.join(source), public.join(dest))
        })
        .collect();
    if config.css.symlink_to_public {
        links.push((root.join(&config.css.output), public.join(&config.css.source_path)));
    }
    if config.js.symlink_to_public {
        links.push((root.join(&config.js.output), public.join(&config.js.source_path)));
    }

    for (target, link) in links {
        ensure_dir(&target)?;
        if let Some(parent) = link.parent() {
            ensure_dir(parent)?;
        }
        if ensure_symlink(&target, &link)? {
            tracing::info!(link = %link.display(), target = %target.display(), "Created symlink");
            generated.symlinks.push(link);
        }
    }

    Ok(generated)
}

/// Create `path` if missing. Returns whether it was created.
fn ensure_dir(path: &Path) -> Result<bool, ScaffoldError> {
    if dir_exists(path) {
        return Ok(false);
    }
    if file_exists(path) {
        return Err(ScaffoldError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| ScaffoldError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Point `link` at `target`. Returns whether a link was (re)created.
fn ensure_symlink(target: &Path, link: &Path) -> Result<bool, ScaffoldError> {
    let io_err = |source: io::Error| ScaffoldError::Io {
        path: link.to_path_buf(),
        source,
    };

    if symlink_exists(link) {
        if fs::read_link(link).map_err(io_err)? == target {
            return Ok(false);
        }
        fs::remove_file(link).map_err(io_err)?;
    } else if link.exists() {
        tracing::warn!(
            path = %link.display(),
            "Not replacing existing file or folder with a symlink"
        );
        return Ok(false);
    }

    symlink_dir(target, link).map_err(io_err)?;
    Ok(true)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

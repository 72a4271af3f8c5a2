//! Source file selection for the asset pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::AssetError;

/// An input file and where its output goes, both relative to their folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl SourceEntry {
    fn same(path: PathBuf) -> Self {
        Self {
            output: path.clone(),
            input: path,
        }
    }
}

/// Parse one `src[:out]` whitelist entry.
pub fn parse_entry(entry: &str) -> SourceEntry {
    match entry.split_once(':') {
        Some((input, output)) if !output.is_empty() => SourceEntry {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
        },
        Some((input, _)) => SourceEntry::same(PathBuf::from(input)),
        None => SourceEntry::same(PathBuf::from(entry)),
    }
}

/// Files to compile from `source_dir`.
///
/// With a whitelist only the listed files are used; listed files that do not
/// exist are skipped with a warning. Without one every file below the folder
/// is used, sorted. Blacklisted inputs are dropped either way.
pub fn select_sources(
    source_dir: &Path,
    whitelist: Option<&[String]>,
    blacklist: Option<&[String]>,
) -> Result<Vec<SourceEntry>, AssetError> {
    let mut entries = match whitelist {
        Some(list) => list
            .iter()
            .map(|entry| parse_entry(entry))
            .filter(|entry| {
                let exists = source_dir.join(&entry.input).is_file();
                if !exists {
                    tracing::warn!(
                        file = %source_dir.join(&entry.input).display(),
                        "Whitelisted file does not exist, skipping"
                    );
                }
                exists
            })
            .collect(),
        None => {
            let mut files = Vec::new();
            if source_dir.is_dir() {
                walk(source_dir, Path::new(""), &mut files)?;
            }
            files.sort();
            files.into_iter().map(SourceEntry::same).collect::<Vec<_>>()
        }
    };

    if let Some(blocked) = blacklist {
        entries.retain(|entry| !blocked.iter().any(|b| entry.input == Path::new(b)));
    }
    Ok(entries)
}

fn walk(base: &Path, relative: &Path, out: &mut Vec<PathBuf>) -> Result<(), AssetError> {
    let dir = base.join(relative);
    let read = fs::read_dir(&dir).map_err(|source| AssetError::Io {
        path: dir.clone(),
        source,
    })?;
    for item in read {
        let item = item.map_err(|source| AssetError::Io {
            path: dir.clone(),
            source,
        })?;
        let name = item.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let child = relative.join(&name);
        let path = base.join(&child);
        if path.is_dir() {
            walk(base, &child, out)?;
        } else if path.is_file() {
            out.push(child);
        }
    }
    Ok(())
}

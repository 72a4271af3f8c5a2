//! Project manifest (`package.json`).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::config::loader::ConfigError;

pub const MANIFEST_FILE: &str = "package.json";

/// Folder holding installed dependencies, next to the manifest.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// The parts of `package.json` the framework reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub scripts: BTreeMap<String, String>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,

    /// The `rooseveltConfig` section, kept untyped for auditing and merging.
    pub roosevelt_config: Option<Value>,
}

impl Manifest {
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Read the manifest under `root`. A missing file is `Ok(None)`.
    pub fn load(root: &Path) -> Result<Option<Manifest>, ConfigError> {
        let path = Self::path(root);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        };
        let manifest = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse { path, source: e })?;
        Ok(Some(manifest))
    }

    /// App version, defaulting to `0.0.0`.
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or("0.0.0")
    }
}

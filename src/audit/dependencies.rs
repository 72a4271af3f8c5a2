//! Installed-dependency consistency check.
//!
//! Every dependency declared in the manifest must be installed under the
//! dependency folder. Exact version pins must match the installed version;
//! ranges and non-registry specifiers only need the package to be present.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::audit::diagnostic::Diagnostic;
use crate::config::manifest::{Manifest, DEPENDENCY_DIR, MANIFEST_FILE};

#[derive(Debug, Deserialize)]
struct InstalledPackage {
    version: Option<String>,
}

/// Check `manifest`'s dependencies against what is installed under `root`.
pub fn check_dependencies(root: &Path, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let declared = manifest
        .dependencies
        .iter()
        .chain(manifest.dev_dependencies.iter());

    for (name, wanted) in declared {
        let package = root.join(DEPENDENCY_DIR).join(name).join(MANIFEST_FILE);
        let installed = fs::read_to_string(&package)
            .ok()
            .and_then(|content| serde_json::from_str::<InstalledPackage>(&content).ok());

        let Some(installed) = installed else {
            out.push(Diagnostic::missing_dependency(
                name,
                "is not installed, run your package manager's install command",
            ));
            continue;
        };

        if let (Some(pin), Some(version)) = (exact_version(wanted), installed.version.as_deref()) {
            if pin != version {
                out.push(Diagnostic::missing_dependency(
                    name,
                    format!("is installed at {version} but {pin} is declared"),
                ));
            }
        }
    }
}

/// The pinned version of `spec`, if it is an exact version.
fn exact_version(spec: &str) -> Option<&str> {
    let spec = spec.trim();
    let spec = spec.strip_prefix('=').unwrap_or(spec).trim();
    let plain = spec
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'));
    let core = spec.split(['-', '+']).next().unwrap_or(spec);
    let numeric = core.split('.').count() == 3
        && core
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    (plain && numeric).then_some(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::diagnostic::DiagnosticKind;
    use std::collections::BTreeMap;

    fn install(root: &Path, name: &str, version: &str) {
        let dir = root.join(DEPENDENCY_DIR).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            format!(r#"{{ "name": "{name}", "version": "{version}" }}"#),
        )
        .unwrap();
    }

    #[test]
    fn exact_versions() {
        assert_eq!(exact_version("1.2.3"), Some("1.2.3"));
        assert_eq!(exact_version("=1.2.3-beta.1"), Some("1.2.3-beta.1"));
        assert_eq!(exact_version("^1.2.3"), None);
        assert_eq!(exact_version("1.x"), None);
        assert_eq!(exact_version("1.2.x"), None);
        assert_eq!(exact_version("file:../lib"), None);
    }

    #[test]
    fn reports_missing_and_mismatched() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "present", "1.0.0");
        install(dir.path(), "pinned", "2.0.0");

        let manifest = Manifest {
            dependencies: BTreeMap::from([
                ("present".to_string(), "^1.0.0".to_string()),
                ("pinned".to_string(), "2.1.0".to_string()),
            ]),
            dev_dependencies: BTreeMap::from([("absent".to_string(), "*".to_string())]),
            ..Manifest::default()
        };

        let mut out = Vec::new();
        check_dependencies(dir.path(), &manifest, &mut out);

        let names: Vec<_> = out.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(names, vec!["pinned", "absent"]);
        assert!(out
            .iter()
            .all(|d| d.kind == DiagnosticKind::MissingDependency));
        assert!(out[0].detail.contains("2.0.0"));
    }
}

//! Project discovery and the audit skip policy.

use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::defaults::default_schema;
use crate::config::manifest::{Manifest, DEPENDENCY_DIR};

/// Pick the project root to audit.
///
/// `init_cwd` is the directory the invoking package manager was started
/// from (`INIT_CWD`), `cwd` the current working directory.
pub fn resolve_project_root(
    explicit: Option<&Path>,
    init_cwd: Option<&Path>,
    cwd: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(root) = explicit {
        return Some(root.to_path_buf());
    }
    if let (Some(init), Some(cwd)) = (init_cwd, cwd) {
        if init == cwd {
            return Some(cwd.to_path_buf());
        }
    }
    if let Some(cwd) = cwd {
        if !cwd.join(DEPENDENCY_DIR).is_dir() {
            return Some(cwd.to_path_buf());
        }
    }
    if let Some(init) = init_cwd {
        if init.join(DEPENDENCY_DIR).is_dir() {
            return Some(init.to_path_buf());
        }
    }
    None
}

/// [`resolve_project_root`] fed from the process environment.
pub fn resolve_from_env(explicit: Option<&Path>) -> Option<PathBuf> {
    let init_cwd = env::var_os("INIT_CWD").map(PathBuf::from);
    let cwd = env::current_dir().ok();
    resolve_project_root(explicit, init_cwd.as_deref(), cwd.as_deref())
}

/// Everything the skip policy looks at.
#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    pub root: Option<PathBuf>,
    pub manifest: Option<Manifest>,
    pub public_folder_exists: bool,
}

impl ProjectState {
    /// Inspect the project at `root`. An unreadable manifest counts as absent.
    pub fn inspect(root: Option<PathBuf>) -> Self {
        let Some(root) = root else {
            return Self::default();
        };
        let manifest = match Manifest::load(&root) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::debug!(error = %e, "Manifest unreadable, nothing to audit");
                None
            }
        };
        let public_folder_exists = root.join(public_folder(manifest.as_ref())).is_dir();
        Self {
            root: Some(root),
            manifest,
            public_folder_exists,
        }
    }
}

/// The public folder the user configured, else the schema default.
fn public_folder(manifest: Option<&Manifest>) -> String {
    manifest
        .and_then(|m| m.roosevelt_config.as_ref())
        .and_then(|c| c.get("publicFolder"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            default_schema()
                .node("publicFolder")
                .and_then(|n| n.default.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "public".to_string())
}

/// Why an audit did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProjectRoot,
    NoManifest,
    NoConfigSection,
    /// The public folder exists, so the app has been built before.
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditDecision {
    Run,
    Skip(SkipReason),
}

/// Decide whether an audit should run for this project state.
pub fn should_run_audit(state: &ProjectState) -> AuditDecision {
    if state.root.is_none() {
        return AuditDecision::Skip(SkipReason::NoProjectRoot);
    }
    let Some(manifest) = &state.manifest else {
        return AuditDecision::Skip(SkipReason::NoManifest);
    };
    if manifest.roosevelt_config.is_none() {
        return AuditDecision::Skip(SkipReason::NoConfigSection);
    }
    if state.public_folder_exists {
        return AuditDecision::Skip(SkipReason::AlreadyInitialized);
    }
    AuditDecision::Run
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn explicit_root_wins() {
        let root = resolve_project_root(
            Some(Path::new("/explicit")),
            Some(Path::new("/init")),
            Some(Path::new("/cwd")),
        );
        assert_eq!(root, Some(PathBuf::from("/explicit")));
    }

    #[test]
    fn init_cwd_equal_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(DEPENDENCY_DIR)).unwrap();
        let root = resolve_project_root(None, Some(dir.path()), Some(dir.path()));
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn cwd_without_dependencies_folder() {
        let cwd = tempfile::tempdir().unwrap();
        let init = tempfile::tempdir().unwrap();
        let root = resolve_project_root(None, Some(init.path()), Some(cwd.path()));
        assert_eq!(root.as_deref(), Some(cwd.path()));
    }

    #[test]
    fn falls_back_to_init_cwd_with_dependencies() {
        let cwd = tempfile::tempdir().unwrap();
        fs::create_dir(cwd.path().join(DEPENDENCY_DIR)).unwrap();
        let init = tempfile::tempdir().unwrap();
        fs::create_dir(init.path().join(DEPENDENCY_DIR)).unwrap();
        let root = resolve_project_root(None, Some(init.path()), Some(cwd.path()));
        assert_eq!(root.as_deref(), Some(init.path()));
    }

    #[test]
    fn undefined_when_nothing_fits() {
        let cwd = tempfile::tempdir().unwrap();
        fs::create_dir(cwd.path().join(DEPENDENCY_DIR)).unwrap();
        let init = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_project_root(None, Some(init.path()), Some(cwd.path())),
            None
        );
    }

    #[test]
    fn skip_policy() {
        assert_eq!(
            should_run_audit(&ProjectState::default()),
            AuditDecision::Skip(SkipReason::NoProjectRoot)
        );

        let mut state = ProjectState {
            root: Some(PathBuf::from("/app")),
            ..ProjectState::default()
        };
        assert_eq!(
            should_run_audit(&state),
            AuditDecision::Skip(SkipReason::NoManifest)
        );

        state.manifest = Some(Manifest::default());
        assert_eq!(
            should_run_audit(&state),
            AuditDecision::Skip(SkipReason::NoConfigSection)
        );

        state.manifest = Some(Manifest {
            roosevelt_config: Some(json!({})),
            ..Manifest::default()
        });
        assert_eq!(should_run_audit(&state), AuditDecision::Run);

        state.public_folder_exists = true;
        assert_eq!(
            should_run_audit(&state),
            AuditDecision::Skip(SkipReason::AlreadyInitialized)
        );
    }

    #[test]
    fn custom_public_folder_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "rooseveltConfig": { "publicFolder": "www" } }"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();
        assert!(!ProjectState::inspect(Some(dir.path().to_path_buf())).public_folder_exists);

        fs::create_dir(dir.path().join("www")).unwrap();
        assert!(ProjectState::inspect(Some(dir.path().to_path_buf())).public_folder_exists);
    }
}

//! User configuration auditor.
//!
//! # Data Flow
//! ```text
//! project root (explicit, INIT_CWD or cwd)
//!     → project.rs (manifest + skip policy)
//!     → walk.rs (rooseveltConfig vs default schema)
//!     → scripts.rs (lifecycle scripts vs script table)
//!     → dependencies.rs (declared vs installed)
//!     → LogSink (one line per finding, then one summary line)
//! ```
//!
//! # Design Decisions
//! - Advisory only: findings never abort startup
//! - The user config is borrowed immutably; the schema is never mutated
//! - Output order is deterministic, so repeated audits print the same lines

pub mod dependencies;
pub mod diagnostic;
pub mod project;
pub mod scripts;
pub mod sink;
pub mod walk;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::defaults::{default_schema, default_scripts, JsonType, Schema, ScriptTable};
use crate::config::manifest::Manifest;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use project::{should_run_audit, AuditDecision, ProjectState, SkipReason};
pub use sink::{Level, LogSink, RecordingSink, TracingSink};

const FAILURE_SUMMARY: &str = "Issues have been detected in rooseveltConfig, please consult \
https://github.com/rooseveltframework/roosevelt#configure-your-app-with-parameters for details \
on each param, and https://github.com/rooseveltframework/roosevelt#default-scripts for the \
recognized scripts.";

const SUCCESS_SUMMARY: &str = "rooseveltConfig audit completed with no errors found.";

/// Findings of one completed audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl AuditReport {
    /// Whether any finding fails the audit.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.fails_audit())
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// What an audit run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Skipped(SkipReason),
    Completed(AuditReport),
}

impl AuditOutcome {
    pub fn report(&self) -> Option<&AuditReport> {
        match self {
            AuditOutcome::Completed(report) => Some(report),
            AuditOutcome::Skipped(_) => None,
        }
    }
}

/// Audits projects against a schema and a script table.
#[derive(Debug, Clone, Copy)]
pub struct Auditor<'a> {
    schema: &'a Schema,
    scripts: &'a ScriptTable,
}

impl Auditor<'static> {
    /// An auditor over the built-in default tables.
    pub fn with_defaults() -> Self {
        Self::new(default_schema(), default_scripts())
    }
}

impl<'a> Auditor<'a> {
    pub fn new(schema: &'a Schema, scripts: &'a ScriptTable) -> Self {
        Self { schema, scripts }
    }

    /// Audit the project at `root`, honoring the skip policy.
    pub fn audit_project(&self, root: Option<PathBuf>, sink: &mut dyn LogSink) -> AuditOutcome {
        let state = ProjectState::inspect(root);
        match should_run_audit(&state) {
            AuditDecision::Skip(reason) => {
                tracing::debug!(?reason, "Skipping config audit");
                AuditOutcome::Skipped(reason)
            }
            AuditDecision::Run => {
                let (Some(root), Some(manifest)) = (state.root.as_deref(), &state.manifest) else {
                    return AuditOutcome::Skipped(SkipReason::NoManifest);
                };
                AuditOutcome::Completed(self.audit_manifest(Some(root), manifest, sink))
            }
        }
    }

    /// Audit an already loaded manifest. Dependencies are only checked when
    /// a project root is given.
    pub fn audit_manifest(
        &self,
        root: Option<&Path>,
        manifest: &Manifest,
        sink: &mut dyn LogSink,
    ) -> AuditReport {
        let mut diagnostics = Vec::new();

        match manifest.roosevelt_config.as_ref() {
            Some(Value::Object(user)) => {
                walk::diff_config(self.schema, user, &mut diagnostics);
            }
            Some(other) => diagnostics.push(Diagnostic::type_mismatch(
                "rooseveltConfig",
                "object",
                &JsonType::of(other).to_string(),
            )),
            None => {}
        }
        scripts::check_scripts(self.scripts, &manifest.scripts, &mut diagnostics);
        if let Some(root) = root {
            dependencies::check_dependencies(root, manifest, &mut diagnostics);
        }

        let report = AuditReport { diagnostics };
        for diagnostic in &report.diagnostics {
            sink.warn(&diagnostic.to_string());
        }
        if report.has_errors() {
            sink.error(FAILURE_SUMMARY);
        } else {
            sink.info(SUCCESS_SUMMARY);
        }
        report
    }
}

/// Audit the project at `project_root` (or the discovered one) with the
/// default tables, writing every finding to `sink`.
pub fn audit(project_root: Option<&Path>, sink: &mut dyn LogSink) -> AuditOutcome {
    let root = project::resolve_from_env(project_root);
    Auditor::with_defaults().audit_project(root, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::SchemaNode;
    use serde_json::json;

    #[test]
    fn summary_reflects_errors() {
        let schema = Schema::new([
            ("port", SchemaNode::leaf(json!(3000))),
            (
                "https",
                SchemaNode::object([
                    ("enable", SchemaNode::leaf(json!(false))),
                    ("port", SchemaNode::leaf(json!(3001)).optional()),
                ]),
            ),
        ]);
        let scripts = ScriptTable {
            scripts: Default::default(),
            roles: Default::default(),
        };
        let manifest = Manifest {
            roosevelt_config: Some(json!({
                "port": 3000,
                "https": { "enable": false },
                "extra": true
            })),
            ..Manifest::default()
        };

        let mut sink = RecordingSink::new();
        let report = Auditor::new(&schema, &scripts).audit_manifest(None, &manifest, &mut sink);

        assert_eq!(report.diagnostics, vec![Diagnostic::extra_param("extra")]);
        assert!(report.has_errors());
        assert_eq!(sink.messages(Level::Warn).len(), 1);
        assert_eq!(sink.messages(Level::Error), vec![FAILURE_SUMMARY]);
        assert!(sink.messages(Level::Info).is_empty());
    }

    #[test]
    fn clean_manifest_logs_success() {
        let scripts = default_scripts();
        let manifest = Manifest {
            roosevelt_config: Some(default_schema().defaults()),
            scripts: [
                ("audit", "roosevelt audit"),
                ("clean", "roosevelt clean"),
                ("kill-validator", "roosevelt kill-validator"),
                ("start", "roosevelt start --production-mode"),
                ("dev", "roosevelt start --development-mode"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            ..Manifest::default()
        };

        let mut sink = RecordingSink::new();
        let report = Auditor::new(default_schema(), scripts).audit_manifest(None, &manifest, &mut sink);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert_eq!(sink.messages(Level::Info), vec![SUCCESS_SUMMARY]);
    }

    #[test]
    fn non_object_config_section_is_a_type_mismatch() {
        let manifest = Manifest {
            roosevelt_config: Some(json!(true)),
            ..Manifest::default()
        };
        let mut sink = RecordingSink::new();
        let report = Auditor::with_defaults().audit_manifest(None, &manifest, &mut sink);
        assert_eq!(report.count(DiagnosticKind::TypeMismatch), 1);
    }
}

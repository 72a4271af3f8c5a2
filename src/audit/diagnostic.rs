//! Audit findings.

use std::fmt;

/// What an audit finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MissingParam,
    ExtraParam,
    TypeMismatch,
    MissingScript,
    OutdatedScript,
    /// No alias of a start-script role is declared.
    MissingScriptRole,
    MissingDependency,
}

impl DiagnosticKind {
    /// Whether this kind turns the audit summary into a failure.
    pub fn fails_audit(self) -> bool {
        !matches!(self, DiagnosticKind::MissingDependency)
    }
}

/// A single audit finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Dotted config path, script name, role name or dependency name.
    pub path: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn missing_param(path: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::MissingParam,
            path: path.into(),
            detail: String::new(),
        }
    }

    pub fn extra_param(path: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::ExtraParam,
            path: path.into(),
            detail: String::new(),
        }
    }

    pub fn type_mismatch(path: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self {
            kind: DiagnosticKind::TypeMismatch,
            path: path.into(),
            detail: format!("expected {expected}, found {actual}"),
        }
    }

    pub fn missing_script(name: impl Into<String>, canonical: &str) -> Self {
        Self {
            kind: DiagnosticKind::MissingScript,
            path: name.into(),
            detail: canonical.to_string(),
        }
    }

    pub fn outdated_script(name: impl Into<String>, current: &str, canonical: &str) -> Self {
        Self {
            kind: DiagnosticKind::OutdatedScript,
            path: name.into(),
            detail: format!("\"{current}\" should be \"{canonical}\""),
        }
    }

    pub fn missing_role(role: impl Into<String>, aliases: &[String], suggested: &str) -> Self {
        let aliases = aliases
            .iter()
            .map(|a| format!("\"{a}\""))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            kind: DiagnosticKind::MissingScriptRole,
            path: role.into(),
            detail: format!("declare one of {aliases}, e.g. \"{suggested}\""),
        }
    }

    pub fn missing_dependency(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::MissingDependency,
            path: name.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        let detail = &self.detail;
        match self.kind {
            DiagnosticKind::MissingParam => write!(f, "Missing param \"{path}\"!"),
            DiagnosticKind::ExtraParam => {
                write!(f, "Extra param \"{path}\" found, this can be removed.")
            }
            DiagnosticKind::TypeMismatch => write!(f, "Param \"{path}\" has the wrong type: {detail}."),
            DiagnosticKind::MissingScript => {
                write!(f, "Missing script \"{path}\"! Add it with the value \"{detail}\".")
            }
            DiagnosticKind::OutdatedScript => write!(
                f,
                "Detected outdated script \"{path}\": {detail} to restore functionality."
            ),
            DiagnosticKind::MissingScriptRole => {
                write!(f, "No {path} start script found: {detail}.")
            }
            DiagnosticKind::MissingDependency => write!(f, "Dependency \"{path}\" {detail}."),
        }
    }
}

//! Lifecycle script checks.

use std::collections::BTreeMap;

use crate::audit::diagnostic::Diagnostic;
use crate::config::defaults::ScriptTable;

/// Check declared `scripts` against the recognized script table.
pub fn check_scripts(
    table: &ScriptTable,
    declared: &BTreeMap<String, String>,
    out: &mut Vec<Diagnostic>,
) {
    for (name, spec) in &table.scripts {
        match declared.get(name) {
            None if spec.required => out.push(Diagnostic::missing_script(name, &spec.value)),
            None => {}
            Some(current) if current != &spec.value => {
                let ours = spec
                    .marker
                    .as_deref()
                    .map_or(true, |marker| current.contains(marker));
                if ours {
                    out.push(Diagnostic::outdated_script(name, current, &spec.value));
                }
            }
            Some(_) => {}
        }
    }

    for (role, spec) in &table.roles {
        if !spec.aliases.iter().any(|alias| declared.contains_key(alias)) {
            out.push(Diagnostic::missing_role(role, &spec.aliases, &spec.value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::diagnostic::DiagnosticKind;
    use crate::config::defaults::{ScriptRole, ScriptSpec};

    fn table() -> ScriptTable {
        ScriptTable {
            scripts: BTreeMap::from([(
                "clean".to_string(),
                ScriptSpec {
                    value: "node ./run-clean.js".into(),
                    required: true,
                    marker: Some("clean.js".into()),
                },
            )]),
            roles: BTreeMap::from([
                (
                    "production".to_string(),
                    ScriptRole {
                        aliases: vec!["start".into(), "prod".into(), "p".into()],
                        value: "app --production-mode".into(),
                    },
                ),
                (
                    "development".to_string(),
                    ScriptRole {
                        aliases: vec!["dev".into(), "d".into()],
                        value: "app --development-mode".into(),
                    },
                ),
            ]),
        }
    }

    fn declared(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn outdated_script_detected_by_marker() {
        let mut out = Vec::new();
        check_scripts(
            &table(),
            &declared(&[("clean", "node ./old-clean.js"), ("p", "x"), ("d", "y")]),
            &mut out,
        );
        assert_eq!(
            out,
            vec![Diagnostic::outdated_script(
                "clean",
                "node ./old-clean.js",
                "node ./run-clean.js"
            )]
        );
    }

    #[test]
    fn customized_script_without_marker_is_left_alone() {
        let mut out = Vec::new();
        check_scripts(
            &table(),
            &declared(&[("clean", "rm -rf build"), ("start", "x"), ("dev", "y")]),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn missing_roles_warned_once_each() {
        let mut out = Vec::new();
        check_scripts(&table(), &declared(&[("clean", "node ./run-clean.js")]), &mut out);
        let roles: Vec<_> = out
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MissingScriptRole)
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(roles, vec!["development", "production"]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn missing_required_script() {
        let mut out = Vec::new();
        check_scripts(&table(), &declared(&[("prod", "x"), ("dev", "y")]), &mut out);
        assert_eq!(
            out,
            vec![Diagnostic::missing_script("clean", "node ./run-clean.js")]
        );
    }
}

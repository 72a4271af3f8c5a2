//! Schema diff of a user configuration.
//!
//! Two passes over the same immutable input:
//! 1. walk the schema: missing required params and type mismatches;
//! 2. walk the user config: params the schema does not define.
//!
//! Object nodes are descended into; leaves and arrays are not. Nodes marked
//! `freeKeys` accept unknown children.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::audit::diagnostic::Diagnostic;
use crate::config::defaults::{JsonType, Schema, SchemaNode, Shape};

/// Diff `user` against `schema`, appending findings to `out`.
pub fn diff_config(schema: &Schema, user: &Map<String, Value>, out: &mut Vec<Diagnostic>) {
    check_schema(&schema.root, user, "", out);
    find_extras(&schema.root, false, user, "", out);
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn check_schema(
    nodes: &BTreeMap<String, SchemaNode>,
    user: &Map<String, Value>,
    prefix: &str,
    out: &mut Vec<Diagnostic>,
) {
    for (key, node) in nodes {
        let path = join(prefix, key);
        let Some(value) = user.get(key) else {
            if node.required {
                out.push(Diagnostic::missing_param(path));
            }
            continue;
        };

        match node.shape() {
            Shape::Object { children, .. } => match value {
                Value::Object(inner) => check_schema(children, inner, &path, out),
                other if node.types.contains(&JsonType::of(other)) => {}
                other => out.push(Diagnostic::type_mismatch(
                    path,
                    "object",
                    &JsonType::of(other).to_string(),
                )),
            },
            Shape::Scalar(_) | Shape::Array => {
                if !node.accepts(value) {
                    out.push(Diagnostic::type_mismatch(
                        path,
                        &node.expected_types(),
                        &JsonType::of(value).to_string(),
                    ));
                }
            }
        }
    }
}

fn find_extras(
    nodes: &BTreeMap<String, SchemaNode>,
    free_keys: bool,
    user: &Map<String, Value>,
    prefix: &str,
    out: &mut Vec<Diagnostic>,
) {
    for (key, value) in user {
        let path = join(prefix, key);
        match nodes.get(key) {
            Some(node) => {
                if let (Shape::Object { children, free_keys }, Value::Object(inner)) = (node.shape(), value) {
                    find_extras(children, free_keys, inner, &path, out);
                }
            }
            None if free_keys => {}
            None => report_unknown(value, path, out),
        }
    }
}

/// A non-empty unknown object is reported leaf by leaf.
fn report_unknown(value: &Value, path: String, out: &mut Vec<Diagnostic>) {
    match value {
        Value::Object(inner) if !inner.is_empty() => {
            for (key, child) in inner {
                report_unknown(child, join(&path, key), out);
            }
        }
        _ => out.push(Diagnostic::extra_param(path)),
    }
}

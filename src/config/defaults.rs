//! Default schema tables.
//!
//! Two static documents ship with the crate:
//! - `defaults/config.json`: every recognized `rooseveltConfig` key, annotated
//!   with its default value and audit metadata (`required`, `freeKeys`,
//!   `children`, `types`).
//! - `defaults/scripts.json`: the lifecycle scripts a project is expected to
//!   declare, and the start-script roles satisfied by any one alias.
//!
//! Both are parsed once per process and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::{Map, Value};

const CONFIG_DEFAULTS: &str = include_str!("../defaults/config.json");
const SCRIPT_DEFAULTS: &str = include_str!("../defaults/scripts.json");

/// JSON value kinds, as reported in type-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        };
        f.write_str(name)
    }
}

/// The structural shape a schema node expects. The auditor descends into
/// objects and checks everything else as a leaf.
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Scalar(JsonType),
    Array,
    Object {
        children: &'a BTreeMap<String, SchemaNode>,
        /// Unknown children are accepted.
        free_keys: bool,
    },
}

/// One annotated node of the default schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaNode {
    /// Default value of a leaf. Ignored for object nodes.
    #[serde(default)]
    pub default: Value,

    /// Whether absence from the user config is reported.
    #[serde(default = "required_by_default")]
    pub required: bool,

    /// Child nodes. Present only on object nodes the auditor descends into.
    #[serde(default)]
    pub children: Option<BTreeMap<String, SchemaNode>>,

    /// Accept arbitrary extra child keys without reporting them.
    #[serde(default)]
    pub free_keys: bool,

    /// Types accepted in addition to the default's own type.
    #[serde(default)]
    pub types: Vec<JsonType>,
}

fn required_by_default() -> bool {
    true
}

impl SchemaNode {
    /// A required leaf with the given default.
    pub fn leaf(default: Value) -> Self {
        Self {
            default,
            required: true,
            children: None,
            free_keys: false,
            types: Vec::new(),
        }
    }

    /// A required object node.
    pub fn object(children: impl IntoIterator<Item = (&'static str, SchemaNode)>) -> Self {
        Self {
            default: Value::Null,
            required: true,
            children: Some(
                children
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            ),
            free_keys: false,
            types: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_free_keys(mut self) -> Self {
        self.free_keys = true;
        self
    }

    pub fn shape(&self) -> Shape<'_> {
        match &self.children {
            Some(children) => Shape::Object {
                children,
                free_keys: self.free_keys,
            },
            None if self.default.is_array() => Shape::Array,
            None => Shape::Scalar(JsonType::of(&self.default)),
        }
    }

    /// Whether `value` has a type this leaf accepts.
    ///
    /// A `null` default with no declared alternatives accepts anything.
    pub fn accepts(&self, value: &Value) -> bool {
        let actual = JsonType::of(value);
        let expected = JsonType::of(&self.default);
        if expected == JsonType::Null && self.types.is_empty() {
            return true;
        }
        actual == expected || self.types.contains(&actual)
    }

    /// Human readable list of accepted types.
    pub fn expected_types(&self) -> String {
        let mut names = vec![JsonType::of(&self.default).to_string()];
        names.extend(self.types.iter().map(|t| t.to_string()));
        names.join(" or ")
    }

    /// Default value of this node, built from children for object nodes.
    pub fn default_value(&self) -> Value {
        match &self.children {
            Some(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.default_value()))
                    .collect::<Map<String, Value>>(),
            ),
            None => self.default.clone(),
        }
    }
}

/// The full default configuration schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub root: BTreeMap<String, SchemaNode>,
}

impl Schema {
    pub fn new(root: impl IntoIterator<Item = (&'static str, SchemaNode)>) -> Self {
        Self {
            root: root.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    pub fn parse(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Build the default configuration document.
    pub fn defaults(&self) -> Value {
        Value::Object(
            self.root
                .iter()
                .map(|(k, v)| (k.clone(), v.default_value()))
                .collect(),
        )
    }

    /// Look up a node by dotted path.
    pub fn node(&self, dotted: &str) -> Option<&SchemaNode> {
        let mut parts = dotted.split('.');
        let mut node = self.root.get(parts.next()?)?;
        for part in parts {
            node = node.children.as_ref()?.get(part)?;
        }
        Some(node)
    }
}

/// One recognized lifecycle script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptSpec {
    /// Canonical command line.
    pub value: String,

    /// Report the script when it is missing.
    #[serde(default)]
    pub required: bool,

    /// Substring identifying a declared script as ours (and so outdated when
    /// it differs from `value`). `None` means any mismatch is outdated.
    #[serde(default)]
    pub marker: Option<String>,
}

/// A start-script role, satisfied by declaring any one alias.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptRole {
    pub aliases: Vec<String>,

    /// Suggested command line for the role.
    pub value: String,
}

/// Table of recognized lifecycle scripts and start-script roles.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptTable {
    pub scripts: BTreeMap<String, ScriptSpec>,
    pub roles: BTreeMap<String, ScriptRole>,
}

impl ScriptTable {
    pub fn parse(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}

/// The process-wide default configuration schema.
pub fn default_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::parse(CONFIG_DEFAULTS).expect("embedded defaults/config.json is valid")
    })
}

/// The process-wide lifecycle script table.
pub fn default_scripts() -> &'static ScriptTable {
    static SCRIPTS: OnceLock<ScriptTable> = OnceLock::new();
    SCRIPTS.get_or_init(|| {
        ScriptTable::parse(SCRIPT_DEFAULTS).expect("embedded defaults/scripts.json is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_tables_parse() {
        assert!(default_schema().root.contains_key("port"));
        assert!(default_scripts().scripts.contains_key("clean"));
        assert_eq!(
            default_scripts().roles["production"].aliases,
            vec!["start", "prod", "p"]
        );
    }

    #[test]
    fn shapes() {
        let schema = default_schema();
        assert!(matches!(
            schema.node("port").unwrap().shape(),
            Shape::Scalar(JsonType::Number)
        ));
        assert!(matches!(
            schema.node("https").unwrap().shape(),
            Shape::Object { free_keys: false, .. }
        ));
        assert!(matches!(
            schema.node("logging.methods").unwrap().shape(),
            Shape::Object { free_keys: true, .. }
        ));
        assert!(matches!(
            schema.node("staticsSymlinksToPublic").unwrap().shape(),
            Shape::Array
        ));
    }

    #[test]
    fn defaults_built_from_children() {
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
        assert_eq!(
            schema.defaults(),
            json!({ "port": 3000, "https": { "enable": false, "port": 3001 } })
        );
    }

    #[test]
    fn null_default_accepts_declared_types_only() {
        let node = default_schema().node("css.whitelist").unwrap();
        assert!(node.accepts(&json!(null)));
        assert!(node.accepts(&json!(["a.css"])));
        assert!(!node.accepts(&json!("a.css")));
        assert_eq!(node.expected_types(), "null or array");
    }
}

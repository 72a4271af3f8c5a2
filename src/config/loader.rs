//! Configuration loading and layering.
//!
//! Layers, lowest precedence first:
//! schema defaults → manifest `rooseveltConfig` → constructor params →
//! environment → command line flags.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::defaults::{default_schema, Schema};
use crate::config::manifest::Manifest;
use crate::config::schema::{AppConfig, Mode};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration value: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Flag-style overrides, from the command line or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub mode: Option<Mode>,
    /// Enable or disable the HTML validator.
    pub validator: Option<bool>,
    /// Run the validator detached (`true`) or attached (`false`).
    pub validator_detached: Option<bool>,
    pub auto_killer: Option<bool>,
}

impl Overrides {
    /// Read `ROOSEVELT_MODE`, `ROOSEVELT_VALIDATOR` and `ROOSEVELT_AUTOKILLER`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Unrecognized values are ignored.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mode = get("ROOSEVELT_MODE").and_then(|v| match v.to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Mode::Production),
            "development" | "dev" => Some(Mode::Development),
            _ => None,
        });
        let validator_detached =
            get("ROOSEVELT_VALIDATOR").and_then(|v| match v.to_ascii_lowercase().as_str() {
                "detached" => Some(true),
                "attached" => Some(false),
                _ => None,
            });
        let auto_killer =
            get("ROOSEVELT_AUTOKILLER").and_then(|v| match v.to_ascii_lowercase().as_str() {
                "on" | "true" => Some(true),
                "off" | "false" => Some(false),
                _ => None,
            });
        Self {
            mode,
            validator: None,
            validator_detached,
            auto_killer,
        }
    }

    /// Convert to a config fragment for merging.
    pub fn to_value(&self) -> Value {
        let mut fragment = json!({});
        if let Some(mode) = self.mode {
            fragment["mode"] = json!(mode);
        }
        let mut validator = json!({});
        if let Some(enable) = self.validator {
            validator["enable"] = json!(enable);
        }
        if let Some(detached) = self.validator_detached {
            validator["separateProcess"]["enable"] = json!(detached);
        }
        if let Some(auto_killer) = self.auto_killer {
            validator["separateProcess"]["autoKiller"] = json!(auto_killer);
        }
        if validator.as_object().is_some_and(|v| !v.is_empty()) {
            fragment["htmlValidator"] = validator;
        }
        fragment
    }
}

/// All sources a configuration is assembled from.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers<'a> {
    pub manifest: Option<&'a Value>,
    pub params: Option<&'a Value>,
    pub env: Overrides,
    pub cli: Overrides,
}

/// Merge `overlay` into `base`. Objects merge key by key; anything else
/// replaces.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Merge all layers over the schema defaults.
pub fn merge_layers(schema: &Schema, layers: &ConfigLayers<'_>) -> Value {
    let mut merged = schema.defaults();
    if let Some(manifest) = layers.manifest {
        deep_merge(&mut merged, manifest);
    }
    if let Some(params) = layers.params {
        deep_merge(&mut merged, params);
    }

    let flags_enabled = merged
        .get("enableCLIFlags")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if flags_enabled {
        deep_merge(&mut merged, &layers.env.to_value());
        deep_merge(&mut merged, &layers.cli.to_value());
    }
    merged
}

/// Build the typed configuration from layers without validating it.
pub fn resolve_config(layers: &ConfigLayers<'_>) -> Result<AppConfig, ConfigError> {
    let merged = merge_layers(default_schema(), layers);
    Ok(serde_json::from_value(merged)?)
}

/// Load, merge and validate the configuration of the project at `root`.
pub fn load_config(
    root: &Path,
    manifest: Option<&Manifest>,
    params: Option<&Value>,
    cli: &Overrides,
) -> Result<AppConfig, ConfigError> {
    let layers = ConfigLayers {
        manifest: manifest.and_then(|m| m.roosevelt_config.as_ref()),
        params,
        env: Overrides::from_env(),
        cli: cli.clone(),
    };
    let config = resolve_config(&layers)?;

    validate_config(&config, root).map_err(ConfigError::Validation)?;

    tracing::debug!(
        root = %root.display(),
        port = config.port,
        mode = ?config.mode,
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_cli_over_params_over_manifest() {
        let manifest = json!({ "port": 1000, "mode": "production" });
        let params = json!({ "port": 2000 });
        let layers = ConfigLayers {
            manifest: Some(&manifest),
            params: Some(&params),
            env: Overrides::default(),
            cli: Overrides {
                mode: Some(Mode::Development),
                ..Overrides::default()
            },
        };
        let config = resolve_config(&layers).unwrap();
        assert_eq!(config.port, 2000);
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn cli_beats_environment() {
        let env = Overrides::from_vars(|key| match key {
            "ROOSEVELT_MODE" => Some("production".into()),
            "ROOSEVELT_VALIDATOR" => Some("attached".into()),
            _ => None,
        });
        let layers = ConfigLayers {
            env,
            cli: Overrides {
                mode: Some(Mode::Development),
                ..Overrides::default()
            },
            ..ConfigLayers::default()
        };
        let config = resolve_config(&layers).unwrap();
        assert_eq!(config.mode, Mode::Development);
        assert!(!config.html_validator.separate_process.enable);
    }

    #[test]
    fn environment_beats_params() {
        let params = json!({
            "mode": "development",
            "htmlValidator": { "separateProcess": { "autoKiller": true } }
        });
        let layers = ConfigLayers {
            params: Some(&params),
            env: Overrides::from_vars(|key| match key {
                "ROOSEVELT_MODE" => Some("prod".into()),
                "ROOSEVELT_AUTOKILLER" => Some("off".into()),
                _ => None,
            }),
            ..ConfigLayers::default()
        };
        let config = resolve_config(&layers).unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert!(!config.html_validator.separate_process.auto_killer);
    }

    #[test]
    fn disabled_cli_flags_are_ignored() {
        let params = json!({ "enableCLIFlags": false });
        let layers = ConfigLayers {
            params: Some(&params),
            cli: Overrides {
                mode: Some(Mode::Production),
                validator: Some(false),
                ..Overrides::default()
            },
            ..ConfigLayers::default()
        };
        let config = resolve_config(&layers).unwrap();
        assert_eq!(config.mode, Mode::Development);
        assert!(config.html_validator.enable);
    }

    #[test]
    fn nested_objects_merge_key_by_key() {
        let params = json!({ "https": { "enable": true } });
        let layers = ConfigLayers {
            params: Some(&params),
            ..ConfigLayers::default()
        };
        let config = resolve_config(&layers).unwrap();
        assert!(config.https.enable);
        assert_eq!(config.https.port, 43733);
    }

    #[test]
    fn validator_overrides_map_to_nested_keys() {
        let overrides = Overrides {
            validator: Some(true),
            validator_detached: Some(true),
            auto_killer: Some(false),
            ..Overrides::default()
        };
        assert_eq!(
            overrides.to_value(),
            json!({
                "htmlValidator": {
                    "enable": true,
                    "separateProcess": { "enable": true, "autoKiller": false }
                }
            })
        );
    }

    #[test]
    fn unknown_env_values_are_ignored() {
        let env = Overrides::from_vars(|_| Some("bogus".into()));
        assert_eq!(env, Overrides::default());
    }

    #[test]
    fn wrong_type_is_invalid() {
        let params = json!({ "port": "not-a-port" });
        let layers = ConfigLayers {
            params: Some(&params),
            ..ConfigLayers::default()
        };
        assert!(matches!(
            resolve_config(&layers),
            Err(ConfigError::Invalid(_))
        ));
    }
}

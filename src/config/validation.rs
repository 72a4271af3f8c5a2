//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports valid, no port clashes)
//! - Check that configured directories are not regular files
//! - Check that HTTPS has a certificate and key
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the config and the project tree
//! - Runs before config is accepted into the system

use std::fmt;
use std::path::Path;

use crate::config::schema::AppConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A port is zero.
    ZeroPort { param: &'static str },

    /// Two listeners want the same port.
    PortClash {
        first: &'static str,
        second: &'static str,
        port: u16,
    },

    /// HTTPS is enabled without certificate or key.
    MissingTlsFile { param: &'static str },

    /// A directory param points at an existing regular file.
    NotADirectory { param: &'static str, path: String },

    /// The validator is enabled with an empty command.
    EmptyValidatorCommand,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroPort { param } => write!(f, "{param} must not be 0"),
            ValidationError::PortClash {
                first,
                second,
                port,
            } => write!(f, "{first} and {second} both use port {port}"),
            ValidationError::MissingTlsFile { param } => {
                write!(f, "https is enabled but {param} is not set")
            }
            ValidationError::NotADirectory { param, path } => {
                write!(f, "{param} points at file \"{path}\", expected a directory")
            }
            ValidationError::EmptyValidatorCommand => {
                write!(f, "htmlValidator.command must name a program")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate `config` for the project at `root`.
pub fn validate_config(config: &AppConfig, root: &Path) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut ports: Vec<(&'static str, u16)> = Vec::new();
    if config.http_enabled() {
        ports.push(("port", config.port));
    }
    if config.https.enable {
        ports.push(("https.port", config.https.port));
        if config.https.auth_info_path.cert.is_none() {
            errors.push(ValidationError::MissingTlsFile {
                param: "https.authInfoPath.cert",
            });
        }
        if config.https.auth_info_path.key.is_none() {
            errors.push(ValidationError::MissingTlsFile {
                param: "https.authInfoPath.key",
            });
        }
    }
    if config.validator_active() {
        ports.push(("htmlValidator.port", config.html_validator.port));
        if config.html_validator.command.is_empty() {
            errors.push(ValidationError::EmptyValidatorCommand);
        }
    }
    if config.frontend_reload.enable && !config.is_production() {
        ports.push(("frontendReload.port", config.frontend_reload.port));
    }

    for (i, (param, port)) in ports.iter().enumerate() {
        if *port == 0 {
            errors.push(ValidationError::ZeroPort { param: *param });
            continue;
        }
        if let Some((first, _)) = ports[..i].iter().find(|(_, p)| p == port) {
            errors.push(ValidationError::PortClash {
                first: *first,
                second: *param,
                port: *port,
            });
        }
    }

    let directories: [(&'static str, &str); 7] = [
        ("modelsPath", &config.models_path),
        ("viewsPath", &config.views_path),
        ("controllersPath", &config.controllers_path),
        ("publicFolder", &config.public_folder),
        ("staticsRoot", &config.statics_root),
        ("css.output", &config.css.output),
        ("js.output", &config.js.output),
    ];
    for (param, dir) in directories {
        if root.join(dir).is_file() {
            errors.push(ValidationError::NotADirectory {
                param,
                path: dir.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Mode;

    #[test]
    fn default_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(validate_config(&AppConfig::default(), dir.path()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("statics"), "not a dir").unwrap();

        let mut config = AppConfig::default();
        config.https.enable = true;
        config.https.port = config.port;

        let errors = validate_config(&config, dir.path()).unwrap_err();
        assert!(errors.contains(&ValidationError::PortClash {
            first: "port",
            second: "https.port",
            port: 43711,
        }));
        assert!(errors.contains(&ValidationError::MissingTlsFile {
            param: "https.authInfoPath.cert"
        }));
        assert!(errors.contains(&ValidationError::MissingTlsFile {
            param: "https.authInfoPath.key"
        }));
        assert!(errors.contains(&ValidationError::NotADirectory {
            param: "staticsRoot",
            path: "statics".into(),
        }));
    }

    #[test]
    fn production_ignores_dev_tool_ports() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.mode = Mode::Production;
        config.html_validator.port = config.port;
        config.frontend_reload.port = config.port;
        assert_eq!(validate_config(&config, dir.path()), Ok(()));
    }

    #[test]
    fn zero_port_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.port = 0;
        let errors = validate_config(&config, dir.path()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroPort { param: "port" }]);
    }
}

//! Asset pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! statics/<css|js> → sources.rs (whitelist / blacklist)
//!     → compiler.rs (registered module, minify in production)
//!     → <output>/<file>   (only rewritten when content changes)
//! statics/js bundles → js.rs → <js.output>/<bundler.output>/<bundle>
//! ```

pub mod compiler;
pub mod css;
pub mod js;
pub mod minify;
pub mod sources;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::AppConfig;

pub use compiler::{CompileError, CompileOptions, Compiler, CompilerRegistry, SourceFile};

/// Errors that can occur while building assets.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{pipeline} compiler \"{module}\" is not registered (registered: {known})")]
    UnknownCompiler {
        pipeline: &'static str,
        module: String,
        known: String,
    },

    #[error("failed to compile {}: {source}", .path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Files written by a build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub written: Vec<PathBuf>,
}

/// Run the CSS and JS pipelines.
pub fn build_assets(
    root: &Path,
    config: &AppConfig,
    version: &str,
    registry: &CompilerRegistry,
) -> Result<AssetReport, AssetError> {
    let css = registry.resolve("css", &config.css.compiler.module)?;
    let js = registry.resolve("js", &config.js.compiler.module)?;

    let mut report = AssetReport::default();
    css::build(root, config, version, css.as_ref(), &mut report)?;
    js::build(root, config, js.as_ref(), &mut report)?;
    Ok(report)
}

/// Write `contents` unless the file already holds exactly that.
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool, AssetError> {
    if fs::read_to_string(path).is_ok_and(|current| current == contents) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AssetError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

pub(crate) fn read_source(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile each entry from `source_dir` into `output_dir`.
pub(crate) fn compile_entries(
    source_dir: &Path,
    output_dir: &Path,
    entries: &[sources::SourceEntry],
    compiler: &dyn Compiler,
    options: &CompileOptions<'_>,
    report: &mut AssetReport,
) -> Result<(), AssetError> {
    for entry in entries {
        let input = source_dir.join(&entry.input);
        let contents = read_source(&input)?;
        let compiled = compiler
            .parse(
                &SourceFile {
                    path: &input,
                    contents: &contents,
                },
                options,
            )
            .map_err(|source| AssetError::Compile {
                path: input.clone(),
                source,
            })?;

        let output = output_dir.join(&entry.output);
        if write_if_changed(&output, &compiled)? {
            tracing::info!(output = %output.display(), "Compiled asset");
            report.written.push(output);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Mode;

    #[test]
    fn unknown_compiler_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.js.compiler.module = "roosevelt-closure".into();
        let err = build_assets(dir.path(), &config, "1.0.0", &CompilerRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, AssetError::UnknownCompiler { pipeline: "js", .. }));
        assert!(!dir.path().join(".build").exists());
    }

    #[test]
    fn builds_both_pipelines_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("statics/css")).unwrap();
        fs::create_dir_all(root.join("statics/js")).unwrap();
        fs::write(root.join("statics/css/app.css"), "a {\n  color: red;\n}\n").unwrap();
        fs::write(root.join("statics/js/app.js"), "run();   \n\n").unwrap();

        let mut config = AppConfig::default();
        config.mode = Mode::Production;
        let registry = CompilerRegistry::with_builtins();

        let report = build_assets(root, &config, "1.0.0", &registry).unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(fs::read_to_string(root.join(".build/css/app.css")).unwrap(), "a{color:red}");
        assert_eq!(fs::read_to_string(root.join(".build/js/app.js")).unwrap(), "run();\n");

        let again = build_assets(root, &config, "1.0.0", &registry).unwrap();
        assert!(again.written.is_empty());
    }

    #[test]
    fn development_mode_does_not_minify() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("statics/css")).unwrap();
        fs::write(dir.path().join("statics/css/app.css"), "a { }\n").unwrap();

        build_assets(dir.path(), &AppConfig::default(), "1.0.0", &CompilerRegistry::default()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join(".build/css/app.css")).unwrap(), "a { }\n");
    }
}

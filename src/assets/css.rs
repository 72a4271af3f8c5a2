//! CSS pipeline.

use std::path::{Path, PathBuf};

use crate::assets::sources::select_sources;
use crate::assets::{compile_entries, write_if_changed, AssetError, AssetReport, CompileOptions, Compiler};
use crate::config::schema::{AppConfig, VersionFile};

/// Contents of the generated version stylesheet.
pub fn version_stylesheet(version_file: &VersionFile, version: &str) -> String {
    format!(
        "/* generated by roosevelt, do not edit */\n:root {{ --{}: \"{}\"; }}\n",
        version_file.var_name, version
    )
}

/// Write the version stylesheet into the CSS source folder if it changed.
/// Returns the path when it was written.
pub fn write_version_file(root: &Path, config: &AppConfig, version: &str) -> Result<Option<PathBuf>, AssetError> {
    let Some(version_file) = &config.css.version_file else {
        return Ok(None);
    };
    let path = root
        .join(&config.statics_root)
        .join(&config.css.source_path)
        .join(&version_file.file_name);
    if write_if_changed(&path, &version_stylesheet(version_file, version))? {
        tracing::info!(file = %path.display(), version, "Wrote version stylesheet");
        return Ok(Some(path));
    }
    Ok(None)
}

pub(crate) fn build(
    root: &Path,
    config: &AppConfig,
    version: &str,
    compiler: &dyn Compiler,
    report: &mut AssetReport,
) -> Result<(), AssetError> {
    if let Some(path) = write_version_file(root, config, version)? {
        report.written.push(path);
    }

    let source_dir = root.join(&config.statics_root).join(&config.css.source_path);
    let entries = select_sources(&source_dir, config.css.whitelist.as_deref(), None)?;
    let options = CompileOptions {
        minify: config.minify_assets(),
        params: &config.css.compiler.params,
    };
    compile_entries(
        &source_dir,
        &root.join(&config.css.output),
        &entries,
        compiler,
        &options,
        report,
    )
}

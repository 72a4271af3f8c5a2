//! JS pipeline and bundler.

use std::path::{Path, PathBuf};

use crate::assets::sources::select_sources;
use crate::assets::{
    compile_entries, read_source, write_if_changed, AssetError, AssetReport, CompileOptions, Compiler, SourceFile,
};
use crate::config::schema::{AppConfig, Bundle};

/// Folder bundles are written to. Exposed bundles live under the JS output
/// folder, which is linked into the public folder.
pub fn bundle_dir(root: &Path, config: &AppConfig) -> PathBuf {
    if config.js.bundler.expose {
        root.join(&config.js.output).join(&config.js.bundler.output)
    } else {
        root.join(&config.js.bundler.output)
    }
}

pub(crate) fn build(
    root: &Path,
    config: &AppConfig,
    compiler: &dyn Compiler,
    report: &mut AssetReport,
) -> Result<(), AssetError> {
    let source_dir = root.join(&config.statics_root).join(&config.js.source_path);
    let entries = select_sources(
        &source_dir,
        config.js.whitelist.as_deref(),
        config.js.blacklist.as_deref(),
    )?;
    let options = CompileOptions {
        minify: config.minify_assets(),
        params: &config.js.compiler.params,
    };
    compile_entries(
        &source_dir,
        &root.join(&config.js.output),
        &entries,
        compiler,
        &options,
        report,
    )?;

    let out_dir = bundle_dir(root, config);
    for bundle in &config.js.bundler.bundles {
        let path = out_dir.join(&bundle.output);
        let contents = bundle_contents(&source_dir, bundle, compiler, &options)?;
        if write_if_changed(&path, &contents)? {
            tracing::info!(bundle = %path.display(), files = bundle.files.len(), "Wrote bundle");
            report.written.push(path);
        }
    }
    Ok(())
}

/// Compile each bundle member and join them in order.
fn bundle_contents(
    source_dir: &Path,
    bundle: &Bundle,
    compiler: &dyn Compiler,
    options: &CompileOptions<'_>,
) -> Result<String, AssetError> {
    let mut parts = Vec::with_capacity(bundle.files.len());
    for file in &bundle.files {
        let input = source_dir.join(file);
        let contents = read_source(&input)?;
        let compiled = compiler
            .parse(
                &SourceFile {
                    path: &input,
                    contents: &contents,
                },
                options,
            )
            .map_err(|source| AssetError::Compile { path: input, source })?;
        parts.push(compiled.trim_end().to_string());
    }
    // Statement separator guards files missing a trailing semicolon.
    Ok(parts.join("\n;\n") + "\n")
}

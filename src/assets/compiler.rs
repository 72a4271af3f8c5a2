//! Pluggable CSS/JS compilers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::assets::minify::{minify_css, trim_js};
use crate::assets::AssetError;

/// One source file handed to a compiler.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    pub contents: &'a str,
}

/// Per-pipeline compiler options.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions<'a> {
    pub minify: bool,
    /// `compiler.params` from the configuration.
    pub params: &'a Map<String, Value>,
}

/// A compiler rejected its input.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns a source file into its output text.
pub trait Compiler: Send + Sync {
    fn parse(&self, source: &SourceFile<'_>, options: &CompileOptions<'_>) -> Result<String, CompileError>;
}

/// Copies sources unchanged.
#[derive(Debug, Default)]
pub struct PassThrough;

impl Compiler for PassThrough {
    fn parse(&self, source: &SourceFile<'_>, _options: &CompileOptions<'_>) -> Result<String, CompileError> {
        Ok(source.contents.to_string())
    }
}

/// Minifies `.css` files and trims `.js` files when minification is on.
#[derive(Debug, Default)]
pub struct Minifier;

impl Compiler for Minifier {
    fn parse(&self, source: &SourceFile<'_>, options: &CompileOptions<'_>) -> Result<String, CompileError> {
        if !options.minify {
            return Ok(source.contents.to_string());
        }
        match source.path.extension().and_then(|e| e.to_str()) {
            Some("css") => minify_css(source.contents).map_err(CompileError::new),
            Some("js" | "mjs") => Ok(trim_js(source.contents)),
            _ => Ok(source.contents.to_string()),
        }
    }
}

/// Compilers by module name.
#[derive(Clone)]
pub struct CompilerRegistry {
    compilers: BTreeMap<String, Arc<dyn Compiler>>,
}

impl CompilerRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            compilers: BTreeMap::new(),
        }
    }

    /// Registry with `none` and `roosevelt-minify`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("none", PassThrough);
        registry.register("roosevelt-minify", Minifier);
        registry
    }

    /// Add or replace a compiler.
    pub fn register(&mut self, name: impl Into<String>, compiler: impl Compiler + 'static) {
        self.compilers.insert(name.into(), Arc::new(compiler));
    }

    pub fn names(&self) -> Vec<&str> {
        self.compilers.keys().map(String::as_str).collect()
    }

    /// Look up `module` for the `pipeline` (`css` or `js`).
    pub fn resolve(&self, pipeline: &'static str, module: &str) -> Result<Arc<dyn Compiler>, AssetError> {
        self.compilers
            .get(module)
            .cloned()
            .ok_or_else(|| AssetError::UnknownCompiler {
                pipeline,
                module: module.to_string(),
                known: self.names().join(", "),
            })
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("compilers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Compiler for Upper {
        fn parse(&self, source: &SourceFile<'_>, _: &CompileOptions<'_>) -> Result<String, CompileError> {
            Ok(source.contents.to_uppercase())
        }
    }

    fn options(minify: bool, params: &Map<String, Value>) -> CompileOptions<'_> {
        CompileOptions { minify, params }
    }

    #[test]
    fn unknown_module_names_known_ones() {
        let registry = CompilerRegistry::with_builtins();
        let err = registry.resolve("css", "roosevelt-less").err().unwrap();
        let message = err.to_string();
        assert!(message.contains("roosevelt-less"));
        assert!(message.contains("none, roosevelt-minify"));
    }

    #[test]
    fn custom_compilers_can_be_registered() {
        let mut registry = CompilerRegistry::with_builtins();
        registry.register("upper", Upper);
        let params = Map::new();
        let compiler = registry.resolve("js", "upper").unwrap();
        let source = SourceFile {
            path: Path::new("a.js"),
            contents: "let a;",
        };
        assert_eq!(compiler.parse(&source, &options(false, &params)).unwrap(), "LET A;");
    }

    #[test]
    fn minifier_only_acts_when_enabled() {
        let params = Map::new();
        let source = SourceFile {
            path: Path::new("a.css"),
            contents: "a {\n  color: red;\n}\n",
        };
        assert_eq!(Minifier.parse(&source, &options(false, &params)).unwrap(), source.contents);
        assert_eq!(Minifier.parse(&source, &options(true, &params)).unwrap(), "a{color:red}");
    }
}

//! Configuration schema definitions.
//!
//! This module defines the typed application configuration. All types derive
//! Serde traits and use the camelCase key names of the `rooseveltConfig`
//! manifest section. Every default here mirrors `defaults/config.json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration for an application.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// HTTP port.
    pub port: u16,

    /// Development or production behavior.
    pub mode: Mode,

    /// Honor command line flags and environment overrides.
    #[serde(rename = "enableCLIFlags")]
    pub enable_cli_flags: bool,

    /// Create the MVC folder layout on startup.
    pub generate_folder_structure: bool,

    /// Bind to the loopback interface only.
    pub localhost_only: bool,

    /// Minify compiled assets in production mode.
    pub minify: bool,

    /// Milliseconds to wait for in-flight requests during shutdown.
    pub shutdown_timeout: u64,

    pub logging: LoggingConfig,

    pub html_validator: HtmlValidatorConfig,

    pub https: HttpsConfig,

    pub models_path: String,
    pub views_path: String,
    pub controllers_path: String,

    /// Folder served to browsers, relative to the project root.
    pub public_folder: String,

    /// Root of the static source folders (css, js, images).
    pub statics_root: String,

    /// Statics subfolders linked into the public folder (`src` or `src:dest`).
    pub statics_symlinks_to_public: Vec<String>,

    /// Nest the public folder under the app version.
    pub versioned_public: bool,

    /// Serve the public folder in production mode too.
    pub always_host_public: bool,

    pub css: CssConfig,

    pub js: JsConfig,

    pub frontend_reload: FrontendReloadConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 43711,
            mode: Mode::Development,
            enable_cli_flags: true,
            generate_folder_structure: true,
            localhost_only: true,
            minify: true,
            shutdown_timeout: 30_000,
            logging: LoggingConfig::default(),
            html_validator: HtmlValidatorConfig::default(),
            https: HttpsConfig::default(),
            models_path: "mvc/models".to_string(),
            views_path: "mvc/views".to_string(),
            controllers_path: "mvc/controllers".to_string(),
            public_folder: "public".to_string(),
            statics_root: "statics".to_string(),
            statics_symlinks_to_public: vec!["images".to_string()],
            versioned_public: false,
            always_host_public: false,
            css: CssConfig::default(),
            js: JsConfig::default(),
            frontend_reload: FrontendReloadConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    /// Whether compiled assets get minified.
    pub fn minify_assets(&self) -> bool {
        self.minify && self.is_production()
    }

    /// Whether the HTML validator runs at all.
    pub fn validator_active(&self) -> bool {
        self.html_validator.enable && !self.is_production()
    }

    /// Whether plain HTTP is served.
    pub fn http_enabled(&self) -> bool {
        !(self.https.enable && self.https.force)
    }
}

/// Application mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub methods: LogMethods,
}

/// Enabled log channels. Unknown keys are custom channels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogMethods {
    /// Per-request access logs.
    pub http: bool,
    pub info: bool,
    pub warn: bool,
    pub error: bool,
    /// Debug-level framework logs.
    pub verbose: bool,

    #[serde(flatten)]
    pub custom: BTreeMap<String, bool>,
}

impl Default for LogMethods {
    fn default() -> Self {
        Self {
            http: true,
            info: true,
            warn: true,
            error: true,
            verbose: false,
            custom: BTreeMap::new(),
        }
    }
}

impl LogMethods {
    /// Whether a named channel is enabled. Unknown channels are off.
    pub fn enabled(&self, channel: &str) -> bool {
        match channel {
            "http" => self.http,
            "info" => self.info,
            "warn" => self.warn,
            "error" => self.error,
            "verbose" => self.verbose,
            other => self.custom.get(other).copied().unwrap_or(false),
        }
    }
}

/// HTML validator settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HtmlValidatorConfig {
    pub enable: bool,

    /// Port of the validator web service.
    pub port: u16,

    /// Program and arguments that start the validator. The port is appended.
    pub command: Vec<String>,

    /// Log validator warnings, not only errors.
    pub show_warnings: bool,

    pub separate_process: SeparateProcessConfig,

    pub exceptions: ValidatorExceptions,
}

impl Default for HtmlValidatorConfig {
    fn default() -> Self {
        Self {
            enable: true,
            port: 48888,
            command: ["java", "-cp", "vnu.jar", "nu.validator.servlet.Main"]
                .into_iter()
                .map(String::from)
                .collect(),
            show_warnings: true,
            separate_process: SeparateProcessConfig::default(),
            exceptions: ValidatorExceptions::default(),
        }
    }
}

/// Detached validator settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeparateProcessConfig {
    /// Run the validator detached so it survives app restarts.
    pub enable: bool,

    /// Kill the detached validator once the app stops answering.
    pub auto_killer: bool,

    /// Auto-killer poll interval in milliseconds.
    pub auto_killer_timeout: u64,

    /// Program and arguments that run the validator host. Empty means the
    /// current executable, which must reach `App::serve` or call
    /// `validator::run_host_if_requested`.
    pub host_command: Vec<String>,
}

impl Default for SeparateProcessConfig {
    fn default() -> Self {
        Self {
            enable: true,
            auto_killer: true,
            auto_killer_timeout: 3_600_000,
            host_command: Vec::new(),
        }
    }
}

/// Requests exempt from validation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorExceptions {
    /// Requests carrying this header are not validated.
    pub request_header: String,
}

impl Default for ValidatorExceptions {
    fn default() -> Self {
        Self {
            request_header: "Partial".to_string(),
        }
    }
}

/// HTTPS listener settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpsConfig {
    pub enable: bool,

    /// Serve HTTPS only.
    pub force: bool,

    pub port: u16,

    pub auth_info_path: AuthInfoPath,
}

impl Default for HttpsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            force: false,
            port: 43733,
            auth_info_path: AuthInfoPath::default(),
        }
    }
}

/// PEM certificate and key paths, relative to the project root.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthInfoPath {
    pub cert: Option<String>,
    pub key: Option<String>,
}

/// Compiler selection shared by CSS and JS.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Registered compiler name.
    pub module: String,

    /// Free-form parameters handed to the compiler.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CompilerConfig {
    pub fn named(module: &str) -> Self {
        Self {
            module: module.to_string(),
            params: Map::new(),
        }
    }
}

/// CSS pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CssConfig {
    /// Source folder under the statics root.
    pub source_path: String,
    pub compiler: CompilerConfig,
    /// Files to compile (`src` or `src:out`). `None` compiles everything.
    pub whitelist: Option<Vec<String>>,
    /// Output folder, relative to the project root.
    pub output: String,
    pub symlink_to_public: bool,
    pub version_file: Option<VersionFile>,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            source_path: "css".to_string(),
            compiler: CompilerConfig::named("roosevelt-minify"),
            whitelist: None,
            output: ".build/css".to_string(),
            symlink_to_public: true,
            version_file: None,
        }
    }
}

/// A generated CSS file exposing the app version as a custom property.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFile {
    pub file_name: String,
    pub var_name: String,
}

/// JS pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsConfig {
    pub source_path: String,
    pub compiler: CompilerConfig,
    pub whitelist: Option<Vec<String>>,
    /// Files never compiled.
    pub blacklist: Option<Vec<String>>,
    pub output: String,
    pub symlink_to_public: bool,
    pub bundler: BundlerConfig,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            source_path: "js".to_string(),
            compiler: CompilerConfig::named("roosevelt-minify"),
            whitelist: None,
            blacklist: None,
            output: ".build/js".to_string(),
            symlink_to_public: true,
            bundler: BundlerConfig::default(),
        }
    }
}

/// JS bundle settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BundlerConfig {
    pub bundles: Vec<Bundle>,
    /// Bundle folder under the JS output folder.
    pub output: String,
    /// Write bundles where the public folder can reach them.
    pub expose: bool,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            bundles: Vec::new(),
            output: ".bundled".to_string(),
            expose: true,
        }
    }
}

/// One JS bundle: source files concatenated into `output`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Bundle {
    pub files: Vec<String>,
    pub output: String,
}

/// Live reload settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendReloadConfig {
    pub enable: bool,
    pub port: u16,
    pub verbose: bool,
}

impl Default for FrontendReloadConfig {
    fn default() -> Self {
        Self {
            enable: true,
            port: 9856,
            verbose: false,
        }
    }
}

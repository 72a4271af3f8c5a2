//! Startup orchestration.
//!
//! # Responsibilities
//! - Audit the project and load its configuration
//! - Scaffold folders and build assets
//! - Bind listeners, start dev tooling, serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, except a validator that will
//!   not start, which only costs validation
//! - Listeners bind before anything is spawned, so port contention aborts
//!   a start cleanly

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::assets::{build_assets, AssetError, AssetReport, Compiler, CompilerRegistry};
use crate::audit::sink::TracingSink;
use crate::audit::{AuditOutcome, Auditor};
use crate::config::loader::{load_config, ConfigError, Overrides};
use crate::config::manifest::Manifest;
use crate::config::schema::AppConfig;
use crate::http::{HttpServer, Listeners};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::{bind, bind_ip, load_tls_config, ListenerError, TlsError};
use crate::reload::{self, ReloadWatcher};
use crate::scaffold::{self, ScaffoldError};
use crate::validator::{self, ValidatorError, ValidatorHandle, ValidatorLayerState};

/// Version used when the manifest has none.
const UNVERSIONED: &str = "0.0.0";

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),

    #[error(transparent)]
    Assets(#[from] AssetError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Validator(#[from] ValidatorError),

    #[error("failed to watch assets: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Configures an [`App`] before initialization.
pub struct AppBuilder {
    root: PathBuf,
    params: Option<Value>,
    overrides: Overrides,
    router: Router,
    compilers: CompilerRegistry,
}

impl AppBuilder {
    /// Configuration that overrides the manifest's `rooseveltConfig`.
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Command line overrides.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The application's routes.
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Make a compiler available to `css.compiler.module` / `js.compiler.module`.
    pub fn compiler(mut self, name: impl Into<String>, compiler: impl Compiler + 'static) -> Self {
        self.compilers.register(name, compiler);
        self
    }

    /// Audit, configure, scaffold, and build assets.
    pub fn init(self) -> Result<App, StartupError> {
        let root = self.root;
        let manifest = Manifest::load(&root)?;

        let audit = Auditor::with_defaults().audit_project(Some(root.clone()), &mut TracingSink);
        let config = load_config(&root, manifest.as_ref(), self.params.as_ref(), &self.overrides)?;

        let version = manifest
            .as_ref()
            .map(|m| m.version_or_default().to_string())
            .unwrap_or_else(|| UNVERSIONED.to_string());

        scaffold::generate(&root, &config, &version)?;
        let assets = build_assets(&root, &config, &version, &self.compilers)?;

        tracing::info!(
            app = manifest.as_ref().and_then(|m| m.name.as_deref()).unwrap_or("app"),
            version = %version,
            mode = ?config.mode,
            assets_written = assets.written.len(),
            "Initialized"
        );

        Ok(App {
            root,
            config,
            version,
            router: self.router,
            audit,
            assets,
        })
    }
}

/// An initialized application.
pub struct App {
    root: PathBuf,
    config: AppConfig,
    version: String,
    router: Router,
    audit: AuditOutcome,
    assets: AssetReport,
}

impl App {
    pub fn builder(root: impl Into<PathBuf>) -> AppBuilder {
        AppBuilder {
            root: root.into(),
            params: None,
            overrides: Overrides::default(),
            router: Router::new(),
            compilers: CompilerRegistry::with_builtins(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn audit(&self) -> &AuditOutcome {
        &self.audit
    }

    pub fn assets(&self) -> &AssetReport {
        &self.assets
    }

    /// Bind listeners and serve until `shutdown` fires. A process spawned
    /// as a detached validator host runs the host instead.
    pub async fn serve(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        if let Some(exit) = validator::run_host_if_requested(&self.config, shutdown.subscribe()).await {
            let exit = exit?;
            tracing::debug!(?exit, "Validator host finished");
            return Ok(());
        }

        let config = &self.config;
        let ip = bind_ip(config.localhost_only);

        let mut listeners = Listeners::default();
        if config.http_enabled() {
            listeners.http = Some(bind(SocketAddr::new(ip, config.port), "port")?);
        }
        if config.https.enable {
            let listener = bind(SocketAddr::new(ip, config.https.port), "https.port")?;
            let tls = load_tls_config(&self.root, &config.https).await?;
            listeners.https = Some((listener, tls));
        }
        let reload_listener = if !config.is_production() && config.frontend_reload.enable {
            let addr = SocketAddr::new(ip, config.frontend_reload.port);
            Some(TcpListener::from_std(bind(addr, "frontendReload.port")?)?)
        } else {
            None
        };

        let mut validator = None;
        let mut validator_layer = None;
        if config.validator_active() {
            validator_layer = Some(ValidatorLayerState::new(&config.html_validator)?);
            match ValidatorHandle::start(&self.root, &config.html_validator, config.port).await {
                Ok(handle) => validator = Some(handle),
                Err(err) => tracing::warn!(error = %err, "HTML validator not started, pages will not be validated"),
            }
        }

        let reload = match reload_listener {
            Some(listener) => {
                let (events, _) = broadcast::channel(64);
                let watched = vec![
                    self.root.join(&config.public_folder),
                    self.root.join(&config.css.output),
                    self.root.join(&config.js.output),
                ];
                let watcher = ReloadWatcher::new(watched, events.clone()).run()?;
                let task = tokio::spawn(reload::serve(
                    listener,
                    config.frontend_reload.verbose,
                    events,
                    shutdown.subscribe(),
                ));
                Some((watcher, task))
            }
            None => None,
        };

        let server = HttpServer::new(&self.root, config, self.router, validator_layer);
        let result = server.run(listeners, shutdown.subscribe()).await;

        // Wake the remaining tasks if the server stopped on its own.
        shutdown.trigger();
        if let Some((watcher, task)) = reload {
            drop(watcher);
            match task.await {
                Ok(Err(err)) => tracing::warn!(error = %err, "Live reload server failed"),
                Err(err) => tracing::warn!(error = %err, "Live reload task panicked"),
                Ok(Ok(())) => {}
            }
        }
        if let Some(validator) = validator {
            validator.stop().await;
        }

        result?;
        tracing::info!("Shutdown complete");
        Ok(())
    }
}

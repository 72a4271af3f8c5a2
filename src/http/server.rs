//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application's router with framework middleware
//!   (request id, access logs, HTML validation)
//! - Serve the public folder when configured to
//! - Run HTTP and HTTPS listeners until shutdown, then drain

use std::io;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware::from_fn_with_state, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::schema::AppConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::validator::middleware::{validate_html, ValidatorLayerState};

/// Bound listeners to serve on.
#[derive(Debug, Default)]
pub struct Listeners {
    pub http: Option<TcpListener>,
    pub https: Option<(TcpListener, RustlsConfig)>,
}

/// The application's HTTP front.
pub struct HttpServer {
    router: Router,
    shutdown_timeout: Duration,
}

impl HttpServer {
    /// Wrap `app` with framework middleware for `config`.
    pub fn new(root: &Path, config: &AppConfig, app: Router, validator: Option<ValidatorLayerState>) -> Self {
        Self {
            router: Self::build_router(root, config, app, validator),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout),
        }
    }

    fn build_router(root: &Path, config: &AppConfig, app: Router, validator: Option<ValidatorLayerState>) -> Router {
        let mut router = app;

        if !config.is_production() || config.always_host_public {
            let public = root.join(&config.public_folder);
            tracing::debug!(path = %public.display(), "Hosting public folder");
            router = router.fallback_service(ServeDir::new(public));
        }

        if let Some(state) = validator {
            router = router.layer(from_fn_with_state(state, validate_html));
        }

        if config.logging.methods.http {
            router = router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = request.request_id().unwrap_or("-"),
                )
            }));
        }

        // Outermost, so ids exist before the trace span is made.
        router
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The wrapped router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then wait up to the shutdown timeout
    /// for open requests.
    pub async fn run(self, listeners: Listeners, mut shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        let handle = Handle::new();
        let timeout = self.shutdown_timeout;
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(timeout_ms = timeout.as_millis() as u64, "Draining connections");
            drain.graceful_shutdown(Some(timeout));
        });

        let http = {
            let handle = handle.clone();
            let app = self.router.clone();
            async move {
                match listeners.http {
                    Some(listener) => {
                        tracing::info!(address = %listener.local_addr()?, "HTTP server listening");
                        axum_server::from_tcp(listener)
                            .handle(handle)
                            .serve(app.into_make_service())
                            .await
                    }
                    None => Ok(()),
                }
            }
        };
        let https = {
            let app = self.router;
            async move {
                match listeners.https {
                    Some((listener, tls)) => {
                        tracing::info!(address = %listener.local_addr()?, "HTTPS server listening");
                        axum_server::from_tcp_rustls(listener, tls)
                            .handle(handle)
                            .serve(app.into_make_service())
                            .await
                    }
                    None => Ok(()),
                }
            }
        };

        tokio::try_join!(http, https)?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Mode;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public/robots.txt"), "User-agent: *").unwrap();
        dir
    }

    fn app() -> Router {
        Router::new().route("/", get(|| async { "home" }))
    }

    async fn get_status(router: Router, uri: &str) -> (StatusCode, Option<String>) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response
            .headers()
            .get("x-request-id")
            .map(|v| v.to_str().unwrap().to_string());
        (response.status(), id)
    }

    #[tokio::test]
    async fn development_serves_public_folder() {
        let dir = project();
        let server = HttpServer::new(dir.path(), &AppConfig::default(), app(), None);

        let (status, id) = get_status(server.router(), "/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert!(uuid::Uuid::parse_str(&id.unwrap()).is_ok());
        assert_eq!(get_status(server.router(), "/").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn production_hides_public_folder_unless_asked() {
        let dir = project();
        let mut config = AppConfig::default();
        config.mode = Mode::Production;

        let server = HttpServer::new(dir.path(), &config, app(), None);
        assert_eq!(get_status(server.router(), "/robots.txt").await.0, StatusCode::NOT_FOUND);

        config.always_host_public = true;
        let server = HttpServer::new(dir.path(), &config, app(), None);
        assert_eq!(get_status(server.router(), "/robots.txt").await.0, StatusCode::OK);
    }
}

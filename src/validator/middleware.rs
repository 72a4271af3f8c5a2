//! Response middleware that validates outgoing HTML.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::schema::HtmlValidatorConfig;
use crate::validator::client::{ValidationMessage, ValidatorClient};
use crate::validator::ValidatorError;

/// Largest page buffered for validation.
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

/// Shared middleware state.
#[derive(Debug, Clone)]
pub struct ValidatorLayerState {
    client: Arc<ValidatorClient>,
    exception_header: HeaderName,
    show_warnings: bool,
    max_bytes: usize,
}

impl ValidatorLayerState {
    pub fn new(config: &HtmlValidatorConfig) -> Result<Self, ValidatorError> {
        let exception_header = HeaderName::from_bytes(config.exceptions.request_header.as_bytes())
            .map_err(|_| ValidatorError::InvalidHeader(config.exceptions.request_header.clone()))?;
        Ok(Self {
            client: Arc::new(ValidatorClient::new(config.port)?),
            exception_header,
            show_warnings: config.show_warnings,
            max_bytes: MAX_HTML_BYTES,
        })
    }

    /// Pages larger than `max_bytes`, or of unknown length, skip validation.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Validate `text/html` responses and log what the validator reports.
/// The response body always reaches the client unchanged.
pub async fn validate_html(State(state): State<ValidatorLayerState>, request: Request, next: Next) -> Response {
    let exempt = request.headers().contains_key(&state.exception_header);
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if exempt || !is_html(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= state.max_bytes as u64);
    if !fits {
        tracing::warn!(
            path = %path,
            limit = state.max_bytes,
            "HTML response too large or unbounded, page not validated"
        );
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, state.max_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(path = %path, error = %err, "Failed to buffer HTML response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.client.validate(String::from_utf8_lossy(&bytes).into_owned()).await {
        Ok(messages) => {
            report(&path, &messages, state.show_warnings);
        }
        Err(err) => tracing::warn!(
            path = %path,
            url = state.client.url(),
            error = %err,
            "HTML validator unreachable, page not validated"
        ),
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// Log findings. Returns how many were logged.
fn report(path: &str, messages: &[ValidationMessage], show_warnings: bool) -> usize {
    let mut logged = 0;
    for message in messages {
        if message.is_error() {
            tracing::error!(target: "roosevelt::validator", path, "{message}");
            logged += 1;
        } else if show_warnings && message.is_warning() {
            tracing::warn!(target: "roosevelt::validator", path, "{message}");
            logged += 1;
        }
    }
    if logged == 0 {
        tracing::info!(target: "roosevelt::validator", path, "HTML is valid");
    }
    logged
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn_with_state, response::Html, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    async fn mock_validator(calls: Arc<AtomicUsize>) -> u16 {
        let app = Router::new().route(
            "/",
            axum::routing::post(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    axum::Json(serde_json::json!({
                        "messages": [{ "type": "error", "message": "Element title is missing" }]
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        port
    }

    fn app(port: u16) -> Router {
        app_with_limit(port, MAX_HTML_BYTES)
    }

    fn app_with_limit(port: u16, max_bytes: usize) -> Router {
        let mut config = HtmlValidatorConfig::default();
        config.port = port;
        let state = ValidatorLayerState::new(&config).unwrap().with_max_bytes(max_bytes);
        Router::new()
            .route("/", get(|| async { Html("<p>hi") }))
            .route("/plain", get(|| async { "not html" }))
            .layer(from_fn_with_state(state, validate_html))
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn html_is_validated_and_passed_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let port = mock_validator(calls.clone()).await;

        let response = app(port)
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "<p>hi");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exempt_and_non_html_responses_skip_validation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let port = mock_validator(calls.clone()).await;

        let partial = axum::http::Request::get("/").header("Partial", "1").body(Body::empty()).unwrap();
        app(port).oneshot(partial).await.unwrap();
        app(port)
            .oneshot(axum::http::Request::get("/plain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_validator_is_not_fatal() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let response = app(port)
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "<p>hi");
    }

    #[tokio::test]
    async fn oversized_page_skips_validation_untouched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let port = mock_validator(calls.clone()).await;

        let response = app_with_limit(port, 2)
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "<p>hi");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn warnings_respect_setting() {
        let messages = vec![ValidationMessage {
            kind: "info".into(),
            sub_type: Some("warning".into()),
            message: "w".into(),
            last_line: None,
            last_column: None,
        }];
        assert_eq!(report("/", &messages, true), 1);
        assert_eq!(report("/", &messages, false), 0);
    }
}

//! Client for the validator web service.

use std::time::Duration;

use serde::Deserialize;

use crate::validator::ValidatorError;

/// One finding reported by the validator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub last_line: Option<u32>,
    #[serde(default)]
    pub last_column: Option<u32>,
}

impl ValidationMessage {
    pub fn is_error(&self) -> bool {
        matches!(self.kind.as_str(), "error" | "non-document-error")
    }

    pub fn is_warning(&self) -> bool {
        self.kind == "info" && self.sub_type.as_deref() == Some("warning")
    }

    fn location(&self) -> String {
        match (self.last_line, self.last_column) {
            (Some(line), Some(column)) => format!("{line}:{column}"),
            (Some(line), None) => line.to_string(),
            _ => "-".to_string(),
        }
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.location(), self.message)
    }
}

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    #[serde(default)]
    messages: Vec<ValidationMessage>,
}

/// Posts documents to `http://localhost:<port>/?out=json`.
#[derive(Debug, Clone)]
pub struct ValidatorClient {
    http: reqwest::Client,
    url: String,
}

impl ValidatorClient {
    pub fn new(port: u16) -> Result<Self, ValidatorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ValidatorError::Client)?;
        Ok(Self {
            http,
            url: format!("http://localhost:{port}/?out=json"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validate an HTML document.
    pub async fn validate(&self, html: String) -> Result<Vec<ValidationMessage>, ValidatorError> {
        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(html)
            .send()
            .await
            .map_err(ValidatorError::Client)?
            .error_for_status()
            .map_err(ValidatorError::Client)?;
        let parsed: ValidationResponse = response.json().await.map_err(ValidatorError::Client)?;
        Ok(parsed.messages)
    }
}

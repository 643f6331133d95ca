use anyhow::Result;
use newsroom_common::Error as CommonError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::types::*;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) struct ClaudeClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/messages", self.base_url);

        debug!(model = %request.model, "Claude chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport(e, "Claude chat request"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(classify_status(status, "Claude API error", error_text));
        }

        Ok(response.json().await?)
    }
}

/// Turns a vendor HTTP failure into the retryable/fatal distinction the
/// retry wrapper dispatches on, instead of leaving callers to string-match
/// the error message.
fn classify_status(status: reqwest::StatusCode, context: &str, body: String) -> anyhow::Error {
    let message = format!("{context} ({status}): {body}");
    if status.as_u16() == 429 {
        CommonError::RateLimited(message).into()
    } else if status.is_server_error() {
        CommonError::Transient(message).into()
    } else {
        CommonError::Schema(message).into()
    }
}

fn classify_transport(e: reqwest::Error, context: &str) -> anyhow::Error {
    if e.is_timeout() || e.is_connect() {
        CommonError::Transient(format!("{context}: {e}")).into()
    } else {
        anyhow::anyhow!("{context}: {e}")
    }
}

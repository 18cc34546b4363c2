// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart client with classified errors and a bounded retry loop

use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use super::observer::AttemptObserver;
use super::types::{snippet, ClassifiedError, ServiceResponse};
use crate::config::ClientConfig;
use crate::vision::RequestPayload;

/// Multipart field carrying the JPEG
pub const IMAGE_PART: &str = "image";
/// Multipart field carrying the prompt text
pub const PROMPT_PART: &str = "prompt";
pub const IMAGE_FILE_NAME: &str = "form.jpg";
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Client for the structured-extraction service
///
/// Holds only the connection pool; every call takes its configuration
/// explicitly, so one client can serve concurrent calls to different endpoints.
#[derive(Debug, Clone)]
pub struct SchemaClient {
    client: Client,
}

impl SchemaClient {
    /// Create a new client with its own connection pool
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Reuse an existing `reqwest::Client`
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Send a built payload
    pub async fn send(
        &self,
        config: &ClientConfig,
        payload: &RequestPayload,
        observer: &dyn AttemptObserver,
    ) -> Result<ServiceResponse, ClassifiedError> {
        debug!("Submitting form {}", payload.form_id());
        self.call(config, payload.image_jpeg(), payload.prompt(), observer)
            .await
    }

    /// Post the image and prompt, retrying transient failures
    ///
    /// Attempts run sequentially with no delay between them. Terminal
    /// classifications return immediately.
    pub async fn call(
        &self,
        config: &ClientConfig,
        image_jpeg: &[u8],
        prompt: &str,
        observer: &dyn AttemptObserver,
    ) -> Result<ServiceResponse, ClassifiedError> {
        let endpoint = check_endpoint(&config.endpoint)?;
        let max_attempts = config.effective_attempts();
        info!(
            "Schema client configured: endpoint={}, timeout={}s, max_attempts={}",
            endpoint,
            config.timeout.as_secs_f32(),
            max_attempts
        );

        let mut attempt = 1;
        loop {
            observer.on_attempt(attempt, max_attempts);
            info!("Sending request (attempt {}/{})", attempt, max_attempts);

            match self
                .attempt(config, &endpoint, image_jpeg, prompt, attempt)
                .await
            {
                Ok(response) => {
                    info!("✅ Response received after {} attempt(s)", attempt);
                    return Ok(response);
                }
                Err(e) if e.is_retryable_kind() && attempt < max_attempts => {
                    warn!("⚠️ Attempt {}/{} failed, retrying: {}", attempt, max_attempts, e);
                    attempt += 1;
                }
                Err(e) => {
                    warn!("❌ Request failed on attempt {}/{}: {}", attempt, max_attempts, e);
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(
        &self,
        config: &ClientConfig,
        endpoint: &str,
        image_jpeg: &[u8],
        prompt: &str,
        attempt: u32,
    ) -> Result<ServiceResponse, ClassifiedError> {
        let form = build_form(image_jpeg, prompt, attempt)?;

        let mut request = self
            .client
            .post(endpoint)
            .timeout(config.timeout)
            .multipart(form);
        if let Some(token) = config.auth_token.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(key) = config.api_key.as_deref() {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport(&e, endpoint, attempt))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // The status decides the outcome; an unreadable error body only loses the snippet.
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Could not read HTTP {} body: {}", status, e);
                String::new()
            });
            return Err(status_error(status, &body, attempt));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport(&e, endpoint, attempt))?;
        debug!("HTTP {} with {} byte body", status, body.len());
        parse_success(&body, content_type, attempt)
    }
}

fn check_endpoint(endpoint: &str) -> Result<String, ClassifiedError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ClassifiedError::InvalidConfig(
            "endpoint must not be empty".to_string(),
        ));
    }
    Url::parse(endpoint).map_err(|e| {
        ClassifiedError::InvalidConfig(format!("invalid endpoint '{}': {}", endpoint, e))
    })?;
    Ok(endpoint.to_string())
}

// A fresh form per attempt: multipart bodies are consumed on send.
fn build_form(image_jpeg: &[u8], prompt: &str, attempt: u32) -> Result<Form, ClassifiedError> {
    let image = Part::bytes(image_jpeg.to_vec())
        .file_name(IMAGE_FILE_NAME)
        .mime_str("image/jpeg")
        .map_err(|e| ClassifiedError::RequestFailed {
            attempts: attempt,
            message: e.to_string(),
        })?;

    Ok(Form::new()
        .part(IMAGE_PART, image)
        .text(PROMPT_PART, prompt.to_string()))
}

/// Classify a transport-level failure; always retryable
pub fn classify_transport(err: &reqwest::Error, endpoint: &str, attempt: u32) -> ClassifiedError {
    if err.is_timeout() {
        ClassifiedError::Timeout { attempts: attempt }
    } else if err.is_connect() {
        ClassifiedError::ConnectionFailure {
            endpoint: endpoint.to_string(),
            attempts: attempt,
            message: err.to_string(),
        }
    } else {
        ClassifiedError::RequestFailed {
            attempts: attempt,
            message: err.to_string(),
        }
    }
}

/// Classify a response status; `None` for 2xx
pub fn classify_status(status: StatusCode, body: &str, attempt: u32) -> Option<ClassifiedError> {
    if status.is_success() {
        return None;
    }
    Some(status_error(status, body, attempt))
}

fn status_error(status: StatusCode, body: &str, attempt: u32) -> ClassifiedError {
    let body = snippet(body);
    match status {
        StatusCode::UNAUTHORIZED => ClassifiedError::AuthenticationFailed {
            attempts: attempt,
            body,
        },
        StatusCode::FORBIDDEN => ClassifiedError::Forbidden {
            attempts: attempt,
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => ClassifiedError::RateLimited {
            attempts: attempt,
            body,
        },
        s if s.is_server_error() => ClassifiedError::ServerError {
            status: s.as_u16(),
            attempts: attempt,
            body,
        },
        s => ClassifiedError::ClientError {
            status: s.as_u16(),
            attempts: attempt,
            body,
        },
    }
}

/// Parse a 2xx body as JSON
pub fn parse_success(
    body: &str,
    content_type: Option<String>,
    attempt: u32,
) -> Result<ServiceResponse, ClassifiedError> {
    if !content_type.as_deref().is_some_and(|ct| ct.contains("json")) {
        warn!(
            "⚠️ Unexpected content type: {}",
            content_type.as_deref().unwrap_or("<none>")
        );
    }

    let parsed = serde_json::from_str(body).map_err(|e| ClassifiedError::MalformedResponse {
        attempts: attempt,
        reason: e.to_string(),
        body: snippet(body),
    })?;

    Ok(ServiceResponse {
        body: parsed,
        attempts: attempt,
        content_type,
    })
}

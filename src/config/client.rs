// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the structured-extraction service client

use std::fmt;
use std::time::Duration;
use url::Url;

use super::{env_non_empty, env_parse};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/vision";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Per-call client configuration
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Service URL the form is posted to
    pub endpoint: String,
    /// Bearer token for the `Authorization` header
    pub auth_token: Option<String>,
    /// Key for the `X-API-Key` header
    pub api_key: Option<String>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Total attempts, including the first
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_token: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for an endpoint with default limits
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            endpoint: env_non_empty("VISION_LLM_API_URL")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            auth_token: env_non_empty("VISION_LLM_AUTH_TOKEN"),
            api_key: env_non_empty("VISION_LLM_API_KEY"),
            timeout: Duration::from_secs(env_parse("API_TIMEOUT", DEFAULT_TIMEOUT_SECS)),
            max_retries: env_parse("API_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        }
    }

    /// Attempts the retry loop will make; zero is treated as one
    pub fn effective_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err("Endpoint must not be empty".to_string());
        }

        let url = Url::parse(endpoint)
            .map_err(|e| format!("Invalid endpoint '{}': {}", endpoint, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Endpoint scheme must be http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.max_retries == 0 {
            return Err("Max retries must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Human-readable summary with secrets masked
    pub fn summary(&self) -> String {
        format!(
            "API URL: {}\nAuth Token: {}\nAPI Key: {}\nTimeout: {}s\nMax Retries: {}",
            self.endpoint,
            mask_secret(self.auth_token.as_deref()),
            mask_secret(self.api_key.as_deref()),
            self.timeout.as_secs(),
            self.max_retries
        )
    }
}

// Secrets never reach log output through `{:?}`.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &mask_secret(self.auth_token.as_deref()))
            .field("api_key", &mask_secret(self.api_key.as_deref()))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Mask a secret as `***` plus its last four characters
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => {
            let chars: Vec<char> = s.chars().collect();
            let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("***{}", tail)
        }
        _ => "Not set".to_string(),
    }
}

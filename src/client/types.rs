// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Response and error types for the structured-extraction service

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest body excerpt kept on an error
pub const BODY_SNIPPET_CHARS: usize = 500;

/// A parsed, successful service response
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    /// Parsed JSON body
    pub body: serde_json::Value,
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Declared content type, if any
    pub content_type: Option<String>,
}

impl ServiceResponse {
    /// Typed view of the body when it matches the requested schema shape
    pub fn form_schema(&self) -> Option<FormSchemaDocument> {
        serde_json::from_value(self.body.clone()).ok()
    }

    /// Pretty-printed body for display or export
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.body.to_string())
    }
}

/// Top-level response document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchemaDocument {
    pub form_schema: FormSchema,
}

/// Extracted schema for one form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub form_id: String,
    #[serde(default)]
    pub sections: Vec<FormSection>,
}

/// A named group of fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSection {
    pub section_name: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// A single fillable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub field_name: String,
    pub data_type: String,
    pub bounding_box: [i64; 4],
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FormSchema {
    /// Total number of fields across all sections
    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }
}

/// Classified failure of a service call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifiedError {
    /// Request timed out on every attempt
    #[error("Request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// Could not connect on any attempt
    #[error("Could not connect to {endpoint} after {attempts} attempt(s): {message}")]
    ConnectionFailure {
        endpoint: String,
        attempts: u32,
        message: String,
    },

    /// Other transport failure on every attempt
    #[error("Request failed after {attempts} attempt(s): {message}")]
    RequestFailed { attempts: u32, message: String },

    /// 429 on every attempt
    #[error("Rate limit exceeded after {attempts} attempt(s)")]
    RateLimited { attempts: u32, body: String },

    /// 5xx on every attempt
    #[error("Server error {status} after {attempts} attempt(s): {body}")]
    ServerError {
        status: u16,
        attempts: u32,
        body: String,
    },

    /// 401
    #[error("Authentication failed; check the API credentials")]
    AuthenticationFailed { attempts: u32, body: String },

    /// 403
    #[error("Access forbidden; check the API permissions")]
    Forbidden { attempts: u32, body: String },

    /// Any other 4xx
    #[error("HTTP error {status}: {body}")]
    ClientError {
        status: u16,
        attempts: u32,
        body: String,
    },

    /// 2xx with a body that is not valid JSON
    #[error("Invalid JSON response from service: {reason}")]
    MalformedResponse {
        attempts: u32,
        reason: String,
        body: String,
    },

    /// Rejected before any attempt was made
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClassifiedError {
    /// Attempts made before this error was returned
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts }
            | Self::ConnectionFailure { attempts, .. }
            | Self::RequestFailed { attempts, .. }
            | Self::RateLimited { attempts, .. }
            | Self::ServerError { attempts, .. }
            | Self::AuthenticationFailed { attempts, .. }
            | Self::Forbidden { attempts, .. }
            | Self::ClientError { attempts, .. }
            | Self::MalformedResponse { attempts, .. } => *attempts,
            Self::InvalidConfig(_) => 0,
        }
    }

    /// HTTP status code, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::AuthenticationFailed { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::ServerError { status, .. } | Self::ClientError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body excerpt, when one was received
    pub fn body_snippet(&self) -> Option<&str> {
        match self {
            Self::RateLimited { body, .. }
            | Self::ServerError { body, .. }
            | Self::AuthenticationFailed { body, .. }
            | Self::Forbidden { body, .. }
            | Self::ClientError { body, .. }
            | Self::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether this kind of failure is eligible for retry while attempts remain
    pub fn is_retryable_kind(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionFailure { .. }
                | Self::RequestFailed { .. }
                | Self::RateLimited { .. }
                | Self::ServerError { .. }
        )
    }
}

/// First `BODY_SNIPPET_CHARS` characters of a response body
pub fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

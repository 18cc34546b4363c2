// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for the structured-extraction service
//!
//! Posts a form image and prompt as multipart data and classifies every
//! failure. Transient failures are retried immediately up to the configured
//! attempt limit; terminal failures return at once.

pub mod observer;
pub mod schema_client;
pub mod types;

pub use observer::{AttemptObserver, NoopObserver};
pub use schema_client::{classify_status, classify_transport, parse_success, SchemaClient};
pub use types::{
    ClassifiedError, FormField, FormSchema, FormSchemaDocument, FormSection, ServiceResponse,
};

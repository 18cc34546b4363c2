// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scripted mock of the extraction service

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply: status, content type, body
#[derive(Clone, Copy)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'static str,
}

pub const SCHEMA_BODY: &str = r#"{"form_schema":{"form_id":"abc","sections":[{"section_name":"Personal Info","fields":[{"field_name":"Full Name","data_type":"string","bounding_box":[160,30,480,52],"required":true}]}]}}"#;

pub fn json(status: u16, body: &'static str) -> Reply {
    Reply {
        status,
        content_type: "application/json",
        body,
    }
}

pub fn text(status: u16, body: &'static str) -> Reply {
    Reply {
        status,
        content_type: "text/plain",
        body,
    }
}

/// What the service saw on one request
#[derive(Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct MockService {
    pub url: String,
    hits: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

#[derive(Clone)]
struct MockState {
    script: Arc<Vec<Reply>>,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockService {
    /// Serve `script` in order; the last reply repeats once the script runs out
    pub async fn start(script: Vec<Reply>) -> Self {
        Self::start_with_delay(script, Duration::ZERO).await
    }

    pub async fn start_with_delay(script: Vec<Reply>, delay: Duration) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            script: Arc::new(script),
            delay,
            hits: hits.clone(),
            captured: captured.clone(),
        };

        let app = Router::new()
            .route("/api/vision", post(handle))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/api/vision", addr),
            hits,
            captured,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

async fn handle(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let n = state.hits.fetch_add(1, Ordering::SeqCst);
    state.captured.lock().unwrap().push(Captured {
        headers,
        body: body.to_vec(),
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let reply = state.script[n.min(state.script.len() - 1)];
    (
        StatusCode::from_u16(reply.status).unwrap(),
        [(header::CONTENT_TYPE, reply.content_type)],
        reply.body,
    )
        .into_response()
}

/// An address nothing is listening on
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/vision", addr)
}

/// Service that answers `status` with a body cut short of its `Content-Length`
pub async fn truncated_body_service(status: &'static str) -> (String, Arc<AtomicUsize>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // A multipart request ends with the closing boundary (or a chunked terminator)
            while !request.ends_with(b"--\r\n") && !request.ends_with(b"0\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: 100\r\n\r\nshort",
                status
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.flush().await;
        }
    });

    (format!("http://{}/api/vision", addr), hits)
}

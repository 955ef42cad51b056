//! Test doubles shared by the fetch, engine, and coordinator tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use url::Url;

use crate::error::DownloadError;
use crate::transport::{Transport, TransportResponse};

/// One scripted response.
pub struct FakeResponse {
    pub status: u16,
    pub location: Option<String>,
    pub content_length: Option<u64>,
    pub chunks: Vec<Result<Bytes, DownloadError>>,
}

impl FakeResponse {
    /// A 200 response with a declared length and a single body chunk.
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status: 200,
            location: None,
            content_length: Some(body.len() as u64),
            chunks: vec![Ok(Bytes::copy_from_slice(body))],
        }
    }

    /// A 200 response without a Content-Length header.
    pub fn ok_unsized(body: &[u8]) -> Self {
        Self {
            content_length: None,
            ..Self::ok(body)
        }
    }

    /// A redirect to `location`.
    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            location: Some(location.to_string()),
            content_length: None,
            chunks: Vec::new(),
        }
    }

    /// A bare status response (e.g. 404).
    pub fn status(status: u16) -> Self {
        Self {
            status,
            location: None,
            content_length: None,
            chunks: Vec::new(),
        }
    }

    /// A 200 response whose body fails partway through the transfer.
    pub fn interrupted(prefix: &[u8], declared_total: u64) -> Self {
        Self {
            status: 200,
            location: None,
            content_length: Some(declared_total),
            chunks: vec![
                Ok(Bytes::copy_from_slice(prefix)),
                Err(DownloadError::Network {
                    message: "connection reset by peer".to_string(),
                    status_code: None,
                }),
            ],
        }
    }
}

/// Transport serving scripted responses in FIFO order.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<FakeResponse>>,
    requested: Mutex<Vec<String>>,
    hits: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Introduce latency before each response, for concurrency tests.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push(&self, response: FakeResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Number of GET calls made.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, DownloadError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        let response = scripted.ok_or_else(|| DownloadError::Network {
            message: format!("no scripted response for {url}"),
            status_code: None,
        })?;

        Ok(TransportResponse {
            status: response.status,
            content_length: response.content_length,
            location: response.location,
            body: stream::iter(response.chunks).boxed(),
        })
    }
}

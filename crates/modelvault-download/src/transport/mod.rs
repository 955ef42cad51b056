//! Transport selection: two interchangeable HTTP stacks behind one trait.
//!
//! If no proxy environment variable is set, the default-configured native
//! client is used, deferring to platform-level network configuration. If
//! one is set, that explicit value is the stronger signal and a client with
//! the proxy wired in is used instead. Both implement the same protocol:
//! redirects are NOT followed by the client — the fetch layer owns the hop
//! loop so both transports share a single redirect policy, progress shape,
//! and temp-file discipline.

mod native;
mod proxied;

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use tracing::debug;
use url::Url;

use crate::error::DownloadError;

pub use native::NativeTransport;
pub use proxied::ProxiedTransport;

/// Environment variables consulted for explicit proxy configuration, in
/// precedence order.
const PROXY_ENV_VARS: [&str; 6] = [
    "HTTPS_PROXY",
    "https_proxy",
    "HTTP_PROXY",
    "http_proxy",
    "ALL_PROXY",
    "all_proxy",
];

/// One HTTP response, redirects unfollowed.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
    /// Raw `Location` header value on 3xx responses.
    pub location: Option<String>,
    /// The response body as a chunk stream.
    pub body: BoxStream<'static, Result<Bytes, DownloadError>>,
}

impl TransportResponse {
    /// Whether the status is a redirect.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Whether the status is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// One GET request against one URL. Implementations must not follow
/// redirects; the caller resolves `Location` itself.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and return the raw response.
    async fn get(&self, url: &Url) -> Result<TransportResponse, DownloadError>;
}

/// First proxy environment variable with a non-empty value, if any.
#[must_use]
pub fn proxy_from_env() -> Option<String> {
    PROXY_ENV_VARS.iter().find_map(|key| {
        env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Inspect the proxy environment once and pick the transport for a campaign.
pub fn select_transport() -> Result<Arc<dyn Transport>, DownloadError> {
    match proxy_from_env() {
        Some(proxy) => {
            debug!(proxy = %proxy, "proxy environment detected, using proxied transport");
            Ok(Arc::new(ProxiedTransport::new(&proxy)?))
        }
        None => {
            debug!("no proxy environment, using native transport");
            Ok(Arc::new(NativeTransport::new()?))
        }
    }
}

/// Shared reqwest-response adaptation used by both transports.
pub(crate) fn adapt_response(response: reqwest::Response) -> TransportResponse {
    use futures_util::StreamExt;

    let status = response.status().as_u16();
    let content_length = response.content_length();
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    TransportResponse {
        status,
        content_length,
        location,
        body: response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DownloadError::from))
            .boxed(),
    }
}

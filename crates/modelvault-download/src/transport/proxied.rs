//! Proxied transport: a client with an explicit proxy wired in.
//!
//! Used when a proxy environment variable is set. The explicit value is
//! treated as intentional user configuration and applied to all schemes.
//! Everything else matches the native transport: same connect timeout, same
//! disabled redirect following.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{Transport, TransportResponse, adapt_response};
use crate::error::DownloadError;

const USER_AGENT: &str = concat!("modelvault/", env!("CARGO_PKG_VERSION"));

/// Transport routing all requests through an explicit proxy.
pub struct ProxiedTransport {
    client: reqwest::Client,
}

impl ProxiedTransport {
    /// Build a client routing through `proxy_url` (http, https, or socks5).
    pub fn new(proxy_url: &str) -> Result<Self, DownloadError> {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| DownloadError::InvalidProxy {
            message: format!("{proxy_url}: {e}"),
        })?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .proxy(proxy)
            .build()
            .map_err(DownloadError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ProxiedTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, DownloadError> {
        let response = self.client.get(url.as_str()).send().await?;
        Ok(adapt_response(response))
    }
}

//! Native transport: the default-configured client.
//!
//! Used when no proxy environment variable is set. The client is built with
//! platform defaults so OS-level network configuration applies; the only
//! deviations are a connect timeout (no overall timeout — transfers are
//! multi-gigabyte) and disabled redirect following, which the fetch layer
//! implements itself.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{Transport, TransportResponse, adapt_response};
use crate::error::DownloadError;

const USER_AGENT: &str = concat!("modelvault/", env!("CARGO_PKG_VERSION"));

/// Transport backed by a default-configured reqwest client.
pub struct NativeTransport {
    client: reqwest::Client,
}

impl NativeTransport {
    /// Build the client.
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(DownloadError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for NativeTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, DownloadError> {
        let response = self.client.get(url.as_str()).send().await?;
        Ok(adapt_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_error() {
        assert!(NativeTransport::new().is_ok());
    }
}

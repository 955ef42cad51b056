//! HTTP adapter for the runtime config port.
//!
//! When the user changes model selections, the resolved absolute paths are
//! pushed to the local inference service so it can hot-swap without a
//! restart. The service being down is an expected state (it is launched
//! lazily), which is why the config store treats push failures as
//! non-fatal.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use modelvault_core::ports::{ModelPaths, RuntimeConfigPort, RuntimeError};

use crate::error::DownloadError;

/// Pushes model paths to the local inference service over HTTP.
pub struct HttpRuntimePush {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRuntimePush {
    /// Create a pusher targeting `base_url` (e.g. `http://127.0.0.1:8645`).
    pub fn new(base_url: &str) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(DownloadError::from)?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/config/models", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl RuntimeConfigPort for HttpRuntimePush {
    async fn push_model_paths(&self, paths: &ModelPaths) -> Result<(), RuntimeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(paths)
            .send()
            .await
            .map_err(|e| RuntimeError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RuntimeError::Unreachable(format!(
                "{} returned {status}",
                self.endpoint
            )));
        }

        debug!(endpoint = %self.endpoint, "pushed model paths to runtime");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized() {
        let push = HttpRuntimePush::new("http://127.0.0.1:8645/").unwrap();
        assert_eq!(push.endpoint, "http://127.0.0.1:8645/v1/config/models");
    }
}

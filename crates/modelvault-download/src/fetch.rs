//! Single-file fetch: redirect following, temp-file discipline, atomic
//! rename.
//!
//! The destination is written through a sibling `.downloading` file so the
//! final rename stays on one filesystem and is atomic: a partially
//! downloaded file is never visible at the final path, and concurrent
//! readers of the destination simply see "not yet present" until the rename
//! lands. On any failure the temp file is removed best-effort and the
//! original error propagates.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::DownloadError;
use crate::transport::{Transport, TransportResponse};

/// Maximum redirect hops before giving up.
pub const MAX_REDIRECTS: u8 = 10;

/// Suffix of the sibling temp file a transfer writes through.
pub const PART_SUFFIX: &str = ".downloading";

/// The sibling temp path for a destination.
#[must_use]
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map_or_else(|| std::ffi::OsString::from("download"), ToOwned::to_owned);
    name.push(PART_SUFFIX);
    dest.with_file_name(name)
}

/// Download `url` to `dest`.
///
/// `on_progress` is called per received chunk with the cumulative byte
/// count and the declared total, when the server sent one. Progress must
/// degrade to indeterminate — not fail — when the length is unknown.
pub async fn fetch_to_path(
    transport: &dyn Transport,
    url: &str,
    dest: &Path,
    on_progress: &mut (dyn FnMut(u64, Option<u64>) + Send),
) -> Result<(), DownloadError> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let response = follow_redirects(transport, parsed).await?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let part = part_path(dest);
    let result = write_stream(response, &part, dest, on_progress).await;
    if result.is_err() {
        // Secondary cleanup is best-effort; the transfer error wins.
        let _ = fs::remove_file(&part).await;
    }
    result
}

/// Resolve redirects up to the hop budget and return the final response.
async fn follow_redirects(
    transport: &dyn Transport,
    url: Url,
) -> Result<TransportResponse, DownloadError> {
    let original = url.clone();
    let mut current = url;
    let mut hops_left = MAX_REDIRECTS;

    loop {
        let response = transport.get(&current).await?;

        if response.is_redirect() {
            let location =
                response
                    .location
                    .as_deref()
                    .ok_or_else(|| DownloadError::Network {
                        message: format!(
                            "redirect status {} without a Location header",
                            response.status
                        ),
                        status_code: Some(response.status),
                    })?;

            if hops_left == 0 {
                return Err(DownloadError::TooManyRedirects {
                    url: original.to_string(),
                });
            }
            hops_left -= 1;

            // Location may be relative; resolve against the current URL.
            current = current
                .join(location)
                .map_err(|e| DownloadError::InvalidUrl {
                    url: location.to_string(),
                    reason: e.to_string(),
                })?;
            debug!(target_url = %current, hops_left, "following redirect");
            continue;
        }

        if response.is_success() {
            return Ok(response);
        }

        return Err(DownloadError::HttpStatus {
            status: response.status,
            url: current.to_string(),
        });
    }
}

/// Stream the body to the part file, then rename into place.
async fn write_stream(
    response: TransportResponse,
    part: &Path,
    dest: &Path,
    on_progress: &mut (dyn FnMut(u64, Option<u64>) + Send),
) -> Result<(), DownloadError> {
    let total = response.content_length;
    let mut body = response.body;

    let mut file = fs::File::create(part).await?;
    let mut received: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        received += chunk.len() as u64;
        on_progress(received, total);
    }

    file.flush().await?;
    drop(file);

    fs::rename(part, dest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeResponse, FakeTransport};

    async fn fetch(
        transport: &FakeTransport,
        url: &str,
        dest: &Path,
    ) -> Result<Vec<(u64, Option<u64>)>, DownloadError> {
        let mut seen = Vec::new();
        fetch_to_path(transport, url, dest, &mut |received, total| {
            seen.push((received, total));
        })
        .await?;
        Ok(seen)
    }

    #[tokio::test]
    async fn success_writes_destination_and_removes_part() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        transport.push(FakeResponse::ok(b"weights"));

        let progress = fetch(&transport, "https://models.example/model.gguf", &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"weights");
        assert!(!part_path(&dest).exists());
        assert_eq!(progress, vec![(7, Some(7))]);
    }

    #[tokio::test]
    async fn missing_length_reports_indeterminate_progress() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        transport.push(FakeResponse::ok_unsized(b"weights"));

        let progress = fetch(&transport, "https://models.example/model.gguf", &dest)
            .await
            .unwrap();
        assert_eq!(progress, vec![(7, None)]);
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn relative_redirect_resolves_against_current_url() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        transport.push(FakeResponse::redirect("/mirror/model.gguf"));
        transport.push(FakeResponse::ok(b"weights"));

        fetch(&transport, "https://models.example/a/b/model.gguf", &dest)
            .await
            .unwrap();

        assert_eq!(
            transport.requested(),
            vec![
                "https://models.example/a/b/model.gguf".to_string(),
                "https://models.example/mirror/model.gguf".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn interrupted_transfer_cleans_temp_and_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        transport.push(FakeResponse::interrupted(b"partial", 1024));

        let err = fetch(&transport, "https://models.example/model.gguf", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Network { .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn non_success_status_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        transport.push(FakeResponse::status(404));

        let err = fetch(&transport, "https://models.example/model.gguf", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::HttpStatus { status: 404, .. }));
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn eleven_redirects_exhaust_the_hop_budget() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        for i in 0..11 {
            transport.push(FakeResponse::redirect(&format!(
                "https://models.example/hop{i}"
            )));
        }

        let err = fetch(&transport, "https://models.example/start", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TooManyRedirects { .. }));
        // Initial request plus the full hop budget.
        assert_eq!(transport.hits(), 1 + usize::from(MAX_REDIRECTS));
        assert!(!part_path(&dest).exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn ten_redirects_still_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.gguf");
        let transport = FakeTransport::new();
        for i in 0..10 {
            transport.push(FakeResponse::redirect(&format!(
                "https://models.example/hop{i}"
            )));
        }
        transport.push(FakeResponse::ok(b"weights"));

        fetch(&transport, "https://models.example/start", &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"weights");
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/models/embed.gguf")),
            PathBuf::from("/models/embed.gguf.downloading")
        );
    }
}

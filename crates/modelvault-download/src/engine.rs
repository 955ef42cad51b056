//! The download engine: campaign orchestration over the transport layer.
//!
//! A campaign computes the missing set, downloads each asset strictly
//! sequentially (bounded resource usage and simple progress semantics win
//! over wall-clock speed), and emits progress events throughout. Any single
//! asset failure fails the whole campaign immediately; there is no
//! best-effort continuation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use modelvault_core::catalog::{AssetDescriptor, CatalogStore};
use modelvault_core::config::ConfigStore;
use modelvault_core::events::{DownloadEvent, DownloadEventSink};
use modelvault_core::paths::ensure_directory;
use modelvault_core::status::{StatusSummary, summarize};

use crate::error::{DownloadError, DownloadResult};
use crate::fetch::{fetch_to_path, part_path};
use crate::transport::{Transport, select_transport};

/// Emit a byte-count progress event at least every this many bytes when the
/// server did not declare a length.
const PROGRESS_STRIDE_BYTES: u64 = 8 * 1024 * 1024;

/// Downloads missing catalog assets and reports status.
pub struct DownloadEngine {
    catalog: Arc<CatalogStore>,
    config: Arc<ConfigStore>,
    sink: Arc<dyn DownloadEventSink>,
    root: PathBuf,
    transport_override: Option<Arc<dyn Transport>>,
}

impl DownloadEngine {
    /// Create an engine. The transport is chosen per campaign from the
    /// proxy environment.
    #[must_use]
    pub fn new(
        catalog: Arc<CatalogStore>,
        config: Arc<ConfigStore>,
        sink: Arc<dyn DownloadEventSink>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            config,
            sink,
            root: root.into(),
            transport_override: None,
        }
    }

    /// Pin the transport instead of selecting per campaign (tests, embedding).
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    /// The models root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the current readiness summary.
    ///
    /// Never fails: a broken catalog reads as zero assets with
    /// `ready = false` (no non-optional selection can be satisfied by an
    /// empty catalog only when something was selected; an empty selection
    /// over an empty catalog is vacuously ready, which only happens when
    /// the defaults are absent too).
    pub async fn get_status(&self) -> StatusSummary {
        if let Err(err) = ensure_directory(&self.root) {
            warn!(root = %self.root.display(), error = %err, "models root unavailable");
        }
        let catalog = self.catalog.load_or_empty().await;
        let config = self.config.get().await;
        summarize(&catalog, &config, &self.root)
    }

    /// Look up a descriptor by id.
    pub async fn descriptor(&self, id: &str) -> Option<AssetDescriptor> {
        self.catalog.load_or_empty().await.get(id).cloned()
    }

    /// Run one download campaign.
    ///
    /// The work set is every catalog entry that is absent on disk and,
    /// when a filter is given, named by it. An empty work set is success:
    /// a `completed` event is emitted and the summary returned — unless the
    /// catalog itself failed to load, in which case an `error` event citing
    /// the catalog path is emitted instead (the summary is still returned).
    pub async fn perform_download(&self, filter: Option<&[String]>) -> DownloadResult<StatusSummary> {
        ensure_directory(&self.root).map_err(|e| DownloadError::Io {
            kind: "models root".to_string(),
            message: e.to_string(),
        })?;

        let catalog = self.catalog.load_or_empty().await;
        let config = self.config.get().await;
        let summary = summarize(&catalog, &config, &self.root);

        let to_download: Vec<AssetDescriptor> = catalog
            .iter()
            .filter(|d| summary.asset(&d.id).is_some_and(|a| !a.exists))
            .filter(|d| filter.map_or(true, |ids| ids.iter().any(|id| *id == d.id)))
            .cloned()
            .collect();

        if to_download.is_empty() {
            if catalog.is_empty() {
                let err = DownloadError::CatalogUnavailable {
                    path: self.catalog.path().display().to_string(),
                };
                warn!(error = %err, "catalog empty, nothing to download");
                self.sink.emit(DownloadEvent::error(err.to_string(), None));
            } else {
                self.sink.emit(DownloadEvent::completed(
                    "All models are present",
                    Some(summary.assets.clone()),
                ));
            }
            return Ok(summary);
        }

        info!(count = to_download.len(), "starting download campaign");
        self.sink.emit(DownloadEvent::campaign_started(format!(
            "Downloading {} model(s)",
            to_download.len()
        )));

        let transport = self.campaign_transport()?;

        for descriptor in &to_download {
            if let Err(err) = self
                .download_descriptor(descriptor, transport.as_ref())
                .await
            {
                self.sink.emit(DownloadEvent::error(
                    format!("Failed to download {}: {err}", descriptor.label),
                    Some(descriptor.id.clone()),
                ));
                return Err(err);
            }

            let snapshot = summarize(&catalog, &config, &self.root);
            self.sink.emit(DownloadEvent::asset_downloaded(
                descriptor.id.clone(),
                format!("{} downloaded", descriptor.label),
                snapshot.assets,
            ));
        }

        let final_summary = summarize(&catalog, &config, &self.root);
        self.sink.emit(DownloadEvent::completed(
            "All models downloaded",
            Some(final_summary.assets.clone()),
        ));
        info!("download campaign complete");
        Ok(final_summary)
    }

    /// Download one descriptor through the temp-file discipline, emitting
    /// chunk-level progress events.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    async fn download_descriptor(
        &self,
        descriptor: &AssetDescriptor,
        transport: &dyn Transport,
    ) -> DownloadResult<()> {
        let dest = self.root.join(&descriptor.relative_path);
        debug!(id = %descriptor.id, url = %descriptor.url, dest = %dest.display(), "downloading asset");

        let sink = Arc::clone(&self.sink);
        let id = descriptor.id.clone();
        let label = descriptor.label.clone();
        let mut last_percent: Option<u8> = None;
        let mut last_stride: u64 = 0;

        let mut on_progress = move |received: u64, total: Option<u64>| match total {
            Some(total) if total > 0 => {
                let percent = ((received.saturating_mul(100)) / total).min(100) as u8;
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    sink.emit(DownloadEvent::transfer_progress(
                        id.clone(),
                        Some(percent),
                        format!("{label}: {percent}%"),
                    ));
                }
            }
            _ => {
                // No declared length: degrade to byte counts, throttled.
                if last_stride == 0 || received - last_stride >= PROGRESS_STRIDE_BYTES {
                    last_stride = received;
                    sink.emit(DownloadEvent::transfer_progress(
                        id.clone(),
                        None,
                        format!("{label}: {:.1} MiB", received as f64 / 1_048_576.0),
                    ));
                }
            }
        };

        fetch_to_path(transport, &descriptor.url, &dest, &mut on_progress).await
    }

    /// Force-delete an asset's file and any stray temp file. Best-effort:
    /// failures are logged, not propagated.
    pub async fn remove_asset_files(&self, descriptor: &AssetDescriptor) {
        let dest = self.root.join(&descriptor.relative_path);
        for path in [part_path(&dest), dest] {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "could not remove file before redownload");
                }
            }
        }
    }

    fn campaign_transport(&self) -> DownloadResult<Arc<dyn Transport>> {
        self.transport_override
            .clone()
            .map_or_else(select_transport, Ok)
    }
}

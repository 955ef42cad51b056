//! Campaign coordination: at most one download campaign at a time.
//!
//! Concurrent callers join the in-flight campaign instead of starting a
//! second one, and all of them observe the same result. The joiner's filter
//! is ignored while a campaign is running. `redownload` shares the same
//! guard: its delete-then-refetch unit waits out any running campaign and
//! then occupies the slot itself, so the force-delete can never unlink a
//! file another campaign is mid-transfer on.

use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use modelvault_core::status::StatusSummary;

use crate::engine::DownloadEngine;
use crate::error::{DownloadError, DownloadResult};

type SharedCampaign = Shared<BoxFuture<'static, Result<StatusSummary, DownloadError>>>;

/// Serializes download campaigns over one engine.
pub struct DownloadCoordinator {
    engine: Arc<DownloadEngine>,
    in_flight: Mutex<Option<SharedCampaign>>,
}

impl DownloadCoordinator {
    #[must_use]
    pub fn new(engine: Arc<DownloadEngine>) -> Self {
        Self {
            engine,
            in_flight: Mutex::new(None),
        }
    }

    /// The engine behind this coordinator.
    #[must_use]
    pub fn engine(&self) -> &Arc<DownloadEngine> {
        &self.engine
    }

    /// Current readiness summary; never touches the network.
    pub async fn status(&self) -> StatusSummary {
        self.engine.get_status().await
    }

    /// Download every missing asset (optionally restricted to `filter`).
    ///
    /// If a campaign is already running, awaits it and returns its result
    /// instead of starting another. The slot is cleared when the campaign
    /// settles, successfully or not, so a later call always runs a fresh
    /// campaign.
    pub async fn download_missing(
        &self,
        filter: Option<Vec<String>>,
    ) -> DownloadResult<StatusSummary> {
        let (campaign, started_here) = {
            let mut guard = self.in_flight.lock().expect("campaign slot poisoned");
            if let Some(active) = guard.as_ref() {
                debug!("joining in-flight download campaign");
                (active.clone(), false)
            } else {
                let engine = Arc::clone(&self.engine);
                let campaign: SharedCampaign =
                    async move { engine.perform_download(filter.as_deref()).await }
                        .boxed()
                        .shared();
                *guard = Some(campaign.clone());
                (campaign, true)
            }
        };

        let result = campaign.clone().await;

        if started_here {
            // Only clear the slot we populated; a campaign started after
            // ours settled must not be evicted.
            let mut guard = self.in_flight.lock().expect("campaign slot poisoned");
            if guard.as_ref().is_some_and(|active| active.ptr_eq(&campaign)) {
                *guard = None;
            }
        }

        result
    }

    /// Force a re-download of one asset: delete its file (and any stray
    /// temp file), then run a campaign filtered to that id.
    ///
    /// The delete and the refetch form one unit under the single-flight
    /// guard. A running campaign is awaited first; the delete only happens
    /// once this unit holds the slot.
    pub async fn redownload(&self, id: &str) -> DownloadResult<StatusSummary> {
        let descriptor =
            self.engine
                .descriptor(id)
                .await
                .ok_or_else(|| DownloadError::UnknownAsset {
                    id: id.to_string(),
                })?;

        let campaign = loop {
            let active = {
                let mut guard = self.in_flight.lock().expect("campaign slot poisoned");
                match guard.as_ref() {
                    Some(active) => active.clone(),
                    None => {
                        let engine = Arc::clone(&self.engine);
                        let descriptor = descriptor.clone();
                        let target = vec![id.to_string()];
                        let campaign: SharedCampaign = async move {
                            engine.remove_asset_files(&descriptor).await;
                            engine.perform_download(Some(target.as_slice())).await
                        }
                        .boxed()
                        .shared();
                        *guard = Some(campaign.clone());
                        break campaign;
                    }
                }
            };

            debug!("redownload waiting for the in-flight campaign to settle");
            let _ = active.clone().await;

            // The settled campaign may not have released the slot yet;
            // clear it here so the next iteration can claim it.
            let mut guard = self.in_flight.lock().expect("campaign slot poisoned");
            if guard.as_ref().is_some_and(|a| a.ptr_eq(&active)) {
                *guard = None;
            }
        };

        let result = campaign.clone().await;

        let mut guard = self.in_flight.lock().expect("campaign slot poisoned");
        if guard.as_ref().is_some_and(|a| a.ptr_eq(&campaign)) {
            *guard = None;
        }

        result
    }
}

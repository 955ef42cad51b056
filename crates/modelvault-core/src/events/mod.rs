//! Download progress events and the sink abstraction they flow through.
//!
//! Events are transient: they exist only on the sink's current listener set
//! and are never persisted. The UI is expected to re-render download
//! progress and the final "all ready" / "error" state from this stream
//! alone, so campaign-boundary events carry a full status snapshot.

mod sink;

use serde::{Deserialize, Serialize};

use crate::status::AssetStatus;

pub use sink::{DownloadEventSink, EventListener, ListenerSet, NoopSink, SubscriptionId};

/// Lifecycle state of a download event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Transfer in progress (campaign-level or per-asset).
    Downloading,
    /// Campaign finished successfully.
    Completed,
    /// Campaign failed.
    Error,
}

/// A transient progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadEvent {
    /// Lifecycle state.
    pub state: DownloadState,
    /// The asset this event concerns; `None` means campaign-level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Integer percentage; `None` when the remote did not report a length
    /// (indeterminate progress, never a stall).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    /// Human-readable message.
    pub message: String,
    /// Full status snapshot, attached at campaign boundaries so the UI can
    /// resync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<AssetStatus>>,
}

impl DownloadEvent {
    /// Campaign-start event at 0%.
    pub fn campaign_started(message: impl Into<String>) -> Self {
        Self {
            state: DownloadState::Downloading,
            asset_id: None,
            percent: Some(0),
            message: message.into(),
            statuses: None,
        }
    }

    /// Per-chunk transfer progress for one asset.
    pub fn transfer_progress(
        asset_id: impl Into<String>,
        percent: Option<u8>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            state: DownloadState::Downloading,
            asset_id: Some(asset_id.into()),
            percent,
            message: message.into(),
            statuses: None,
        }
    }

    /// One asset finished; carries a fresh status snapshot.
    pub fn asset_downloaded(
        asset_id: impl Into<String>,
        message: impl Into<String>,
        statuses: Vec<AssetStatus>,
    ) -> Self {
        Self {
            state: DownloadState::Downloading,
            asset_id: Some(asset_id.into()),
            percent: None,
            message: message.into(),
            statuses: Some(statuses),
        }
    }

    /// Campaign completed at 100%.
    pub fn completed(message: impl Into<String>, statuses: Option<Vec<AssetStatus>>) -> Self {
        Self {
            state: DownloadState::Completed,
            asset_id: None,
            percent: Some(100),
            message: message.into(),
            statuses,
        }
    }

    /// Campaign (or asset) failure.
    pub fn error(message: impl Into<String>, asset_id: Option<String>) -> Self {
        Self {
            state: DownloadState::Error,
            asset_id,
            percent: None,
            message: message.into(),
            statuses: None,
        }
    }
}

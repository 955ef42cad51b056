//! Download and redownload command handlers.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::progress::DownloadProgress;

/// Download every missing model file, or only the listed ids.
pub async fn download(ctx: &CliContext, ids: Vec<String>) -> Result<()> {
    let subscription = ctx.listeners.register(Arc::new(DownloadProgress::new()));

    let filter = if ids.is_empty() { None } else { Some(ids) };
    debug!(?filter, "starting download campaign");
    let result = ctx.coordinator.download_missing(filter).await;

    ctx.listeners.unregister(subscription);
    result?;
    Ok(())
}

/// Delete one asset's file and fetch it again.
pub async fn redownload(ctx: &CliContext, id: &str) -> Result<()> {
    let subscription = ctx.listeners.register(Arc::new(DownloadProgress::new()));

    let result = ctx.coordinator.redownload(id).await;

    ctx.listeners.unregister(subscription);
    result?;
    Ok(())
}

//! CLI bootstrap - the composition root.
//!
//! This is the only place where the stores, the event listener set, and the
//! download stack are wired together. Command handlers receive the composed
//! `CliContext` and delegate to it.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use modelvault_core::catalog::CatalogStore;
use modelvault_core::config::ConfigStore;
use modelvault_core::events::ListenerSet;
use modelvault_core::paths::{
    ModelsDirResolution, catalog_path, config_path, presets_path, resolve_models_dir,
};
use modelvault_core::ports::{NoopRuntime, RuntimeConfigPort};
use modelvault_download::{DownloadCoordinator, DownloadEngine, HttpRuntimePush};

/// Bootstrap options taken from the global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit models directory override.
    pub models_dir: Option<String>,
    /// Base URL of a running inference service to push config changes to.
    pub runtime_url: Option<String>,
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// The asset catalog store.
    pub catalog: Arc<CatalogStore>,
    /// The user config store.
    pub config: Arc<ConfigStore>,
    /// Listener set download progress flows through.
    pub listeners: Arc<ListenerSet>,
    /// Single-flight download coordinator.
    pub coordinator: Arc<DownloadCoordinator>,
    /// Where the models directory resolved to, and how.
    pub models_dir: ModelsDirResolution,
    /// Path of the preset catalog file.
    pub presets_file: std::path::PathBuf,
}

/// Bootstrap the CLI application.
pub fn bootstrap(options: &CliConfig) -> Result<CliContext> {
    let models_dir = resolve_models_dir(options.models_dir.as_deref())?;
    debug!(path = %models_dir.path.display(), source = ?models_dir.source, "resolved models directory");

    let catalog = Arc::new(CatalogStore::new(catalog_path()?));

    let runtime: Arc<dyn RuntimeConfigPort> = match options.runtime_url.as_deref() {
        Some(url) => Arc::new(HttpRuntimePush::new(url)?),
        None => Arc::new(NoopRuntime::new()),
    };
    let config = Arc::new(ConfigStore::with_runtime(
        config_path()?,
        Arc::clone(&catalog),
        &models_dir.path,
        runtime,
    ));

    let listeners = Arc::new(ListenerSet::new());
    let engine = DownloadEngine::new(
        Arc::clone(&catalog),
        Arc::clone(&config),
        Arc::clone(&listeners) as Arc<dyn modelvault_core::events::DownloadEventSink>,
        &models_dir.path,
    );

    Ok(CliContext {
        catalog,
        config,
        listeners,
        coordinator: Arc::new(DownloadCoordinator::new(Arc::new(engine))),
        models_dir,
        presets_file: presets_path()?,
    })
}

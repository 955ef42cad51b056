//! User configuration: active model per role plus tuning knobs.
//!
//! The config is created from built-in defaults on first run, merged with
//! the persisted override file, and mutated through a single partial-merge
//! setter that rewrites the whole file atomically. Persistence failures are
//! logged and swallowed; the in-memory config stays authoritative for the
//! process lifetime.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::catalog::{CatalogStore, ModelRole};
use crate::paths::write_atomic;
use crate::ports::{NoopRuntime, RuntimeConfigPort, resolve_model_paths};

/// Documented default descriptor id per role. Status computation falls back
/// to these when a config references an id missing from the catalog.
pub const DEFAULT_COMPLETION_MODEL: &str = "qwen3-4b-instruct";
pub const DEFAULT_VISION_MODEL: &str = "qwen2.5-vl-3b";
pub const DEFAULT_EMBEDDING_MODEL: &str = "embeddinggemma-300m";
pub const DEFAULT_RERANKER_MODEL: &str = "bge-reranker-v2-m3";
pub const DEFAULT_SPEECH_MODEL: &str = "whisper-large-v3-turbo";

/// The mutable user selection: one active descriptor id per role, plus
/// numeric/boolean tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Active completion model id.
    pub completion_model: String,
    /// Active vision model id.
    pub vision_model: String,
    /// Active embedding model id.
    pub embedding_model: String,
    /// Active reranker model id.
    pub reranker_model: String,
    /// Active speech-to-text model id.
    pub speech_model: String,

    /// Context window size in tokens.
    pub context_size: u64,
    /// Prompt processing batch size.
    pub batch_size: u32,
    /// Physical micro-batch size.
    pub ubatch_size: u32,
    /// Batch size for the embedding service.
    pub embedding_batch_size: u32,
    /// Minutes an idle model stays loaded before unloading.
    pub keep_alive_minutes: u32,
    /// Whether flash attention is enabled.
    pub flash_attention: bool,
    /// Whether missing selected models are fetched automatically at startup.
    pub auto_download: bool,
}

impl ModelConfig {
    /// Built-in defaults used on first run.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            reranker_model: DEFAULT_RERANKER_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            context_size: 8192,
            batch_size: 512,
            ubatch_size: 256,
            embedding_batch_size: 64,
            keep_alive_minutes: 10,
            flash_attention: true,
            auto_download: true,
        }
    }

    /// The configured id for a role.
    #[must_use]
    pub fn selection(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Completion => &self.completion_model,
            ModelRole::Vision => &self.vision_model,
            ModelRole::Embedding => &self.embedding_model,
            ModelRole::Reranker => &self.reranker_model,
            ModelRole::Speech => &self.speech_model,
        }
    }

    /// The documented fallback id for a role.
    #[must_use]
    pub const fn default_selection(role: ModelRole) -> &'static str {
        match role {
            ModelRole::Completion => DEFAULT_COMPLETION_MODEL,
            ModelRole::Vision => DEFAULT_VISION_MODEL,
            ModelRole::Embedding => DEFAULT_EMBEDDING_MODEL,
            ModelRole::Reranker => DEFAULT_RERANKER_MODEL,
            ModelRole::Speech => DEFAULT_SPEECH_MODEL,
        }
    }

    /// Shallow-merge a partial update into this config.
    pub fn merge(&mut self, update: &ModelConfigUpdate) {
        if let Some(ref id) = update.completion_model {
            self.completion_model.clone_from(id);
        }
        if let Some(ref id) = update.vision_model {
            self.vision_model.clone_from(id);
        }
        if let Some(ref id) = update.embedding_model {
            self.embedding_model.clone_from(id);
        }
        if let Some(ref id) = update.reranker_model {
            self.reranker_model.clone_from(id);
        }
        if let Some(ref id) = update.speech_model {
            self.speech_model.clone_from(id);
        }
        if let Some(size) = update.context_size {
            self.context_size = size;
        }
        if let Some(size) = update.batch_size {
            self.batch_size = size;
        }
        if let Some(size) = update.ubatch_size {
            self.ubatch_size = size;
        }
        if let Some(size) = update.embedding_batch_size {
            self.embedding_batch_size = size;
        }
        if let Some(minutes) = update.keep_alive_minutes {
            self.keep_alive_minutes = minutes;
        }
        if let Some(enabled) = update.flash_attention {
            self.flash_attention = enabled;
        }
        if let Some(enabled) = update.auto_download {
            self.auto_download = enabled;
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Partial config update. `None` fields are left unchanged by `merge`.
///
/// This is also the shape the persisted file is read back through, so a
/// config written by an older version (missing newer fields) merges cleanly
/// over the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfigUpdate {
    pub completion_model: Option<String>,
    pub vision_model: Option<String>,
    pub embedding_model: Option<String>,
    pub reranker_model: Option<String>,
    pub speech_model: Option<String>,
    pub context_size: Option<u64>,
    pub batch_size: Option<u32>,
    pub ubatch_size: Option<u32>,
    pub embedding_batch_size: Option<u32>,
    pub keep_alive_minutes: Option<u32>,
    pub flash_attention: Option<bool>,
    pub auto_download: Option<bool>,
}

/// Config validation error.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Context size must be between 512 and 1,000,000, got {0}")]
    InvalidContextSize(u64),

    #[error("Batch size must be between 1 and 8192, got {0}")]
    InvalidBatchSize(u32),

    #[error("Micro-batch size must be between 1 and the batch size ({max}), got {got}")]
    InvalidUbatchSize { got: u32, max: u32 },

    #[error("Embedding batch size must be between 1 and 2048, got {0}")]
    InvalidEmbeddingBatchSize(u32),

    #[error("Keep-alive must be at most 1440 minutes, got {0}")]
    InvalidKeepAlive(u32),

    #[error("Model id for role {role} cannot be empty")]
    EmptyModelId { role: ModelRole },
}

/// Validate config values.
pub fn validate_config(config: &ModelConfig) -> Result<(), ConfigError> {
    if !(512..=1_000_000).contains(&config.context_size) {
        return Err(ConfigError::InvalidContextSize(config.context_size));
    }
    if !(1..=8192).contains(&config.batch_size) {
        return Err(ConfigError::InvalidBatchSize(config.batch_size));
    }
    if config.ubatch_size == 0 || config.ubatch_size > config.batch_size {
        return Err(ConfigError::InvalidUbatchSize {
            got: config.ubatch_size,
            max: config.batch_size,
        });
    }
    if !(1..=2048).contains(&config.embedding_batch_size) {
        return Err(ConfigError::InvalidEmbeddingBatchSize(
            config.embedding_batch_size,
        ));
    }
    if config.keep_alive_minutes > 1440 {
        return Err(ConfigError::InvalidKeepAlive(config.keep_alive_minutes));
    }
    for role in ModelRole::ALL {
        if config.selection(role).trim().is_empty() {
            return Err(ConfigError::EmptyModelId { role });
        }
    }
    Ok(())
}

/// File-backed config store.
///
/// `set` performs: shallow merge → atomic whole-file rewrite → best-effort
/// push of resolved model paths to the dependent service → local
/// change notification through a watch channel.
pub struct ConfigStore {
    path: PathBuf,
    catalog: Arc<CatalogStore>,
    models_root: PathBuf,
    runtime: Arc<dyn RuntimeConfigPort>,
    state: RwLock<Option<ModelConfig>>,
    tx: watch::Sender<ModelConfig>,
}

impl ConfigStore {
    /// Create a store with a no-op runtime port.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        catalog: Arc<CatalogStore>,
        models_root: impl Into<PathBuf>,
    ) -> Self {
        Self::with_runtime(path, catalog, models_root, Arc::new(NoopRuntime::new()))
    }

    /// Create a store that pushes config changes through the given runtime port.
    #[must_use]
    pub fn with_runtime(
        path: impl Into<PathBuf>,
        catalog: Arc<CatalogStore>,
        models_root: impl Into<PathBuf>,
        runtime: Arc<dyn RuntimeConfigPort>,
    ) -> Self {
        let (tx, _rx) = watch::channel(ModelConfig::with_defaults());
        Self {
            path: path.into(),
            catalog,
            models_root: models_root.into(),
            runtime,
            state: RwLock::new(None),
            tx,
        }
    }

    /// Current config: built-in defaults merged with the persisted override
    /// file, cached after the first read.
    pub async fn get(&self) -> ModelConfig {
        if let Some(cached) = self.state.read().await.as_ref() {
            return cached.clone();
        }

        let mut guard = self.state.write().await;
        if let Some(cached) = guard.as_ref() {
            return cached.clone();
        }

        let config = self.read_merged().await;
        *guard = Some(config.clone());
        config
    }

    /// Apply a partial update.
    ///
    /// Validation failures are returned; persistence and runtime-push
    /// failures are logged and swallowed (the merged config remains
    /// authoritative in memory either way).
    pub async fn set(&self, update: ModelConfigUpdate) -> Result<ModelConfig, ConfigError> {
        let mut config = self.get().await;
        config.merge(&update);
        validate_config(&config)?;

        {
            let mut guard = self.state.write().await;
            *guard = Some(config.clone());
        }

        if let Err(err) = self.persist(&config) {
            warn!(error = %err, path = %self.path.display(), "config persist failed, continuing with in-memory config");
        }

        let catalog = self.catalog.load_or_empty().await;
        let paths = resolve_model_paths(&config, &catalog, &self.models_root);
        if let Err(err) = self.runtime.push_model_paths(&paths).await {
            warn!(error = %err, "runtime config push failed, service may not be running");
        }

        let _ = self.tx.send(config.clone());
        Ok(config)
    }

    /// Subscribe to config changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ModelConfig> {
        self.tx.subscribe()
    }

    fn persist(&self, config: &ModelConfig) -> Result<(), crate::paths::PathError> {
        let json = serde_json::to_vec_pretty(config).unwrap_or_default();
        write_atomic(&self.path, &json)
    }

    async fn read_merged(&self) -> ModelConfig {
        let mut config = ModelConfig::with_defaults();
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<ModelConfigUpdate>(&bytes) {
                Ok(stored) => config.merge(&stored),
                Err(err) => {
                    warn!(error = %err, path = %self.path.display(), "config file unreadable, using defaults");
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "config file unreadable, using defaults");
            }
        }
        config
    }
}

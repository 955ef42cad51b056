//! Outbound ports.
//!
//! The only outbound dependency of the core is the best-effort config push
//! to an already-running dependent service. The HTTP implementation lives in
//! `modelvault-download` (it owns the HTTP stack); core ships the trait and
//! a no-op for tests and CLI contexts without a running service.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::AssetCatalog;
use crate::config::ModelConfig;

/// Resolved absolute model file paths for the dependent service.
///
/// Paths are present only when the selected descriptor exists in the catalog;
/// the file itself may or may not be on disk yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_mmproj: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reranker: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<PathBuf>,
}

/// Resolve the absolute file paths for the config's role selections.
#[must_use]
pub fn resolve_model_paths(
    config: &ModelConfig,
    catalog: &AssetCatalog,
    root: &Path,
) -> ModelPaths {
    let resolve = |id: &str| catalog.get(id).map(|d| root.join(&d.relative_path));

    ModelPaths {
        completion: resolve(&config.completion_model),
        vision: resolve(&config.vision_model),
        vision_mmproj: catalog
            .companion_of(&config.vision_model)
            .map(|d| root.join(&d.relative_path)),
        embedding: resolve(&config.embedding_model),
        reranker: resolve(&config.reranker_model),
        speech: resolve(&config.speech_model),
    }
}

/// Errors from the dependent-service push.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The service could not be reached or rejected the push.
    #[error("Runtime service unreachable: {0}")]
    Unreachable(String),
}

/// Port for informing a running dependent service of new model paths.
///
/// Callers treat failures as non-fatal: the service may simply not be up yet
/// and will read the persisted config when it starts.
#[async_trait]
pub trait RuntimeConfigPort: Send + Sync {
    /// Push newly resolved model file paths to the service.
    async fn push_model_paths(&self, paths: &ModelPaths) -> Result<(), RuntimeError>;
}

/// A no-op runtime port for tests and contexts without a running service.
#[derive(Debug, Clone, Default)]
pub struct NoopRuntime;

impl NoopRuntime {
    /// Create a new no-op runtime port.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RuntimeConfigPort for NoopRuntime {
    async fn push_model_paths(&self, _paths: &ModelPaths) -> Result<(), RuntimeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetDescriptor, ModelRole};

    fn catalog() -> AssetCatalog {
        AssetCatalog::from_descriptors(vec![
            AssetDescriptor {
                id: "vlm".to_string(),
                label: "VLM".to_string(),
                relative_path: "vision/vlm.gguf".to_string(),
                url: "https://models.example/vlm.gguf".to_string(),
                role: ModelRole::Vision,
                optional: false,
                mmproj_companion_id: Some("vlm-mmproj".to_string()),
            },
            AssetDescriptor {
                id: "vlm-mmproj".to_string(),
                label: "VLM projector".to_string(),
                relative_path: "vision/vlm-mmproj.gguf".to_string(),
                url: "https://models.example/vlm-mmproj.gguf".to_string(),
                role: ModelRole::Vision,
                optional: false,
                mmproj_companion_id: None,
            },
        ])
        .unwrap()
    }

    #[test]
    fn resolves_selected_and_companion_paths() {
        let mut config = ModelConfig::with_defaults();
        config.vision_model = "vlm".to_string();
        let paths = resolve_model_paths(&config, &catalog(), Path::new("/models"));

        assert_eq!(paths.vision, Some(PathBuf::from("/models/vision/vlm.gguf")));
        assert_eq!(
            paths.vision_mmproj,
            Some(PathBuf::from("/models/vision/vlm-mmproj.gguf"))
        );
        // Ids absent from the catalog resolve to nothing.
        assert_eq!(paths.embedding, None);
    }

    #[tokio::test]
    async fn noop_runtime_accepts_push() {
        let runtime = NoopRuntime::new();
        runtime.push_model_paths(&ModelPaths::default()).await.unwrap();
    }
}

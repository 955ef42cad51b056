//! Asset catalog: the externally supplied list of downloadable model files.
//!
//! The catalog is a JSON document loaded once and cached. It can gain
//! entries at runtime when a user registers a custom model; registrations
//! are validated and persisted back to the catalog file atomically.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::paths::write_atomic;

/// The functional slot a model fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// General chat/completion model.
    Completion,
    /// Vision-language model (paired with an mmproj companion).
    Vision,
    /// Text embedding model.
    Embedding,
    /// Reranker model.
    Reranker,
    /// Speech-to-text model.
    Speech,
}

impl ModelRole {
    /// All roles, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Completion,
        Self::Vision,
        Self::Embedding,
        Self::Reranker,
        Self::Speech,
    ];

    /// Canonical string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Vision => "vision",
            Self::Embedding => "embedding",
            Self::Reranker => "reranker",
            Self::Speech => "speech",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completion" => Ok(Self::Completion),
            "vision" => Ok(Self::Vision),
            "embedding" => Ok(Self::Embedding),
            "reranker" => Ok(Self::Reranker),
            "speech" => Ok(Self::Speech),
            _ => Err(()),
        }
    }
}

/// Identity and provenance of one downloadable model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// Unique key within the catalog.
    pub id: String,
    /// Human-readable display name.
    pub label: String,
    /// Destination path relative to the models root.
    pub relative_path: String,
    /// Download URL.
    pub url: String,
    /// The role this model fills.
    pub role: ModelRole,
    /// Absence of an optional asset does not block readiness.
    #[serde(default)]
    pub optional: bool,
    /// Id of a companion descriptor that must accompany this one
    /// (e.g., a vision model's projector weights).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mmproj_companion_id: Option<String>,
}

/// Errors from catalog loading, validation, and registration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two descriptors share an id.
    #[error("Duplicate descriptor id in catalog: {0}")]
    DuplicateId(String),

    /// Two descriptors target the same destination file.
    #[error("Duplicate destination path in catalog: {0}")]
    DuplicatePath(String),

    /// The catalog file could not be read.
    #[error("Failed to read catalog {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The catalog file is not valid JSON (or has the wrong shape).
    #[error("Failed to parse catalog {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The catalog file could not be rewritten after a registration.
    #[error("Failed to persist catalog {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// A validated, in-memory collection of asset descriptors.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    descriptors: Vec<AssetDescriptor>,
}

impl AssetCatalog {
    /// Build a catalog, enforcing the uniqueness invariants.
    ///
    /// `id` must be unique within the catalog, and no two descriptors may
    /// target the same `relative_path`.
    pub fn from_descriptors(descriptors: Vec<AssetDescriptor>) -> Result<Self, CatalogError> {
        let mut ids = std::collections::HashSet::new();
        let mut paths = std::collections::HashSet::new();
        for d in &descriptors {
            if !ids.insert(d.id.as_str()) {
                return Err(CatalogError::DuplicateId(d.id.clone()));
            }
            if !paths.insert(d.relative_path.as_str()) {
                return Err(CatalogError::DuplicatePath(d.relative_path.clone()));
            }
        }
        Ok(Self { descriptors })
    }

    /// An empty catalog (the representation of a failed load).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Look up a descriptor by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AssetDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Whether the catalog contains a descriptor with this id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate descriptors in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the catalog holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The mmproj companion descriptor of `id`, if it declares one.
    #[must_use]
    pub fn companion_of(&self, id: &str) -> Option<&AssetDescriptor> {
        let companion_id = self.get(id)?.mmproj_companion_id.as_deref()?;
        self.get(companion_id)
    }
}

impl<'a> IntoIterator for &'a AssetCatalog {
    type Item = &'a AssetDescriptor;
    type IntoIter = std::slice::Iter<'a, AssetDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// On-disk shape of the catalog document.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    assets: Vec<AssetDescriptor>,
}

/// Lazy-loading, cached file store for the asset catalog.
pub struct CatalogStore {
    path: PathBuf,
    cache: RwLock<Option<AssetCatalog>>,
}

impl CatalogStore {
    /// Create a store backed by the given catalog file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// The catalog file path (used in error events).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog, reading the file on first access.
    pub async fn load(&self) -> Result<AssetCatalog, CatalogError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let mut guard = self.cache.write().await;
        // Another task may have populated the cache while we waited.
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }

        let catalog = self.read_file().await?;
        *guard = Some(catalog.clone());
        Ok(catalog)
    }

    /// Load the catalog, mapping any failure to an empty catalog.
    ///
    /// A zero-descriptor result is how a missing or malformed catalog file
    /// surfaces to status and download callers; it is never a panic or a
    /// propagated error.
    pub async fn load_or_empty(&self) -> AssetCatalog {
        match self.load().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "catalog load failed, treating as empty");
                AssetCatalog::empty()
            }
        }
    }

    /// Register a user-added custom model.
    ///
    /// Re-validates the uniqueness invariants against the merged set,
    /// rewrites the catalog file atomically, and updates the cache.
    pub async fn register(&self, descriptor: AssetDescriptor) -> Result<AssetCatalog, CatalogError> {
        let current = self.load_or_empty().await;

        let mut descriptors: Vec<AssetDescriptor> = current.iter().cloned().collect();
        descriptors.push(descriptor);
        let merged = AssetCatalog::from_descriptors(descriptors)?;

        let file = CatalogFile {
            assets: merged.iter().cloned().collect(),
        };
        let json =
            serde_json::to_vec_pretty(&file).map_err(|e| CatalogError::Persist {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        write_atomic(&self.path, &json).map_err(|e| CatalogError::Persist {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        *self.cache.write().await = Some(merged.clone());
        Ok(merged)
    }

    /// Drop the cache so the next `load` re-reads the file.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn read_file(&self) -> Result<AssetCatalog, CatalogError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CatalogError::Io {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        let file: CatalogFile =
            serde_json::from_slice(&bytes).map_err(|e| CatalogError::Parse {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        AssetCatalog::from_descriptors(file.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, path: &str, role: ModelRole) -> AssetDescriptor {
        AssetDescriptor {
            id: id.to_string(),
            label: id.to_uppercase(),
            relative_path: path.to_string(),
            url: format!("https://models.example/{id}.gguf"),
            role,
            optional: false,
            mmproj_companion_id: None,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = AssetCatalog::from_descriptors(vec![
            descriptor("a", "a.gguf", ModelRole::Completion),
            descriptor("a", "b.gguf", ModelRole::Embedding),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn rejects_duplicate_paths() {
        let result = AssetCatalog::from_descriptors(vec![
            descriptor("a", "same.gguf", ModelRole::Completion),
            descriptor("b", "same.gguf", ModelRole::Embedding),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicatePath(p)) if p == "same.gguf"));
    }

    #[test]
    fn companion_lookup_follows_reference() {
        let mut vlm = descriptor("vlm", "vlm.gguf", ModelRole::Vision);
        vlm.mmproj_companion_id = Some("vlm-mmproj".to_string());
        let catalog = AssetCatalog::from_descriptors(vec![
            vlm,
            descriptor("vlm-mmproj", "vlm-mmproj.gguf", ModelRole::Vision),
        ])
        .unwrap();

        assert_eq!(catalog.companion_of("vlm").unwrap().id, "vlm-mmproj");
        assert!(catalog.companion_of("vlm-mmproj").is_none());
    }

    #[tokio::test]
    async fn load_missing_file_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.is_err());
        assert!(store.load_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn load_roundtrips_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        let file = CatalogFile {
            assets: vec![descriptor("embed", "embed.gguf", ModelRole::Embedding)],
        };
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let store = CatalogStore::new(&path);
        let catalog = store.load().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("embed").unwrap().role, ModelRole::Embedding);
    }

    #[tokio::test]
    async fn register_appends_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        let file = CatalogFile {
            assets: vec![descriptor("embed", "embed.gguf", ModelRole::Embedding)],
        };
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let store = CatalogStore::new(&path);
        let merged = store
            .register(descriptor("custom", "custom.gguf", ModelRole::Completion))
            .await
            .unwrap();
        assert_eq!(merged.len(), 2);

        // A fresh store sees the persisted addition.
        let reread = CatalogStore::new(&path).load().await.unwrap();
        assert!(reread.contains("custom"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        let file = CatalogFile {
            assets: vec![descriptor("embed", "embed.gguf", ModelRole::Embedding)],
        };
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let store = CatalogStore::new(&path);
        let result = store
            .register(descriptor("embed", "other.gguf", ModelRole::Embedding))
            .await;
        assert!(matches!(result, Err(CatalogError::DuplicateId(_))));
    }

    #[test]
    fn descriptor_wire_format_is_camel_case() {
        let mut d = descriptor("vlm", "vision/vlm.gguf", ModelRole::Vision);
        d.mmproj_companion_id = Some("vlm-mmproj".to_string());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["relativePath"], "vision/vlm.gguf");
        assert_eq!(json["mmprojCompanionId"], "vlm-mmproj");
        assert_eq!(json["role"], "vision");
    }
}

//! Status probing: point-in-time disk state for catalog assets.
//!
//! Probing is pure apart from a single stat call per descriptor. Any stat
//! failure (including "not found") maps to `exists = false`; a zero-byte
//! file also counts as absent, guarding against a prior crash mid-write
//! before temp-file discipline was engaged.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AssetCatalog, AssetDescriptor, ModelRole};
use crate::config::ModelConfig;

/// A point-in-time read of one descriptor's disk state. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    /// Descriptor id.
    pub id: String,
    /// Display name.
    pub label: String,
    /// Resolved destination path.
    pub absolute_path: PathBuf,
    /// Whether the file is present (and nonzero-sized).
    pub exists: bool,
    /// File size in bytes, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Whether absence blocks readiness.
    pub optional: bool,
    /// Companion descriptor id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmproj_companion_id: Option<String>,
}

/// The aggregate readiness answer over the full catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    /// Status of every catalog asset.
    pub assets: Vec<AssetStatus>,
    /// True iff no selected, non-optional asset is missing.
    pub ready: bool,
    /// Ids of selected-and-absent assets.
    pub missing: Vec<String>,
    /// When this summary was computed.
    pub last_checked_at: DateTime<Utc>,
}

impl StatusSummary {
    /// Look up one asset's status by id.
    #[must_use]
    pub fn asset(&self, id: &str) -> Option<&AssetStatus> {
        self.assets.iter().find(|a| a.id == id)
    }
}

/// Stat one descriptor's destination under the models root.
///
/// Never fails: stat errors are reported as `exists = false` with no size.
#[must_use]
pub fn describe(descriptor: &AssetDescriptor, root: &Path) -> AssetStatus {
    let absolute_path = root.join(&descriptor.relative_path);
    let (exists, size_bytes) = match std::fs::metadata(&absolute_path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => (true, Some(meta.len())),
        _ => (false, None),
    };

    AssetStatus {
        id: descriptor.id.clone(),
        label: descriptor.label.clone(),
        absolute_path,
        exists,
        size_bytes,
        optional: descriptor.optional,
        mmproj_companion_id: descriptor.mmproj_companion_id.clone(),
    }
}

/// The set of descriptor ids selected by the config's role assignments,
/// plus their mmproj companions.
///
/// A role selection referencing an id missing from the catalog falls back
/// to the documented default for that role; if the default is also absent
/// from the catalog, the role contributes nothing.
#[must_use]
pub fn selected_ids(catalog: &AssetCatalog, config: &ModelConfig) -> BTreeSet<String> {
    let mut selected = BTreeSet::new();
    for role in ModelRole::ALL {
        let configured = config.selection(role);
        let effective = if catalog.contains(configured) {
            Some(configured)
        } else {
            let fallback = ModelConfig::default_selection(role);
            catalog.contains(fallback).then_some(fallback)
        };

        if let Some(id) = effective {
            selected.insert(id.to_string());
            if let Some(companion) = catalog.companion_of(id) {
                selected.insert(companion.id.clone());
            }
        }
    }
    selected
}

/// Fan `describe` over the catalog and compute role-scoped readiness.
///
/// Readiness is scoped to the current selection: assets belonging to roles
/// the user has not selected never block `ready`, and optional assets never
/// do either.
#[must_use]
pub fn summarize(catalog: &AssetCatalog, config: &ModelConfig, root: &Path) -> StatusSummary {
    let assets: Vec<AssetStatus> = catalog.iter().map(|d| describe(d, root)).collect();
    let selected = selected_ids(catalog, config);

    let missing: Vec<String> = assets
        .iter()
        .filter(|a| selected.contains(&a.id) && !a.exists)
        .map(|a| a.id.clone())
        .collect();

    let ready = assets
        .iter()
        .filter(|a| selected.contains(&a.id) && !a.optional)
        .all(|a| a.exists);

    StatusSummary {
        assets,
        ready,
        missing,
        last_checked_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetDescriptor;

    fn descriptor(id: &str, role: ModelRole, optional: bool) -> AssetDescriptor {
        AssetDescriptor {
            id: id.to_string(),
            label: id.to_uppercase(),
            relative_path: format!("{id}.gguf"),
            url: format!("https://models.example/{id}.gguf"),
            role,
            optional,
            mmproj_companion_id: None,
        }
    }

    fn write_file(root: &Path, name: &str, contents: &[u8]) {
        std::fs::write(root.join(name), contents).unwrap();
    }

    #[test]
    fn describe_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let status = describe(&descriptor("a", ModelRole::Embedding, false), dir.path());
        assert!(!status.exists);
        assert_eq!(status.size_bytes, None);
    }

    #[test]
    fn describe_zero_byte_file_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.gguf", b"");
        let status = describe(&descriptor("a", ModelRole::Embedding, false), dir.path());
        assert!(!status.exists);
        assert_eq!(status.size_bytes, None);
    }

    #[test]
    fn describe_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.gguf", b"weights");
        let d = descriptor("a", ModelRole::Embedding, false);
        let first = describe(&d, dir.path());
        let second = describe(&d, dir.path());
        assert_eq!(first.exists, second.exists);
        assert_eq!(first.size_bytes, second.size_bytes);
        assert_eq!(first.size_bytes, Some(7));
    }

    #[test]
    fn readiness_is_role_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AssetCatalog::from_descriptors(vec![
            descriptor("qwen3-4b-instruct", ModelRole::Completion, false),
            descriptor("unselected-extra", ModelRole::Completion, true),
        ])
        .unwrap();
        let config = ModelConfig::with_defaults();

        // Only the completion default is in this catalog; it exists on disk,
        // the unselected optional extra does not.
        write_file(dir.path(), "qwen3-4b-instruct.gguf", b"weights");

        let summary = summarize(&catalog, &config, dir.path());
        assert!(summary.ready);
        assert!(summary.missing.is_empty());
    }

    #[test]
    fn selected_absent_asset_blocks_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AssetCatalog::from_descriptors(vec![descriptor(
            "qwen3-4b-instruct",
            ModelRole::Completion,
            false,
        )])
        .unwrap();
        let config = ModelConfig::with_defaults();

        let summary = summarize(&catalog, &config, dir.path());
        assert!(!summary.ready);
        assert_eq!(summary.missing, vec!["qwen3-4b-instruct".to_string()]);
    }

    #[test]
    fn unknown_selection_falls_back_to_default() {
        let catalog = AssetCatalog::from_descriptors(vec![descriptor(
            "qwen3-4b-instruct",
            ModelRole::Completion,
            false,
        )])
        .unwrap();
        let mut config = ModelConfig::with_defaults();
        config.completion_model = "no-such-model".to_string();

        let selected = selected_ids(&catalog, &config);
        assert!(selected.contains("qwen3-4b-instruct"));
        assert!(!selected.contains("no-such-model"));
    }

    #[test]
    fn companions_are_selected_with_their_primary() {
        let mut vlm = descriptor("qwen2.5-vl-3b", ModelRole::Vision, false);
        vlm.mmproj_companion_id = Some("qwen2.5-vl-3b-mmproj".to_string());
        let catalog = AssetCatalog::from_descriptors(vec![
            vlm,
            descriptor("qwen2.5-vl-3b-mmproj", ModelRole::Vision, false),
        ])
        .unwrap();
        let config = ModelConfig::with_defaults();

        let selected = selected_ids(&catalog, &config);
        assert!(selected.contains("qwen2.5-vl-3b"));
        assert!(selected.contains("qwen2.5-vl-3b-mmproj"));
    }

    #[test]
    fn missing_companion_blocks_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let mut vlm = descriptor("qwen2.5-vl-3b", ModelRole::Vision, false);
        vlm.mmproj_companion_id = Some("qwen2.5-vl-3b-mmproj".to_string());
        let catalog = AssetCatalog::from_descriptors(vec![
            vlm,
            descriptor("qwen2.5-vl-3b-mmproj", ModelRole::Vision, false),
        ])
        .unwrap();
        let config = ModelConfig::with_defaults();

        write_file(dir.path(), "qwen2.5-vl-3b.gguf", b"weights");

        let summary = summarize(&catalog, &config, dir.path());
        assert!(!summary.ready);
        assert!(summary.missing.contains(&"qwen2.5-vl-3b-mmproj".to_string()));
    }
}

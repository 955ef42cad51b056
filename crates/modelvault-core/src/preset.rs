//! Preset resolution: named role→model bundles and host-based recommendation.
//!
//! A preset maps each role to a descriptor id, tuned for a resource tier.
//! Recommendation reads total host memory through the `HostProbe` port: on
//! Apple silicon (unified memory) the RAM thresholds apply directly; on
//! other platforms the rules are VRAM-oriented and total RAM is used as a
//! conservative 2x proxy because no direct GPU memory query is available.
//! Applying a preset only writes config; downloads are the caller's job.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ModelRole;
use crate::config::{ConfigError, ConfigStore, ModelConfig, ModelConfigUpdate};

const GIB: u64 = 1024 * 1024 * 1024;

/// Named resource tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetId {
    /// Smallest models, CPU-only fallback tier.
    Eco,
    /// The default mid tier.
    Balanced,
    /// Largest models for well-provisioned hosts.
    Pro,
}

impl PresetId {
    /// Canonical string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eco => "eco",
            Self::Balanced => "balanced",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PresetId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eco" => Ok(Self::Eco),
            "balanced" => Ok(Self::Balanced),
            "pro" => Ok(Self::Pro),
            _ => Err(()),
        }
    }
}

/// A named bundle mapping each role to a descriptor id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetBundle {
    /// The preset this bundle belongs to.
    pub id: PresetId,
    /// Display name.
    pub label: String,
    /// Role to descriptor-id selections.
    pub selections: BTreeMap<ModelRole, String>,
    /// Estimated resident memory footprint.
    pub approx_ram_bytes: u64,
    /// Estimated total download size.
    pub approx_download_bytes: u64,
}

impl PresetBundle {
    /// Turn the bundle's selections into a partial config update.
    #[must_use]
    pub fn to_update(&self) -> ModelConfigUpdate {
        let get = |role: ModelRole| self.selections.get(&role).cloned();
        ModelConfigUpdate {
            completion_model: get(ModelRole::Completion),
            vision_model: get(ModelRole::Vision),
            embedding_model: get(ModelRole::Embedding),
            reranker_model: get(ModelRole::Reranker),
            speech_model: get(ModelRole::Speech),
            ..Default::default()
        }
    }
}

/// One threshold rule: met when the evaluated memory figure reaches
/// `min_bytes`. Rules are evaluated highest threshold first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetRule {
    /// Minimum memory (RAM on unified-memory hosts, VRAM otherwise).
    pub min_bytes: u64,
    /// Preset recommended when the threshold is met.
    pub preset: PresetId,
}

/// Errors from preset lookup and application.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The preset catalog file could not be read or parsed.
    #[error("Failed to load preset catalog {path}: {reason}")]
    Load { path: String, reason: String },

    /// No bundle exists for the requested preset.
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Applying the bundle produced an invalid config.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The preset catalog: bundles plus the platform threshold rule sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetCatalog {
    /// All known bundles.
    pub presets: Vec<PresetBundle>,
    /// Rules for unified-memory (Apple silicon) hosts, keyed on total RAM.
    pub unified_memory_rules: Vec<PresetRule>,
    /// Rules for discrete-GPU hosts, keyed on estimated VRAM.
    pub discrete_gpu_rules: Vec<PresetRule>,
    /// Preset used when no threshold clears (the CPU-only tier).
    pub fallback: PresetId,
}

impl PresetCatalog {
    /// The built-in preset catalog shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        let bundle = |id: PresetId,
                      label: &str,
                      completion: &str,
                      vision: &str,
                      speech: &str,
                      ram: u64,
                      download: u64| {
            let mut selections = BTreeMap::new();
            selections.insert(ModelRole::Completion, completion.to_string());
            selections.insert(ModelRole::Vision, vision.to_string());
            selections.insert(ModelRole::Embedding, "embeddinggemma-300m".to_string());
            selections.insert(ModelRole::Reranker, "bge-reranker-v2-m3".to_string());
            selections.insert(ModelRole::Speech, speech.to_string());
            PresetBundle {
                id,
                label: label.to_string(),
                selections,
                approx_ram_bytes: ram,
                approx_download_bytes: download,
            }
        };

        Self {
            presets: vec![
                bundle(
                    PresetId::Eco,
                    "Eco",
                    "qwen3-1.7b-instruct",
                    "qwen2.5-vl-3b",
                    "whisper-small",
                    4 * GIB,
                    3 * GIB,
                ),
                bundle(
                    PresetId::Balanced,
                    "Balanced",
                    "qwen3-4b-instruct",
                    "qwen2.5-vl-3b",
                    "whisper-large-v3-turbo",
                    8 * GIB,
                    6 * GIB,
                ),
                bundle(
                    PresetId::Pro,
                    "Pro",
                    "qwen3-14b-instruct",
                    "qwen2.5-vl-7b",
                    "whisper-large-v3-turbo",
                    20 * GIB,
                    14 * GIB,
                ),
            ],
            unified_memory_rules: vec![
                PresetRule {
                    min_bytes: 32 * GIB,
                    preset: PresetId::Pro,
                },
                PresetRule {
                    min_bytes: 16 * GIB,
                    preset: PresetId::Balanced,
                },
            ],
            discrete_gpu_rules: vec![
                PresetRule {
                    min_bytes: 16 * GIB,
                    preset: PresetId::Pro,
                },
                PresetRule {
                    min_bytes: 8 * GIB,
                    preset: PresetId::Balanced,
                },
            ],
            fallback: PresetId::Eco,
        }
    }

    /// Load a preset catalog from a JSON file, falling back to the built-in
    /// catalog when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, PresetError> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| PresetError::Load {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::builtin()),
            Err(err) => Err(PresetError::Load {
                path: path.display().to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Look up the bundle for a preset.
    #[must_use]
    pub fn bundle(&self, id: PresetId) -> Option<&PresetBundle> {
        self.presets.iter().find(|b| b.id == id)
    }

    /// Recommend a preset from host resource signals.
    #[must_use]
    pub fn recommend(&self, probe: &dyn HostProbe) -> PresetId {
        let (rules, figure) = if probe.is_apple_silicon() {
            (&self.unified_memory_rules, probe.total_ram_bytes())
        } else {
            // No direct VRAM query; treat half of total RAM as the
            // conservative VRAM estimate.
            (&self.discrete_gpu_rules, probe.total_ram_bytes() / 2)
        };

        let mut ordered: Vec<&PresetRule> = rules.iter().collect();
        ordered.sort_by(|a, b| b.min_bytes.cmp(&a.min_bytes));

        ordered
            .iter()
            .find(|rule| figure >= rule.min_bytes)
            .map_or(self.fallback, |rule| rule.preset)
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Port for reading host resource signals.
pub trait HostProbe: Send + Sync {
    /// Total physical memory in bytes.
    fn total_ram_bytes(&self) -> u64;

    /// Whether this host is an Apple silicon (unified memory) machine.
    fn is_apple_silicon(&self) -> bool;
}

/// Production probe backed by `sysinfo`.
#[derive(Debug, Clone, Default)]
pub struct SysinfoProbe;

impl SysinfoProbe {
    /// Create a new probe.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HostProbe for SysinfoProbe {
    fn total_ram_bytes(&self) -> u64 {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        sys.total_memory()
    }

    fn is_apple_silicon(&self) -> bool {
        cfg!(all(target_os = "macos", target_arch = "aarch64"))
    }
}

/// Apply a preset: write its role selections through the standard config
/// setter. Does not trigger downloads.
pub async fn apply_preset(
    store: &ConfigStore,
    catalog: &PresetCatalog,
    id: PresetId,
) -> Result<ModelConfig, PresetError> {
    let bundle = catalog
        .bundle(id)
        .ok_or_else(|| PresetError::UnknownPreset(id.to_string()))?;
    Ok(store.set(bundle.to_update()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use std::sync::Arc;

    struct FixedProbe {
        ram: u64,
        apple: bool,
    }

    impl HostProbe for FixedProbe {
        fn total_ram_bytes(&self) -> u64 {
            self.ram
        }

        fn is_apple_silicon(&self) -> bool {
            self.apple
        }
    }

    #[test]
    fn unified_memory_thresholds_evaluated_highest_first() {
        let catalog = PresetCatalog::builtin();
        let probe = FixedProbe {
            ram: 64 * GIB,
            apple: true,
        };
        // 64 GiB clears both the 32 GiB and 16 GiB rules; the highest wins.
        assert_eq!(catalog.recommend(&probe), PresetId::Pro);

        let probe = FixedProbe {
            ram: 16 * GIB,
            apple: true,
        };
        assert_eq!(catalog.recommend(&probe), PresetId::Balanced);
    }

    #[test]
    fn discrete_rules_use_half_ram_as_vram_proxy() {
        let catalog = PresetCatalog::builtin();
        // 32 GiB RAM -> 16 GiB estimated VRAM -> pro.
        let probe = FixedProbe {
            ram: 32 * GIB,
            apple: false,
        };
        assert_eq!(catalog.recommend(&probe), PresetId::Pro);

        // 16 GiB RAM -> 8 GiB estimated VRAM -> balanced.
        let probe = FixedProbe {
            ram: 16 * GIB,
            apple: false,
        };
        assert_eq!(catalog.recommend(&probe), PresetId::Balanced);
    }

    #[test]
    fn falls_back_to_eco_when_no_threshold_clears() {
        let catalog = PresetCatalog::builtin();
        let probe = FixedProbe {
            ram: 8 * GIB,
            apple: false,
        };
        assert_eq!(catalog.recommend(&probe), PresetId::Eco);
    }

    #[tokio::test]
    async fn apply_preset_writes_role_selections() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(
            dir.path().join("config.json"),
            Arc::new(CatalogStore::new(dir.path().join("models.json"))),
            dir.path().join("models"),
        );
        let presets = PresetCatalog::builtin();

        let config = apply_preset(&store, &presets, PresetId::Pro).await.unwrap();
        assert_eq!(config.completion_model, "qwen3-14b-instruct");
        assert_eq!(config.vision_model, "qwen2.5-vl-7b");
        // Knobs are untouched by preset application.
        assert_eq!(config.context_size, 8192);
    }

    #[test]
    fn load_missing_file_returns_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = PresetCatalog::load(&dir.path().join("presets.json")).unwrap();
        assert_eq!(catalog.presets.len(), 3);
    }

    #[test]
    fn catalog_roundtrips_through_json() {
        let catalog = PresetCatalog::builtin();
        let json = serde_json::to_vec(&catalog).unwrap();
        let parsed: PresetCatalog = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.fallback, PresetId::Eco);
        assert_eq!(parsed.bundle(PresetId::Eco).unwrap().label, "Eco");
    }
}

//! Core domain types and port definitions for modelvault.
//!
//! This crate holds everything that is pure or filesystem-local: the asset
//! catalog, the persisted user configuration, status probing, preset
//! resolution, and the event-sink abstraction the download engine emits
//! through. Network-facing code lives in `modelvault-download`.

pub mod catalog;
pub mod config;
pub mod events;
pub mod paths;
pub mod ports;
pub mod preset;
pub mod status;

// Re-export commonly used types for convenience
pub use catalog::{AssetCatalog, AssetDescriptor, CatalogError, CatalogStore, ModelRole};
pub use config::{ConfigError, ConfigStore, ModelConfig, ModelConfigUpdate, validate_config};
pub use events::{
    DownloadEvent, DownloadEventSink, DownloadState, EventListener, ListenerSet, NoopSink,
    SubscriptionId,
};
pub use paths::{
    DEFAULT_DATA_DIR_RELATIVE, ModelsDirResolution, ModelsDirSource, PathError, catalog_path,
    config_path, default_data_dir, default_models_dir, ensure_directory, presets_path,
    resolve_models_dir, write_atomic,
};
pub use ports::{ModelPaths, NoopRuntime, RuntimeConfigPort, RuntimeError, resolve_model_paths};
pub use preset::{
    HostProbe, PresetBundle, PresetCatalog, PresetError, PresetId, PresetRule, SysinfoProbe,
    apply_preset,
};
pub use status::{AssetStatus, StatusSummary, describe, selected_ids, summarize};

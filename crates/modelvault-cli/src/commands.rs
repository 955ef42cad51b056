//! Subcommand definitions.

use clap::Subcommand;

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show which model files are present and whether the selection is ready
    Status {
        /// Print the raw summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download missing model files (all of them, or only the listed ids)
    Download {
        /// Restrict the download to these asset ids
        ids: Vec<String>,
    },

    /// Delete one asset's file and download it again
    Redownload {
        /// The asset id to re-fetch
        id: String,
    },

    /// Show or change the model configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List, recommend, or apply model presets
    Preset {
        #[command(subcommand)]
        command: PresetCommand,
    },

    /// Register a custom model in the asset catalog
    Register {
        /// Unique asset id
        #[arg(long)]
        id: String,
        /// Display name
        #[arg(long)]
        label: String,
        /// Destination path relative to the models directory
        #[arg(long = "relative-path")]
        relative_path: String,
        /// Download URL
        #[arg(long)]
        url: String,
        /// Role the model fills (completion, vision, embedding, reranker, speech)
        #[arg(long)]
        role: String,
        /// Absence of this asset does not block readiness
        #[arg(long)]
        optional: bool,
        /// Id of an mmproj companion asset
        #[arg(long = "mmproj-companion")]
        mmproj_companion: Option<String>,
    },

    /// Print the resolved data and models directories
    Paths,
}

/// `config` subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change configuration values (unset flags are left untouched)
    Set {
        #[arg(long = "completion-model")]
        completion_model: Option<String>,
        #[arg(long = "vision-model")]
        vision_model: Option<String>,
        #[arg(long = "embedding-model")]
        embedding_model: Option<String>,
        #[arg(long = "reranker-model")]
        reranker_model: Option<String>,
        #[arg(long = "speech-model")]
        speech_model: Option<String>,
        #[arg(long = "context-size")]
        context_size: Option<u64>,
        #[arg(long = "batch-size")]
        batch_size: Option<u32>,
        #[arg(long = "ubatch-size")]
        ubatch_size: Option<u32>,
        #[arg(long = "embedding-batch-size")]
        embedding_batch_size: Option<u32>,
        #[arg(long = "keep-alive-minutes")]
        keep_alive_minutes: Option<u32>,
        #[arg(long = "flash-attention")]
        flash_attention: Option<bool>,
        #[arg(long = "auto-download")]
        auto_download: Option<bool>,
    },
}

/// `preset` subcommands.
#[derive(Subcommand)]
pub enum PresetCommand {
    /// List the available presets
    List,

    /// Recommend a preset for this host's memory
    Recommend,

    /// Apply a preset's model selections (eco, balanced, pro)
    Apply {
        /// The preset to apply
        preset: String,
        /// Also download any files the preset selection is missing
        #[arg(long)]
        download: bool,
    },
}

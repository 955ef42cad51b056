//! CLI adapter for modelvault.
//!
//! Exposes the parser types and the bootstrap so the binary stays a thin
//! dispatch layer.

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod progress;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, ConfigCommand, PresetCommand};
pub use parser::Cli;
pub use progress::DownloadProgress;

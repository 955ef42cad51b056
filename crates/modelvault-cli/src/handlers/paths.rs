//! Paths command handler.

use anyhow::Result;

use modelvault_core::paths::{ModelsDirSource, catalog_path, config_path, presets_path};

use crate::bootstrap::CliContext;

/// Print the resolved file and directory locations.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let source = match ctx.models_dir.source {
        ModelsDirSource::Explicit => "explicit --models-dir flag",
        ModelsDirSource::EnvVar => "MODELVAULT_MODELS_DIR",
        ModelsDirSource::Default => "platform default",
    };

    println!(
        "Models directory: {} ({source})",
        ctx.models_dir.path.display()
    );
    println!("Config file:      {}", config_path()?.display());
    println!("Model catalog:    {}", catalog_path()?.display());
    println!("Preset catalog:   {}", presets_path()?.display());
    Ok(())
}

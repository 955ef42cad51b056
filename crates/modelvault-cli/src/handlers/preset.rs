//! Preset command handlers.

use anyhow::{Context, Result, bail};

use modelvault_core::catalog::ModelRole;
use modelvault_core::preset::{HostProbe, PresetCatalog, PresetId, SysinfoProbe, apply_preset};

use crate::bootstrap::CliContext;
use crate::commands::PresetCommand;
use crate::handlers::download;

/// Execute a `preset` subcommand.
pub async fn execute(ctx: &CliContext, command: PresetCommand) -> Result<()> {
    let presets = PresetCatalog::load(&ctx.presets_file)
        .with_context(|| format!("loading {}", ctx.presets_file.display()))?;

    match command {
        PresetCommand::List => {
            list(&presets);
            Ok(())
        }
        PresetCommand::Recommend => {
            let probe = SysinfoProbe::new();
            recommend(&presets, &probe);
            Ok(())
        }
        PresetCommand::Apply {
            preset,
            download: fetch,
        } => {
            let Ok(id) = preset.parse::<PresetId>() else {
                bail!("Unknown preset '{preset}' (expected eco, balanced, or pro)");
            };

            let config = apply_preset(&ctx.config, &presets, id).await?;
            println!("Applied preset '{id}':");
            for role in ModelRole::ALL {
                println!("  {:<12} {}", format!("{role}:"), config.selection(role));
            }

            if fetch {
                download::download(ctx, Vec::new()).await?;
            } else {
                println!("Run 'modelvault download' to fetch any missing files.");
            }
            Ok(())
        }
    }
}

fn list(presets: &PresetCatalog) {
    for bundle in &presets.presets {
        println!(
            "{} ({}) — approx. {} RAM, {} download",
            bundle.id,
            bundle.label,
            format_gib(bundle.approx_ram_bytes),
            format_gib(bundle.approx_download_bytes)
        );
        for (role, id) in &bundle.selections {
            println!("  {role:<12} {id}");
        }
    }
}

fn recommend(presets: &PresetCatalog, probe: &dyn HostProbe) {
    let recommended = presets.recommend(probe);
    println!(
        "Detected {} total memory ({}).",
        format_gib(probe.total_ram_bytes()),
        if probe.is_apple_silicon() {
            "unified"
        } else {
            "discrete GPU assumed"
        }
    );
    println!("Recommended preset: {recommended}");
    println!("Apply it with 'modelvault preset apply {recommended}'.");
}

#[allow(clippy::cast_precision_loss)]
fn format_gib(bytes: u64) -> String {
    format!("{:.0} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

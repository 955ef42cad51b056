//! Status command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Print the readiness summary, as a table or as JSON.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let summary = ctx.coordinator.status().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.assets.is_empty() {
        println!("No model catalog found at {}", ctx.catalog.path().display());
        return Ok(());
    }

    println!(
        "{:<28} {:<10} {:>10}  {}",
        "ID", "STATE", "SIZE", "PATH"
    );
    for asset in &summary.assets {
        let state = if asset.exists { "present" } else { "missing" };
        let size = asset
            .size_bytes
            .map_or_else(|| "--".to_string(), format_bytes);
        println!(
            "{:<28} {:<10} {:>10}  {}",
            asset.id,
            state,
            size,
            asset.absolute_path.display()
        );
    }

    println!();
    if summary.ready {
        println!("Ready: all selected models are present.");
    } else {
        println!("Not ready. Missing: {}", summary.missing.join(", "));
        println!("Run 'modelvault download' to fetch them.");
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.2} GiB", bytes / GIB)
    } else {
        format!("{:.1} MiB", bytes / MIB)
    }
}

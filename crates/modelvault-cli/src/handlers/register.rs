//! Register command handler: add a custom model to the asset catalog.

use anyhow::{Result, bail};

use modelvault_core::catalog::{AssetDescriptor, ModelRole};

use crate::bootstrap::CliContext;

/// Arguments for registering a custom model.
pub struct RegisterArgs {
    pub id: String,
    pub label: String,
    pub relative_path: String,
    pub url: String,
    pub role: String,
    pub optional: bool,
    pub mmproj_companion: Option<String>,
}

/// Validate the arguments and append the descriptor to the catalog file.
pub async fn execute(ctx: &CliContext, args: RegisterArgs) -> Result<()> {
    let Ok(role) = args.role.parse::<ModelRole>() else {
        bail!(
            "Unknown role '{}' (expected completion, vision, embedding, reranker, or speech)",
            args.role
        );
    };

    let descriptor = AssetDescriptor {
        id: args.id.clone(),
        label: args.label,
        relative_path: args.relative_path,
        url: args.url,
        role,
        optional: args.optional,
        mmproj_companion_id: args.mmproj_companion,
    };

    let merged = ctx.catalog.register(descriptor).await?;
    println!(
        "Registered '{}' ({} asset(s) in catalog).",
        args.id,
        merged.len()
    );
    println!("Select it with 'modelvault config set --{role}-model {}'.", args.id);
    Ok(())
}

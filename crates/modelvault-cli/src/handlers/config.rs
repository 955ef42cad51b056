//! Config command handlers.

use anyhow::Result;

use modelvault_core::catalog::ModelRole;
use modelvault_core::config::{ModelConfig, ModelConfigUpdate};

use crate::bootstrap::CliContext;
use crate::commands::ConfigCommand;

/// Execute a `config` subcommand.
pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show { json } => show(ctx, json).await,
        ConfigCommand::Set {
            completion_model,
            vision_model,
            embedding_model,
            reranker_model,
            speech_model,
            context_size,
            batch_size,
            ubatch_size,
            embedding_batch_size,
            keep_alive_minutes,
            flash_attention,
            auto_download,
        } => {
            let update = ModelConfigUpdate {
                completion_model,
                vision_model,
                embedding_model,
                reranker_model,
                speech_model,
                context_size,
                batch_size,
                ubatch_size,
                embedding_batch_size,
                keep_alive_minutes,
                flash_attention,
                auto_download,
            };
            set(ctx, update).await
        }
    }
}

async fn show(ctx: &CliContext, json: bool) -> Result<()> {
    let config = ctx.config.get().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    print_selections(&config);
    println!();
    println!("Context size:         {}", config.context_size);
    println!("Batch size:           {}", config.batch_size);
    println!("Micro-batch size:     {}", config.ubatch_size);
    println!("Embedding batch size: {}", config.embedding_batch_size);
    println!("Keep-alive (min):     {}", config.keep_alive_minutes);
    println!("Flash attention:      {}", config.flash_attention);
    println!("Auto-download:        {}", config.auto_download);
    Ok(())
}

async fn set(ctx: &CliContext, update: ModelConfigUpdate) -> Result<()> {
    let updated = ctx.config.set(update).await?;

    println!("Configuration updated.");
    print_selections(&updated);
    Ok(())
}

fn print_selections(config: &ModelConfig) {
    for role in ModelRole::ALL {
        println!("{:<12} {}", format!("{role}:"), config.selection(role));
    }
}

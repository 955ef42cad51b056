//! CLI entry point - wiring and dispatch only.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modelvault_cli::handlers;
use modelvault_cli::{Cli, CliConfig, Commands, bootstrap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(&CliConfig {
        models_dir: cli.models_dir,
        runtime_url: cli.runtime_url,
    })?;

    match command {
        Commands::Status { json } => {
            handlers::status::execute(&ctx, json).await?;
        }
        Commands::Download { ids } => {
            handlers::download::download(&ctx, ids).await?;
        }
        Commands::Redownload { id } => {
            handlers::download::redownload(&ctx, &id).await?;
        }
        Commands::Config { command } => {
            handlers::config::execute(&ctx, command).await?;
        }
        Commands::Preset { command } => {
            handlers::preset::execute(&ctx, command).await?;
        }
        Commands::Register {
            id,
            label,
            relative_path,
            url,
            role,
            optional,
            mmproj_companion,
        } => {
            let args = handlers::register::RegisterArgs {
                id,
                label,
                relative_path,
                url,
                role,
                optional,
                mmproj_companion,
            };
            handlers::register::execute(&ctx, args).await?;
        }
        Commands::Paths => {
            handlers::paths::execute(&ctx)?;
        }
    }

    Ok(())
}

//! Root CLI parser with global options.

use clap::Parser;

use crate::commands::Commands;

/// Top-level parser for the model asset management tool.
#[derive(Parser)]
#[command(name = "modelvault")]
#[command(about = "Manage, download, and configure local model assets")]
#[command(version)]
pub struct Cli {
    /// Override the models directory for this invocation
    /// (the MODELVAULT_MODELS_DIR variable is consulted when absent)
    #[arg(long = "models-dir", global = true)]
    pub models_dir: Option<String>,

    /// Push config changes to a running inference service at this base URL
    #[arg(long = "runtime-url", global = true, env = "MODELVAULT_RUNTIME_URL")]
    pub runtime_url: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_args_parse() {
        let cli = Cli::parse_from([
            "modelvault",
            "--verbose",
            "--models-dir",
            "/tmp/models",
            "status",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.models_dir, Some("/tmp/models".to_string()));
    }
}

//! CLI entry point - the composition root.

use anyhow::Result;
use clap::Parser;

use yui_cli::{Cli, CliConfig, Commands, bootstrap, handlers, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so env fallbacks see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = bootstrap(CliConfig::from_cli(&cli))?;

    match cli.command {
        Commands::Talk => handlers::talk::execute(ctx).await?,
        Commands::Say { text } => handlers::say::execute(ctx, &text.join(" ")).await?,
    }

    Ok(())
}

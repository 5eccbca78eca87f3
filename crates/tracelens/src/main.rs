mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explain {
            code,
            trace,
            level,
            top_k,
            store,
        } => commands::explain::run(&code, &trace, level, top_k, store.as_deref()),
        Commands::Ingest {
            store,
            concept,
            files,
        } => commands::ingest::run(&store, concept.as_deref(), &files),
        Commands::Retrieve {
            store,
            query,
            top_k,
            concept,
        } => commands::retrieve::run(&store, &query, top_k, concept.as_deref()),
        Commands::Version => commands::version::run(),
    }
}

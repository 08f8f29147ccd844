use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod output;
mod provider;
mod store;
mod vcs;
mod workflow;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("canvasgen=debug")
    } else {
        EnvFilter::new("canvasgen=warn")
    };

    // Logs go to stderr so stdout stays a clean event stream
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => cli::generate::execute(args).await,
        Commands::Iterate(args) => cli::edit::iterate(args).await,
        Commands::AddPage(args) => cli::edit::add_page(args).await,
        Commands::Show(args) => cli::show::execute(args).await,
        Commands::History(args) => cli::history::execute(args).await,
        Commands::Revert(args) => cli::history::revert(args).await,
        Commands::Schema(args) => cli::schema::execute(args),
    }
}

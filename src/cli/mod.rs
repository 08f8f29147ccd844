pub mod edit;
pub mod generate;
pub mod history;
pub mod schema;
pub mod show;

use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "canvasgen")]
#[command(
    author,
    version,
    about = "Generate multi-page HTML prototypes from a product spec"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the architect, planner, coder and reviewer pipeline for a version
    Generate(GenerateArgs),

    /// Revise one stored page from a modification request
    Iterate(IterateArgs),

    /// Generate a new page and append it to the canvas
    AddPage(AddPageArgs),

    /// List the pages stored for a version
    Show(ShowArgs),

    /// Show the commit history of a version
    History(HistoryArgs),

    /// Restore one page from an earlier commit
    Revert(RevertArgs),

    /// Print JSON Schema for the config or a stage payload
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct GenerateArgs {
    /// Version to generate, as projectId/versionFolder
    pub version: String,

    /// Path to config file
    #[arg(short, long, env = "CANVASGEN_CONFIG", default_value = "canvasgen.yaml")]
    pub config: PathBuf,

    /// Progress output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Cancel the run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Write the final quality report as Markdown
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Override the reviewer quality threshold
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Parser, Clone)]
pub struct IterateArgs {
    /// Version holding the page, as projectId/versionFolder
    pub version: String,

    /// Path to config file
    #[arg(short, long, env = "CANVASGEN_CONFIG", default_value = "canvasgen.yaml")]
    pub config: PathBuf,

    /// Slot id of the page to revise
    #[arg(long)]
    pub page: String,

    /// What to change
    #[arg(long)]
    pub prompt: String,
}

#[derive(Parser, Clone)]
pub struct AddPageArgs {
    /// Version to extend, as projectId/versionFolder
    pub version: String,

    /// Path to config file
    #[arg(short, long, env = "CANVASGEN_CONFIG", default_value = "canvasgen.yaml")]
    pub config: PathBuf,

    /// Display name of the new page
    #[arg(long)]
    pub name: String,

    /// What the page should contain
    #[arg(long)]
    pub prompt: Option<String>,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    /// Version to inspect, as projectId/versionFolder
    pub version: String,

    /// Path to config file
    #[arg(short, long, env = "CANVASGEN_CONFIG", default_value = "canvasgen.yaml")]
    pub config: PathBuf,
}

#[derive(Parser, Clone)]
pub struct HistoryArgs {
    /// Version to inspect, as projectId/versionFolder
    pub version: String,

    /// Path to config file
    #[arg(short, long, env = "CANVASGEN_CONFIG", default_value = "canvasgen.yaml")]
    pub config: PathBuf,

    /// Maximum commits to list
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Parser, Clone)]
pub struct RevertArgs {
    /// Version holding the page, as projectId/versionFolder
    pub version: String,

    /// Path to config file
    #[arg(short, long, env = "CANVASGEN_CONFIG", default_value = "canvasgen.yaml")]
    pub config: PathBuf,

    /// Slot id of the page to restore
    #[arg(long)]
    pub page: String,

    /// Commit to restore the page from
    #[arg(long)]
    pub rev: String,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Which schema to print
    #[arg(value_enum, default_value_t = SchemaKind::Config)]
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaKind {
    Config,
    Design,
    Plan,
    Report,
}

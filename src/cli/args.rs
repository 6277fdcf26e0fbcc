//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, refs::RefsArgs, render::RenderArgs, store::StoreCommands,
};

#[derive(Parser)]
#[command(name = "refmark")]
#[command(author, version, about = "Milestone reference filter")]
#[command(long_about = "Resolve %N and namespace/project%N milestone references in document text into rendered links.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Store to resolve references against (.db/.sqlite or .yaml fixture)
    #[arg(long, global = true, env = "REFMARK_STORE")]
    pub store: Option<PathBuf>,

    /// Handle of the current project (target of unqualified references)
    #[arg(long, short = 'p', global = true, env = "REFMARK_PROJECT")]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace milestone references in a document with rendered links
    Render(RenderArgs),

    /// List the milestones a document references
    Refs(RefsArgs),

    /// Manage the SQLite milestone store
    #[command(subcommand)]
    Store(StoreCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tsv for lists)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just references, one per line
    Id,
}

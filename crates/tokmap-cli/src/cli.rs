use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tokmap",
    about = "tokmap: opaque tokens for catalog slugs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Issue (or look up) the token for a slug in a journal
    Issue(IssueArgs),
    /// Resolve a token from a journal back to its slug
    Resolve(ResolveArgs),
    /// List every binding in a journal
    List(ListArgs),
    /// Print the effective server configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the listen address
    #[arg(long)]
    pub bind: Option<String>,
    /// Override the journal path
    #[arg(long)]
    pub journal: Option<PathBuf>,
}

#[derive(Args)]
pub struct IssueArgs {
    #[arg(long)]
    pub journal: PathBuf,
    /// Content kind: series or chapter
    pub kind: String,
    pub slug: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(long)]
    pub journal: PathBuf,
    pub token: String,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub journal: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

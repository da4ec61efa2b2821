use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML config file (defaults apply when omitted).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all sources, merge into the snapshot, render, notify and publish.
    Update(UpdateArgs),
    /// Fetch sources and print the scraped chapters as JSON lines.
    Fetch(FetchArgs),
    /// Re-render the HTML page from the stored snapshot.
    Render(RenderArgs),
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Skip the git push even when publishing is enabled in config.
    #[arg(long)]
    pub no_publish: bool,

    /// Do not send a desktop notification.
    #[arg(long)]
    pub no_notify: bool,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Source URL to fetch instead of the configured sources (repeatable).
    #[arg(long)]
    pub url: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Output path for the HTML page (default: `html_path` from config).
    #[arg(long)]
    pub out: Option<String>,
}

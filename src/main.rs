use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    comictrack::logging::init().context("init logging")?;

    let cli = comictrack::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = comictrack::config::Config::load(cli.config.as_deref().map(Path::new))
        .context("load config")?;

    match cli.command {
        comictrack::cli::Command::Update(args) => {
            comictrack::update::run(config, args).await.context("update")?;
        }
        comictrack::cli::Command::Fetch(args) => {
            comictrack::fetch::run(&config, args).await.context("fetch")?;
        }
        comictrack::cli::Command::Render(args) => {
            comictrack::render::run(&config, args).context("render")?;
        }
    }

    Ok(())
}

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context as _;
use chrono::TimeDelta;
use clap::Parser;

use comictrack::config::Config;
use comictrack::server::{AppState, ServerSettings};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct ServerArgs {
    /// YAML config file (defaults apply when omitted).
    #[arg(long)]
    config: Option<String>,

    /// Listen address (default: `server.addr` from config).
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Hosted `chapters.json` to serve (default: `server.snapshot_url`).
    #[arg(long)]
    snapshot_url: Option<url::Url>,

    /// Hours a chapter stays in the "new" section.
    #[arg(long)]
    new_lifetime_hours: Option<i64>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    comictrack::logging::init()?;

    let args = ServerArgs::parse();
    tracing::info!(?args, "starting comictrack-server");

    let config = Config::load(args.config.as_deref().map(Path::new)).context("load config")?;
    let addr = args.addr.unwrap_or(config.server.addr);
    let snapshot_url = args
        .snapshot_url
        .or_else(|| config.server.snapshot_url.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "snapshot url is required (--snapshot-url, server.snapshot_url or {})",
                comictrack::config::ENV_SNAPSHOT_URL
            )
        })?;
    let new_lifetime = match args.new_lifetime_hours {
        Some(hours) if hours < 0 => anyhow::bail!("--new-lifetime-hours must not be negative"),
        Some(hours) => TimeDelta::hours(hours),
        None => config.new_lifetime(),
    };

    let settings = ServerSettings {
        snapshot_url,
        new_lifetime,
        page_title: config.page_title.clone(),
        fetch_timeout: config.fetch_timeout(),
    };
    tracing::info!(url = %settings.snapshot_url, ?new_lifetime, "serving snapshot");
    let app = comictrack::server::router(AppState::new(settings)?);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use chrono::{NaiveDateTime, TimeDelta, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::chapter::ChapterRecord;
use crate::formats::RemoteChapter;
use crate::reconcile::classify;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub snapshot_url: Url,
    pub new_lifetime: TimeDelta,
    pub page_title: String,
    pub fetch_timeout: Duration,
}

#[derive(Clone)]
pub struct AppState {
    client: reqwest::Client,
    settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(settings: ServerSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build snapshot http client")?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(|| async { "ok\n" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    let chapters = fetch_snapshot(&state.client, &state.settings.snapshot_url)
        .await
        .map_err(|err| {
            tracing::warn!(?err, url = %state.settings.snapshot_url, "snapshot fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                format!("snapshot fetch failed: {err:#}"),
            )
        })?;

    let now = Utc::now().naive_utc();
    Ok(Html(render_snapshot(chapters, now, &state.settings)))
}

/// Time-based view of a snapshot: still-new chapters first, then the rest.
pub fn render_snapshot(
    chapters: Vec<ChapterRecord>,
    now: NaiveDateTime,
    settings: &ServerSettings,
) -> String {
    let classified = classify(chapters, now, settings.new_lifetime);
    let ordered = classified
        .new_section
        .into_iter()
        .chain(classified.all_section)
        .collect::<Vec<_>>();
    crate::render::render(&ordered, &settings.page_title).to_html()
}

pub async fn fetch_snapshot(
    client: &reqwest::Client,
    url: &Url,
) -> anyhow::Result<Vec<ChapterRecord>> {
    let response = client
        .get(url.clone())
        .header(USER_AGENT, concat!("comictrack/", env!("CARGO_PKG_VERSION")))
        .header(ACCEPT, "application/json")
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("GET {url}: unexpected status {status}");
    }

    let raw = response.text().await.context("read snapshot body")?;
    let chapters: Vec<RemoteChapter> = serde_json::from_str(&raw).context("parse snapshot json")?;
    Ok(chapters.into_iter().map(RemoteChapter::into_record).collect())
}

use std::io::Write as _;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::chapter::{ChapterDate, ChapterRecord};
use crate::cli::FetchArgs;
use crate::config::Config;
use crate::formats::FetchedChapter;

const CHAPTER_TITLE_SELECTOR: &str = "h5.chapter-title-rtl a";
const CHAPTER_DATE_SELECTOR: &str = "div.date-chapter-title-rtl";
const SERIES_TITLE_SELECTOR: &str = "h1, h2";

#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Vec<ChapterRecord>>;
}

#[derive(Debug, Clone)]
pub struct HttpChapterSource {
    client: reqwest::Client,
}

impl HttpChapterSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build chapter http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChapterSource for HttpChapterSource {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Vec<ChapterRecord>> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, concat!("comictrack/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: unexpected status {status}");
        }

        let html = response.text().await.context("read chapter page body")?;
        let page = parse_chapter_page(&html, url)?;
        tracing::debug!(
            %url,
            series = page.series.as_deref().unwrap_or("Unknown Series"),
            chapters = page.chapters.len(),
            "parsed chapter page"
        );
        Ok(page.chapters)
    }
}

#[derive(Debug, Clone)]
pub struct ChapterPage {
    pub series: Option<String>,
    pub chapters: Vec<ChapterRecord>,
}

/// Extracts chapter entries from an index page.
///
/// Title links and date cells are paired in document order; surplus elements
/// on either side are ignored. Relative links are resolved against `base`.
pub fn parse_chapter_page(html: &str, base: &Url) -> anyhow::Result<ChapterPage> {
    let title_selector = selector(CHAPTER_TITLE_SELECTOR)?;
    let date_selector = selector(CHAPTER_DATE_SELECTOR)?;
    let series_selector = selector(SERIES_TITLE_SELECTOR)?;

    let document = Html::parse_document(html);

    let series = document
        .select(&series_selector)
        .map(element_text)
        .find(|text| !text.is_empty());

    let chapters = document
        .select(&title_selector)
        .zip(document.select(&date_selector))
        .filter_map(|(title_el, date_el)| {
            let title = element_text(title_el);
            if title.is_empty() {
                return None;
            }
            let link = title_el
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .and_then(|href| base.join(href).ok())
                .map(String::from);
            let date = ChapterDate::parse_source(&element_text(date_el));
            Some(ChapterRecord::new(title, link, date))
        })
        .collect();

    Ok(ChapterPage { series, chapters })
}

/// Fetches every source in order, pairing each result with its source. A
/// failing source is logged and skipped.
pub async fn fetch_each(
    source: &dyn ChapterSource,
    urls: &[Url],
) -> Vec<(Url, Vec<ChapterRecord>)> {
    let mut pages = Vec::with_capacity(urls.len());
    for url in urls {
        match source.fetch(url).await {
            Ok(chapters) => {
                tracing::info!(%url, count = chapters.len(), "fetched chapters");
                pages.push((url.clone(), chapters));
            }
            Err(err) => {
                tracing::warn!(%url, ?err, "fetch failed; skipping source");
            }
        }
    }
    pages
}

pub async fn fetch_all(source: &dyn ChapterSource, urls: &[Url]) -> Vec<ChapterRecord> {
    fetch_each(source, urls)
        .await
        .into_iter()
        .flat_map(|(_, chapters)| chapters)
        .collect()
}

pub async fn run(config: &Config, args: FetchArgs) -> anyhow::Result<()> {
    let urls = if args.url.is_empty() {
        config.sources.clone()
    } else {
        args.url
            .iter()
            .map(|raw| Url::parse(raw).with_context(|| format!("parse --url {raw}")))
            .collect::<anyhow::Result<Vec<_>>>()?
    };
    if urls.is_empty() {
        anyhow::bail!("no sources configured; pass --url or set `sources` in config");
    }

    let source = HttpChapterSource::new(config.fetch_timeout())?;
    let pages = fetch_each(&source, &urls).await;
    let mut stdout = std::io::stdout().lock();
    for (url, chapters) in pages {
        for chapter in chapters {
            let line = FetchedChapter {
                source: url.to_string(),
                title: chapter.title,
                link: chapter.link,
                date: chapter.date.to_string(),
            };
            serde_json::to_writer(&mut stdout, &line).context("write fetched chapter json")?;
            stdout.write_all(b"\n").context("write fetched chapter newline")?;
        }
    }
    stdout.flush().context("flush stdout")?;
    Ok(())
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse css selector {css:?}: {err}"))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

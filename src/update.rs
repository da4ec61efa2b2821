use anyhow::Context as _;
use chrono::NaiveDateTime;

use crate::chapter::ChapterRecord;
use crate::cli::UpdateArgs;
use crate::config::Config;
use crate::fetch::{ChapterSource, HttpChapterSource};
use crate::notify::Notifier;
use crate::publish::GitPublisher;
use crate::reconcile::{reconcile, stamp_new};
use crate::store::RecordStore;

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub no_publish: bool,
    pub no_notify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub fetched: usize,
    pub stored: usize,
    pub newly_detected: Vec<ChapterRecord>,
    pub notified: bool,
    pub published: Option<bool>,
}

pub async fn run(config: Config, args: UpdateArgs) -> anyhow::Result<()> {
    let options = UpdateOptions {
        no_publish: args.no_publish,
        no_notify: args.no_notify,
    };
    let html_path = config.html_path.clone();
    let updater = Updater::from_config(config, &options)?;
    let summary = updater.run(chrono::Utc::now().naive_utc()).await?;

    println!(
        "{} new chapter(s), {} stored. See {}",
        summary.newly_detected.len(),
        summary.stored,
        html_path.display()
    );
    Ok(())
}

pub struct Updater {
    config: Config,
    source: Box<dyn ChapterSource>,
    notifier: Option<Box<dyn Notifier>>,
    publisher: Option<GitPublisher>,
}

impl Updater {
    pub fn from_config(config: Config, options: &UpdateOptions) -> anyhow::Result<Self> {
        let source = HttpChapterSource::new(config.fetch_timeout())?;
        let notifier = if options.no_notify {
            None
        } else {
            crate::notify::from_config(&config.notify)
        };
        let publisher = (config.publish.enabled && !options.no_publish)
            .then(|| GitPublisher::from_config(&config.publish));

        Ok(Self {
            config,
            source: Box::new(source),
            notifier,
            publisher,
        })
    }

    pub fn with_source(mut self, source: Box<dyn ChapterSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_notifier(mut self, notifier: Option<Box<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    /// One full pass: fetch, reconcile, save, render, notify, publish.
    ///
    /// Saving and rendering are fatal on failure; notify and publish are not.
    pub async fn run(&self, now: NaiveDateTime) -> anyhow::Result<UpdateSummary> {
        tracing::info!(sources = self.config.sources.len(), "update: fetch");
        let fetched = crate::fetch::fetch_all(self.source.as_ref(), &self.config.sources).await;
        let fetched_count = fetched.len();

        let store = RecordStore::new(&self.config.snapshot_path);
        let previous = store.load().context("load previous snapshot")?;

        tracing::info!(
            fetched = fetched_count,
            previous = previous.len(),
            "update: reconcile"
        );
        let mut reconciliation = reconcile(fetched, previous);
        stamp_new(&mut reconciliation.merged, now);

        store
            .save(&reconciliation.merged)
            .context("save snapshot")?;

        tracing::info!(path = %self.config.html_path.display(), "update: render");
        let document = crate::render::render(&reconciliation.merged, &self.config.page_title);
        crate::render::write_html(&self.config.html_path, &document).context("render html")?;

        let notified = match self.notifier.as_deref() {
            Some(notifier) => tokio::task::block_in_place(|| {
                crate::notify::notify_first_new(notifier, &reconciliation.newly_detected)
            }),
            None => false,
        };

        let published = self.publisher.as_ref().map(|publisher| {
            tracing::info!("update: publish");
            tokio::task::block_in_place(|| crate::publish::publish_logged(publisher))
        });

        tracing::info!(
            new = reconciliation.newly_detected.len(),
            stored = reconciliation.merged.len(),
            "update: done"
        );

        Ok(UpdateSummary {
            fetched: fetched_count,
            stored: reconciliation.merged.len(),
            newly_detected: reconciliation.newly_detected,
            notified,
            published,
        })
    }
}

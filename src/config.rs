use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use chrono::TimeDelta;
use serde::Deserialize;
use url::Url;

pub const ENV_SNAPSHOT_URL: &str = "COMICTRACK_SNAPSHOT_URL";
pub const ENV_REPO_PATH: &str = "COMICTRACK_REPO_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Comic index pages to scrape, in priority order.
    pub sources: Vec<Url>,
    pub snapshot_path: PathBuf,
    pub html_path: PathBuf,
    pub page_title: String,
    pub fetch_timeout_secs: u64,
    /// How long a detected chapter stays in the "new" section of the server.
    pub new_lifetime_hours: i64,
    pub publish: PublishConfig,
    pub notify: NotifyConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            snapshot_path: PathBuf::from("chapters.json"),
            html_path: PathBuf::from("comic_chapters.html"),
            page_title: "Comic Reading Order".to_owned(),
            fetch_timeout_secs: 30,
            new_lifetime_hours: 24,
            publish: PublishConfig::default(),
            notify: NotifyConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    pub enabled: bool,
    pub repo_path: PathBuf,
    pub commit_message: String,
    pub git_bin: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo_path: PathBuf::from("."),
            commit_message: "Auto-update comic chapters".to_owned(),
            git_bin: "git".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    Command,
    Log,
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub kind: NotifyKind,
    pub command: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            kind: NotifyKind::Command,
            command: "notify-send".to_owned(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Hosted copy of the snapshot file (for example a raw git URL).
    pub snapshot_url: Option<Url>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            snapshot_url: None,
        }
    }
}

impl Config {
    /// Reads a YAML config file, or returns defaults when no path is given.
    /// Environment overrides are applied on top either way.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("read config: {}", path.display()))?;
                Self::from_yaml(&yaml)
                    .with_context(|| format!("parse config: {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("deserialize config yaml")
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(raw) = non_empty_env(ENV_SNAPSHOT_URL) {
            let url = Url::parse(&raw).with_context(|| format!("parse {ENV_SNAPSHOT_URL}"))?;
            self.server.snapshot_url = Some(url);
        }
        if let Some(raw) = non_empty_env(ENV_REPO_PATH) {
            self.publish.repo_path = PathBuf::from(raw);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for source in &self.sources {
            if source.scheme() != "http" && source.scheme() != "https" {
                anyhow::bail!("source url must be http/https: {source}");
            }
        }
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be > 0");
        }
        if self.new_lifetime_hours < 0 {
            anyhow::bail!("new_lifetime_hours must not be negative");
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn new_lifetime(&self) -> TimeDelta {
        TimeDelta::hours(self.new_lifetime_hours)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

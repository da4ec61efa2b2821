use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::Context as _;

use crate::config::PublishConfig;

/// Commits the working tree of a local clone and pushes it.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    pub repo_path: PathBuf,
    pub commit_message: String,
    pub git_bin: String,
}

impl GitPublisher {
    pub fn from_config(config: &PublishConfig) -> Self {
        Self {
            repo_path: config.repo_path.clone(),
            commit_message: config.commit_message.clone(),
            git_bin: config.git_bin.clone(),
        }
    }

    /// `add .`, `commit -m`, `push`, stopping at the first failing step.
    pub fn publish(&self) -> anyhow::Result<()> {
        self.git(&["add", "."]).context("git add")?;
        self.git(&["commit", "-m", &self.commit_message])
            .context("git commit")?;
        self.git(&["push"]).context("git push")?;
        tracing::info!(repo = %self.repo_path.display(), "pushed changes");
        Ok(())
    }

    fn git(&self, args: &[&str]) -> anyhow::Result<()> {
        tracing::debug!(git = %self.git_bin, ?args, repo = %self.repo_path.display(), "git");
        let status = Command::new(&self.git_bin)
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("spawn {}", self.git_bin))?;
        if !status.success() {
            anyhow::bail!("{} {} failed ({status})", self.git_bin, args.join(" "));
        }
        Ok(())
    }
}

/// Publishes and logs the outcome. Never fails: local artifacts are already
/// written when this runs.
pub fn publish_logged(publisher: &GitPublisher) -> bool {
    match publisher.publish() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(?err, repo = %publisher.repo_path.display(), "publish failed");
            false
        }
    }
}

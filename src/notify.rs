use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::chapter::ChapterRecord;
use crate::config::{NotifyConfig, NotifyKind};

pub const NEW_CHAPTER_SUMMARY: &str = "New chapter!";
const NOTIFIER_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub summary: String,
    pub body: String,
}

impl Notification {
    pub fn new_chapter(record: &ChapterRecord) -> Self {
        Self {
            summary: NEW_CHAPTER_SUMMARY.to_owned(),
            body: format!("{} – {}", record.title, record.date),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Runs a desktop notification command, `notify-send` style:
/// `<bin> --expire-time <ms> <summary> <body>`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    pub bin: String,
    pub timeout: Duration,
}

impl Notifier for CommandNotifier {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let expire_ms = self.timeout.as_millis().to_string();
        tracing::debug!(bin = %self.bin, summary = %notification.summary, "send notification");

        let mut child = Command::new(&self.bin)
            .args(["--expire-time", &expire_ms])
            .arg(&notification.summary)
            .arg(&notification.body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("spawn notifier: {}", self.bin))?;

        // The display lifetime doubles as the wait limit.
        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().context("wait for notifier")? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                anyhow::bail!("notifier timed out after {:?}: {}", self.timeout, self.bin);
            }
            std::thread::sleep(NOTIFIER_POLL);
        };
        if !status.success() {
            anyhow::bail!("notifier failed: {} ({status})", self.bin);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        tracing::info!(summary = %notification.summary, body = %notification.body, "notification");
        Ok(())
    }
}

pub fn from_config(config: &NotifyConfig) -> Option<Box<dyn Notifier>> {
    match config.kind {
        NotifyKind::Command => Some(Box::new(CommandNotifier {
            bin: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })),
        NotifyKind::Log => Some(Box::new(LogNotifier)),
        NotifyKind::None => None,
    }
}

/// Announces the first newly detected chapter, if any. Delivery failures are
/// logged and never propagate. Returns whether a notification was delivered.
pub fn notify_first_new(notifier: &dyn Notifier, newly_detected: &[ChapterRecord]) -> bool {
    let Some(first) = newly_detected.first() else {
        return false;
    };
    match notifier.notify(&Notification::new_chapter(first)) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(?err, title = %first.title, "notification failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::chapter::ChapterDate;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl Notifier for Recorder {
        fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
            self.sent
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .push(notification.clone());
            if self.fail {
                anyhow::bail!("sink unavailable");
            }
            Ok(())
        }
    }

    fn chapter(title: &str) -> ChapterRecord {
        ChapterRecord::new(
            title,
            None,
            ChapterDate::Known(NaiveDate::from_ymd_opt(2025, 3, 7).expect("date")),
        )
    }

    #[test]
    fn only_first_new_chapter_is_announced() {
        let recorder = Recorder::default();
        assert!(notify_first_new(&recorder, &[chapter("Ch.2"), chapter("Ch.3")]));
        let expected = Notification {
            summary: "New chapter!".to_owned(),
            body: "Ch.2 – 07 March 2025".to_owned(),
        };
        assert_eq!(*recorder.sent.lock().expect("lock"), vec![expected]);
    }

    #[test]
    fn nothing_new_sends_nothing() {
        let recorder = Recorder::default();
        assert!(!notify_first_new(&recorder, &[]));
        assert!(recorder.sent.lock().expect("lock").is_empty());
    }

    #[test]
    fn delivery_failure_is_swallowed() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        assert!(!notify_first_new(&recorder, &[chapter("Ch.9")]));
        assert_eq!(recorder.sent.lock().expect("lock").len(), 1);
    }

    #[test]
    fn missing_notifier_binary_reports_error() {
        let notifier = CommandNotifier {
            bin: "comictrack-no-such-notifier".to_owned(),
            timeout: Duration::from_secs(1),
        };
        assert!(notifier.notify(&Notification::new_chapter(&chapter("x"))).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn hung_notifier_is_killed_after_timeout() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt as _;

        let temp = tempfile::TempDir::new()?;
        let script = temp.path().join("hang.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n")?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

        let notifier = CommandNotifier {
            bin: script.display().to_string(),
            timeout: Duration::from_millis(200),
        };
        let started = Instant::now();
        let err = notifier
            .notify(&Notification::new_chapter(&chapter("x")))
            .expect_err("must time out");
        assert!(format!("{err:#}").contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn config_kind_selects_notifier() {
        let mut config = NotifyConfig::default();
        assert!(from_config(&config).is_some());
        config.kind = NotifyKind::None;
        assert!(from_config(&config).is_none());
    }
}

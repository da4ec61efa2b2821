use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::chapter::ChapterRecord;
use crate::formats::StoredChapter;

/// The persisted snapshot: a single JSON array, rewritten whole on every save.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing snapshot is an empty collection, not an error.
    pub fn load(&self) -> anyhow::Result<Vec<ChapterRecord>> {
        let Some(stored) = read_json::<Vec<StoredChapter>>(&self.path)
            .with_context(|| format!("read snapshot: {}", self.path.display()))?
        else {
            tracing::info!(path = %self.path.display(), "no previous snapshot; starting empty");
            return Ok(Vec::new());
        };

        let records = stored
            .into_iter()
            .map(StoredChapter::into_record)
            .collect::<Vec<_>>();
        tracing::debug!(path = %self.path.display(), count = records.len(), "loaded snapshot");
        Ok(records)
    }

    pub fn save(&self, records: &[ChapterRecord]) -> anyhow::Result<()> {
        let stored = records.iter().map(StoredChapter::from).collect::<Vec<_>>();
        write_json_atomic(&self.path, &stored)
            .with_context(|| format!("write snapshot: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), count = stored.len(), "saved snapshot");
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let mut data = serde_json::to_vec_pretty(value).context("serialize json")?;
    data.push(b'\n');
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

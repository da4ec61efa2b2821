use serde::{Deserialize, Serialize};

use crate::chapter::{
    ChapterDate, ChapterRecord, UNKNOWN_DATE, format_timestamp, parse_timestamp,
};

/// One entry of the persisted `chapters.json` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChapter {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    pub date: String,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_timestamp: Option<String>,
}

impl StoredChapter {
    /// Loaded records start out not-new: freshness belongs to the current run.
    pub fn into_record(self) -> ChapterRecord {
        let link = self.link.filter(|link| !link.is_empty());
        ChapterRecord::new(self.title, link, ChapterDate::parse_stored(&self.date))
    }
}

impl From<&ChapterRecord> for StoredChapter {
    fn from(record: &ChapterRecord) -> Self {
        Self {
            title: record.title.clone(),
            link: Some(record.link.clone().unwrap_or_default()),
            date: record.date.to_string(),
            is_new: record.is_new,
            new_timestamp: record
                .new_timestamp
                .as_ref()
                .filter(|_| record.is_new)
                .map(format_timestamp),
        }
    }
}

/// One entry of the hosted snapshot read by the server. Looser than
/// [`StoredChapter`]: every field but `title` may be missing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChapter {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub new_timestamp: Option<String>,
}

impl RemoteChapter {
    pub fn into_record(self) -> ChapterRecord {
        let date = self
            .date
            .as_deref()
            .filter(|raw| *raw != UNKNOWN_DATE)
            .map_or(ChapterDate::Unknown, ChapterDate::parse_stored);
        ChapterRecord {
            title: self.title,
            link: self.link.filter(|link| !link.is_empty()),
            date,
            is_new: self.is_new,
            new_timestamp: self.new_timestamp.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Line written by `comictrack fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedChapter {
    pub source: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub date: String,
}

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Format used in the persisted snapshot and on the rendered page.
pub const STORED_DATE_FORMAT: &str = "%d %B %Y";
/// Format of `new_timestamp` values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const UNKNOWN_DATE: &str = "Unknown";

/// Formats seen on comic index pages, most common first.
const SOURCE_DATE_FORMATS: &[&str] = &["%d %b. %Y", "%d %b %Y", "%d %B %Y"];

/// Publication date of a chapter. `Unknown` sorts before every known date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChapterDate {
    Known(NaiveDate),
    Unknown,
}

impl ChapterDate {
    /// Parses a date as scraped from an index page (`05 Jan. 2024`).
    pub fn parse_source(raw: &str) -> Self {
        let raw = raw.trim();
        SOURCE_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .map_or(Self::Unknown, Self::Known)
    }

    /// Parses a date as written to the snapshot (`05 January 2024`).
    pub fn parse_stored(raw: &str) -> Self {
        NaiveDate::parse_from_str(raw.trim(), STORED_DATE_FORMAT)
            .map_or(Self::Unknown, Self::Known)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<NaiveDate> for ChapterDate {
    fn from(date: NaiveDate) -> Self {
        Self::Known(date)
    }
}

impl fmt::Display for ChapterDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(date) => write!(f, "{}", date.format(STORED_DATE_FORMAT)),
            Self::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

impl PartialOrd for ChapterDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChapterDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a.cmp(b),
            (Self::Unknown, Self::Unknown) => Ordering::Equal,
            (Self::Unknown, Self::Known(_)) => Ordering::Less,
            (Self::Known(_), Self::Unknown) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    /// Identity key: two records with the same title are the same chapter.
    pub title: String,
    pub link: Option<String>,
    pub date: ChapterDate,
    pub is_new: bool,
    /// When the chapter was first detected; only meaningful while `is_new`.
    pub new_timestamp: Option<NaiveDateTime>,
}

impl ChapterRecord {
    pub fn new(title: impl Into<String>, link: Option<String>, date: ChapterDate) -> Self {
        Self {
            title: title.into(),
            link,
            date,
            is_new: false,
            new_timestamp: None,
        }
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

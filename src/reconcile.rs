//! New-chapter detection.
//!
//! Two deliberately separate rules live here. [`reconcile`] is identity
//! based: a chapter is new when its title was absent from the previous
//! snapshot. [`classify`] is time based: a chapter stays new for a fixed
//! lifetime after it was first detected.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, TimeDelta};

use crate::chapter::ChapterRecord;

pub const DEFAULT_NEW_LIFETIME: TimeDelta = TimeDelta::days(1);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Known-date records sorted ascending by date; what gets persisted.
    pub merged: Vec<ChapterRecord>,
    /// First sighting of each unseen title, in fetch order.
    pub newly_detected: Vec<ChapterRecord>,
}

/// Merges a fresh fetch into the previous snapshot.
///
/// A fetched record replaces the previous record with the same title, except
/// that an unknown fetched date falls back to the previous date. Within one
/// fetch the first occurrence of a title wins; within `previous` the last one
/// does.
pub fn reconcile(fetched: Vec<ChapterRecord>, previous: Vec<ChapterRecord>) -> Reconciliation {
    let mut merged: Vec<ChapterRecord> = Vec::with_capacity(previous.len());
    let mut index_by_title: HashMap<String, usize> = HashMap::new();
    for record in previous {
        match index_by_title.get(&record.title).copied() {
            Some(idx) => {
                tracing::debug!(title = %record.title, "duplicate title in snapshot; keeping last");
                merged[idx] = record;
            }
            None => {
                index_by_title.insert(record.title.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    let previous_titles: HashSet<String> = index_by_title.keys().cloned().collect();
    let mut fetched_titles: HashSet<String> = HashSet::new();
    let mut newly_detected = Vec::new();

    for mut record in fetched {
        if !fetched_titles.insert(record.title.clone()) {
            tracing::debug!(title = %record.title, "duplicate title in fetch; keeping first");
            continue;
        }

        record.is_new = !previous_titles.contains(&record.title);
        if !record.is_new {
            record.new_timestamp = None;
        }
        if record.is_new {
            newly_detected.push(record.clone());
        }

        let existing = index_by_title.get(&record.title).copied();
        match existing {
            Some(idx) => {
                if !record.date.is_known() {
                    record.date = merged[idx].date;
                }
                merged[idx] = record;
            }
            None => {
                index_by_title.insert(record.title.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged.retain(|record| record.date.is_known());
    merged.sort_by(|a, b| a.date.cmp(&b.date));

    Reconciliation {
        merged,
        newly_detected,
    }
}

/// Records the detection time on new records and clears it on the rest.
pub fn stamp_new(records: &mut [ChapterRecord], at: NaiveDateTime) {
    for record in records {
        record.new_timestamp = record.is_new.then_some(at);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub new_section: Vec<ChapterRecord>,
    pub all_section: Vec<ChapterRecord>,
}

/// Splits a snapshot into still-new and everything else, as seen at `now`.
///
/// A record is new while `now - new_timestamp <= new_lifetime`; the boundary
/// is inclusive. Records without a timestamp are never new. Records that
/// land in `all_section` have `is_new` cleared.
pub fn classify(
    chapters: Vec<ChapterRecord>,
    now: NaiveDateTime,
    new_lifetime: TimeDelta,
) -> Classified {
    let mut out = Classified::default();
    for mut record in chapters {
        let still_new = record.is_new
            && record
                .new_timestamp
                .is_some_and(|ts| now.signed_duration_since(ts) <= new_lifetime);
        if still_new {
            out.new_section.push(record);
        } else {
            record.is_new = false;
            out.all_section.push(record);
        }
    }
    out
}

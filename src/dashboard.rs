//! Read side of the snapshot: cached loading plus the aggregates the
//! dashboard shows (headline metrics, category breakdown, timeline, filters).
//!
//! - The parsed file is memoized by (mtime, size); `invalidate()` forces a reload.
//! - A missing file is an empty data set with `missing = true`, not an error.
//! - Day buckets use the UTC date of `published`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use crate::ingest::types::NewsRecord;
use crate::sink::read_snapshot;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<NewsRecord>>,
    pub missing: bool,
    /// Modification time of the file the records came from.
    pub modified: Option<DateTime<Utc>>,
}

type FileKey = (SystemTime, u64);

#[derive(Debug)]
pub struct SnapshotCache {
    path: PathBuf,
    inner: RwLock<Option<(FileKey, Arc<Vec<NewsRecord>>)>>,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Option<(FileKey, Arc<Vec<NewsRecord>>)>> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Option<(FileKey, Arc<Vec<NewsRecord>>)>> {
        match self.inner.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    /// Current snapshot; re-reads the file only when it changed on disk.
    pub fn load(&self) -> Result<Snapshot> {
        let meta = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                *self.write_guard() = None;
                return Ok(Snapshot {
                    records: Arc::new(Vec::new()),
                    missing: true,
                    modified: None,
                });
            }
            Err(e) => {
                return Err(e).with_context(|| format!("stat {}", self.path.display()));
            }
        };
        let mtime = meta.modified().ok();
        let key = (mtime.unwrap_or(SystemTime::UNIX_EPOCH), meta.len());
        let modified = mtime.map(DateTime::<Utc>::from);

        if let Some((cached_key, records)) = self.read_guard().as_ref() {
            if *cached_key == key {
                return Ok(Snapshot {
                    records: Arc::clone(records),
                    missing: false,
                    modified,
                });
            }
        }

        let records = Arc::new(read_snapshot(&self.path)?);
        *self.write_guard() = Some((key, Arc::clone(&records)));
        tracing::debug!(path = %self.path.display(), rows = records.len(), "snapshot reloaded");
        Ok(Snapshot {
            records,
            missing: false,
            modified,
        })
    }

    pub fn invalidate(&self) {
        *self.write_guard() = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub today: usize,
    pub categories: usize,
    pub sources: usize,
    pub last_update: Option<DateTime<Utc>>,
}

pub fn summarize(records: &[NewsRecord], today: NaiveDate) -> Summary {
    let categories: HashSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let sources: HashSet<&str> = records.iter().map(|r| r.source.as_str()).collect();
    Summary {
        total: records.len(),
        today: records
            .iter()
            .filter(|r| r.published.is_some_and(|p| p.date_naive() == today))
            .count(),
        categories: categories.len(),
        sources: sources.len(),
        last_update: records.iter().filter_map(|r| r.published).max(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Count per category, largest first; ties by name.
pub fn category_breakdown(records: &[NewsRecord]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        let c = if r.category.trim().is_empty() {
            UNCATEGORIZED
        } else {
            r.category.as_str()
        };
        *counts.entry(c).or_default() += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: usize,
}

/// Articles per published day, oldest first. Undated rows are skipped.
pub fn timeline(records: &[NewsRecord]) -> Vec<DayCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for p in records.iter().filter_map(|r| r.published) {
        *days.entry(p.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(day, count)| DayCount { day, count })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub source: Option<String>,
    /// Case-insensitive substring match on title and description.
    pub q: Option<String>,
    pub since: Option<NaiveDate>,
}

fn wanted(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ArticleFilter {
    pub fn matches(&self, r: &NewsRecord) -> bool {
        if let Some(c) = wanted(&self.category) {
            if !r.category.eq_ignore_ascii_case(c) {
                return false;
            }
        }
        if let Some(s) = wanted(&self.source) {
            if !r.source.eq_ignore_ascii_case(s) {
                return false;
            }
        }
        if let Some(q) = wanted(&self.q) {
            let q = q.to_lowercase();
            if !r.title.to_lowercase().contains(&q) && !r.description.to_lowercase().contains(&q) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if !r.published.is_some_and(|p| p.date_naive() >= since) {
                return false;
            }
        }
        true
    }

    /// Matching records in file order.
    pub fn apply<'a>(&self, records: &'a [NewsRecord]) -> Vec<&'a NewsRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

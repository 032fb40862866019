// src/ingest/clean.rs
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::ingest::types::NewsRecord;

pub const DEFAULT_MAX_ARTICLES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CleanOptions {
    /// Strict: drop rows without a parsable timestamp or without a url.
    /// Permissive: keep them, timestamp stays null.
    pub strict_dates: bool,
    pub max_articles: usize,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            strict_dates: true,
            max_articles: DEFAULT_MAX_ARTICLES,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub dropped_invalid: usize,
    pub dropped_duplicates: usize,
    pub truncated: usize,
}

fn is_valid(rec: &NewsRecord, strict: bool) -> bool {
    if rec.title.trim().is_empty() {
        return false;
    }
    if strict && (rec.published.is_none() || rec.url.trim().is_empty()) {
        return false;
    }
    true
}

/// Newest first, nulls last. Equal keys keep input order (stable sort).
fn by_recency(a: &NewsRecord, b: &NewsRecord) -> Ordering {
    match (a.published, b.published) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Validate, dedup by title (first occurrence wins), sort by recency and
/// truncate to `max_articles`.
pub fn clean(candidates: Vec<NewsRecord>, opts: &CleanOptions) -> (Vec<NewsRecord>, CleanStats) {
    let mut stats = CleanStats::default();

    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(candidates.len());
    for rec in candidates {
        if !is_valid(&rec, opts.strict_dates) {
            stats.dropped_invalid += 1;
            continue;
        }
        if !seen_titles.insert(rec.title.clone()) {
            stats.dropped_duplicates += 1;
            continue;
        }
        kept.push(rec);
    }

    kept.sort_by(by_recency);

    if kept.len() > opts.max_articles {
        stats.truncated = kept.len() - opts.max_articles;
        kept.truncate(opts.max_articles);
    }

    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn rec(title: &str, url: &str, hour: Option<u32>) -> NewsRecord {
        NewsRecord {
            title: title.into(),
            description: String::new(),
            url: url.into(),
            source: "A".into(),
            published: hour.map(|h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()),
            category: "ETF".into(),
            image_url: None,
            date_loaded: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn strict_drops_missing_dates_and_urls() {
        let input = vec![
            rec("a", "https://x/a", Some(1)),
            rec("b", "", Some(2)),
            rec("c", "https://x/c", None),
            rec("", "https://x/d", Some(3)),
        ];
        let (out, stats) = clean(input, &CleanOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "a");
        assert_eq!(stats.dropped_invalid, 3);
    }

    #[test]
    fn permissive_keeps_nulls_last() {
        let input = vec![
            rec("undated", "", None),
            rec("early", "https://x/e", Some(1)),
            rec("late", "https://x/l", Some(5)),
        ];
        let opts = CleanOptions {
            strict_dates: false,
            max_articles: 10,
        };
        let (out, stats) = clean(input, &opts);
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["late", "early", "undated"]);
        assert_eq!(stats, CleanStats::default());
    }

    #[test]
    fn truncates_after_sorting() {
        let input = (0..5)
            .map(|h| rec(&format!("t{h}"), "https://x", Some(h)))
            .collect();
        let opts = CleanOptions {
            strict_dates: true,
            max_articles: 2,
        };
        let (out, stats) = clean(input, &opts);
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["t4", "t3"]);
        assert_eq!(stats.truncated, 3);
    }
}

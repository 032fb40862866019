// src/ingest/normalize.rs
//! Raw item -> canonical record. Nothing in here fails: missing fields
//! become empty strings or the `Unknown` sentinel.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::{NewsRecord, RawItem, UNKNOWN_SOURCE};

const DESCRIPTION_MAX_CHARS: usize = 1500;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M:%S",
];

/// Decode entities, drop anything tag-like, collapse whitespace.
pub fn strip_markup(s: &str) -> String {
    // Decode first so escaped tags (`&lt;b&gt;`) are removed too.
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]+>").unwrap());
    let out = re_tags.replace_all(&decoded, " ");

    collapse_whitespace(&out)
}

pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Best-effort timestamp parser. Naive values are taken as UTC.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond());
    }
    // chrono is more lenient with obsolete zone names ("GMT", "EST").
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(n.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map one raw item onto the canonical schema.
pub fn normalize_item(raw: RawItem, date_loaded: NaiveDate) -> NewsRecord {
    let published = raw
        .published_at
        .or_else(|| raw.published.as_deref().and_then(parse_published));

    let mut description = strip_markup(raw.summary.as_deref().unwrap_or_default());
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        description = description.chars().take(DESCRIPTION_MAX_CHARS).collect();
    }

    NewsRecord {
        title: strip_markup(raw.title.as_deref().unwrap_or_default()),
        description,
        url: non_empty(raw.link.as_deref()).unwrap_or_default(),
        source: non_empty(raw.source.as_deref()).unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        published,
        category: non_empty(raw.category.as_deref()).unwrap_or_default(),
        image_url: non_empty(raw.image_url.as_deref()),
        date_loaded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn strip_markup_removes_tags_and_entities() {
        let s = "<a href=\"x\">Sensex&nbsp;jumps</a>&nbsp;&nbsp;<font color=\"#6f6f6f\">ET</font>";
        assert_eq!(strip_markup(s), "Sensex jumps ET");
    }

    #[test]
    fn parses_rfc2822_with_gmt() {
        let dt = parse_published("Mon, 01 Jan 2024 10:00:00 GMT").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_and_naive_forms() {
        let want = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(parse_published("2024-01-01T09:00:00Z"), Some(want));
        assert_eq!(parse_published("2024-01-01T14:30:00+05:30"), Some(want));
        assert_eq!(parse_published("2024-01-01 09:00:00"), Some(want));
        assert_eq!(parse_published("2024-01-01T09:00:00"), Some(want));
        assert_eq!(
            parse_published("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_dates_are_none() {
        assert_eq!(parse_published("not-a-date"), None);
        assert_eq!(parse_published("   "), None);
    }

    #[test]
    fn structured_timestamp_wins_over_string() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let raw = RawItem {
            title: Some("Nifty closes higher".into()),
            published_at: Some(ts),
            published: Some("Tue, 02 Jan 2024 10:00:00 GMT".into()),
            ..RawItem::default()
        };
        assert_eq!(normalize_item(raw, day()).published, Some(ts));
    }

    #[test]
    fn missing_fields_get_fallbacks() {
        let rec = normalize_item(RawItem::default(), day());
        assert_eq!(rec.title, "");
        assert_eq!(rec.description, "");
        assert_eq!(rec.url, "");
        assert_eq!(rec.source, UNKNOWN_SOURCE);
        assert_eq!(rec.published, None);
        assert_eq!(rec.image_url, None);
        assert_eq!(rec.date_loaded, day());
    }

    #[test]
    fn long_descriptions_are_capped() {
        let raw = RawItem {
            summary: Some("x".repeat(2_000)),
            ..RawItem::default()
        };
        let rec = normalize_item(raw, day());
        assert_eq!(rec.description.chars().count(), DESCRIPTION_MAX_CHARS);
    }
}

// src/sink.rs
//! CSV snapshot writer/reader. One run replaces the whole file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::NewsRecord;

/// Column order of the output file; matches `NewsRecord`'s field order.
pub const CANONICAL_HEADER: [&str; 8] = [
    "title",
    "description",
    "url",
    "source",
    "published",
    "category",
    "image_url",
    "date_loaded",
];

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `records` to `path`, replacing whatever was there. An empty slice
/// still produces a header-only file.
pub fn write_snapshot(path: &Path, records: &[NewsRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = write_and_replace(&tmp, path, records) {
        if let Err(rm) = fs::remove_file(&tmp) {
            if rm.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %rm, path = %tmp.display(), "temp file left behind");
            }
        }
        return Err(e);
    }

    tracing::info!(path = %path.display(), rows = records.len(), "snapshot written");
    Ok(())
}

fn write_and_replace(tmp: &Path, path: &Path, records: &[NewsRecord]) -> Result<()> {
    {
        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(tmp)
            .with_context(|| format!("opening {}", tmp.display()))?;
        w.write_record(CANONICAL_HEADER)
            .context("writing csv header")?;
        for rec in records {
            w.serialize(rec).context("writing csv row")?;
        }
        w.flush().context("flushing csv")?;
    }
    fs::rename(tmp, path)
        .with_context(|| format!("replacing {} with {}", path.display(), tmp.display()))
}

/// Read a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Vec<NewsRecord>> {
    let mut r = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for row in r.deserialize() {
        let rec: NewsRecord = row.with_context(|| format!("reading {}", path.display()))?;
        out.push(rec);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample() -> Vec<NewsRecord> {
        vec![
            NewsRecord {
                title: "Sensex, Nifty end higher; \"IT\" leads".into(),
                description: "Markets rose, led by tech.\nSecond line".into(),
                url: "https://example.test/a".into(),
                source: "Mint".into(),
                published: Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
                category: "Stock market".into(),
                image_url: Some("https://img.example/a.jpg".into()),
                date_loaded: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            },
            NewsRecord {
                title: "Undated".into(),
                description: String::new(),
                url: String::new(),
                source: "Unknown".into(),
                published: None,
                category: "ETF".into(),
                image_url: None,
                date_loaded: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            },
        ]
    }

    #[test]
    fn empty_input_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("data").join("news.csv");
        write_snapshot(&p, &[]).unwrap();
        let text = fs::read_to_string(&p).unwrap();
        assert_eq!(text.trim_end(), CANONICAL_HEADER.join(","));
        assert!(read_snapshot(&p).unwrap().is_empty());
    }

    #[test]
    fn round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("news.csv");
        let recs = sample();
        write_snapshot(&p, &recs).unwrap();
        assert_eq!(read_snapshot(&p).unwrap(), recs);
        assert!(!temp_path(&p).exists());
    }

    #[test]
    fn second_write_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("news.csv");
        write_snapshot(&p, &sample()).unwrap();
        write_snapshot(&p, &sample()[..1]).unwrap();
        assert_eq!(read_snapshot(&p).unwrap().len(), 1);
    }

    #[test]
    fn failed_replace_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("news.csv");
        fs::create_dir_all(p.join("occupied")).unwrap();

        assert!(write_snapshot(&p, &sample()).is_err());
        assert!(!temp_path(&p).exists());
        assert!(p.join("occupied").is_dir());
    }
}

// src/ingest/mod.rs
pub mod clean;
pub mod config;
pub mod normalize;
pub mod providers;
pub mod types;

use chrono::{DateTime, NaiveDate, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::ingest::normalize::normalize_item;
use crate::ingest::types::{NewsRecord, Readiness, SourceAdapter};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Total items parsed from adapters.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Adapter fetch/parse errors."
        );
        describe_counter!(
            "ingest_skipped_providers_total",
            "Adapters skipped for missing credentials."
        );
        describe_counter!(
            "ingest_stale_total",
            "Items older than the adapter's lookback window."
        );
        describe_counter!(
            "ingest_dropped_invalid_total",
            "Records dropped for missing title/url/timestamp."
        );
        describe_counter!("ingest_dedup_total", "Records removed as duplicate titles.");
        describe_counter!(
            "ingest_truncated_total",
            "Records cut by the max article bound."
        );
        describe_counter!("ingest_kept_total", "Records written to the snapshot.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Records normalized from ready, successful adapters (before the recency window).
    pub fetched: usize,
    pub failed: usize,
    pub skipped: usize,
    pub stale: usize,
}

fn is_stale(rec: &NewsRecord, adapter: &dyn SourceAdapter, now: DateTime<Utc>) -> bool {
    let (Some(window), Some(ts)) = (adapter.lookback(), rec.published) else {
        return false;
    };
    match chrono::Duration::from_std(window) {
        Ok(w) => now.signed_duration_since(ts) > w,
        Err(_) => false,
    }
}

/// Run every ready adapter in order and normalize what they return.
/// A failing adapter contributes nothing; the others are unaffected.
pub async fn aggregate(
    adapters: &[Box<dyn SourceAdapter>],
    now: DateTime<Utc>,
    date_loaded: NaiveDate,
) -> (Vec<NewsRecord>, AggregateStats) {
    ensure_metrics_described();

    let mut stats = AggregateStats::default();
    let mut out = Vec::new();

    for a in adapters {
        if let Readiness::MissingCredential { var } = a.readiness() {
            tracing::info!(provider = a.name(), missing = %var, "skipping provider");
            counter!("ingest_skipped_providers_total").increment(1);
            stats.skipped += 1;
            continue;
        }

        let items = match a.fetch().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, provider = a.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                stats.failed += 1;
                continue;
            }
        };

        let mut kept = 0usize;
        let mut stale = 0usize;
        for raw in items {
            let rec = normalize_item(raw, date_loaded);
            stats.fetched += 1;
            if is_stale(&rec, a.as_ref(), now) {
                stale += 1;
                continue;
            }
            out.push(rec);
            kept += 1;
        }
        stats.stale += stale;
        counter!("ingest_stale_total").increment(stale as u64);
        tracing::info!(provider = a.name(), kept, stale, "provider done");
    }

    (out, stats)
}

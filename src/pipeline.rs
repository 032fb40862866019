// src/pipeline.rs
//! One run: aggregate -> clean -> persist.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use metrics::{counter, gauge};
use std::path::Path;

use crate::ingest::clean::{clean, CleanOptions, CleanStats};
use crate::ingest::config::FetchConfig;
use crate::ingest::providers::adapters_from_config;
use crate::ingest::types::SourceAdapter;
use crate::ingest::{aggregate, AggregateStats};
use crate::sink::write_snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Written { records: usize },
    /// Nothing survived; a header-only file was written.
    Empty,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Written { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub aggregate: AggregateStats,
    pub clean: CleanStats,
}

/// Run the pipeline over `adapters` as of `now`. Only persistence errors
/// are returned; source failures are absorbed by the aggregator.
pub async fn run_once_at(
    adapters: &[Box<dyn SourceAdapter>],
    opts: &CleanOptions,
    output: &Path,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let date_loaded = now.with_timezone(&Local).date_naive();
    let (candidates, agg) = aggregate(adapters, now, date_loaded).await;
    let (records, cleaned) = clean(candidates, opts);

    counter!("ingest_dropped_invalid_total").increment(cleaned.dropped_invalid as u64);
    counter!("ingest_dedup_total").increment(cleaned.dropped_duplicates as u64);
    counter!("ingest_truncated_total").increment(cleaned.truncated as u64);
    counter!("ingest_kept_total").increment(records.len() as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now.timestamp() as f64);

    write_snapshot(output, &records)
        .with_context(|| format!("persisting snapshot to {}", output.display()))?;

    let outcome = if records.is_empty() {
        RunOutcome::Empty
    } else {
        RunOutcome::Written {
            records: records.len(),
        }
    };

    tracing::info!(
        kept = records.len(),
        fetched = agg.fetched,
        failed = agg.failed,
        skipped = agg.skipped,
        stale = agg.stale,
        invalid = cleaned.dropped_invalid,
        dedup = cleaned.dropped_duplicates,
        truncated = cleaned.truncated,
        "run finished"
    );

    Ok(RunReport {
        outcome,
        aggregate: agg,
        clean: cleaned,
    })
}

pub async fn run_once(
    adapters: &[Box<dyn SourceAdapter>],
    opts: &CleanOptions,
    output: &Path,
) -> Result<RunReport> {
    run_once_at(adapters, opts, output, Utc::now()).await
}

/// Build adapters from `cfg` and run once.
pub async fn run_with_config(cfg: &FetchConfig) -> Result<RunReport> {
    let adapters = adapters_from_config(cfg)?;
    tracing::info!(
        adapters = adapters.len(),
        strict_dates = cfg.strict_dates,
        max_articles = cfg.max_articles,
        output = %cfg.output_path.display(),
        "starting run"
    );
    run_once(&adapters, &cfg.clean_options(), &cfg.output_path).await
}

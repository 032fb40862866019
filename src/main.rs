//! FinSight news fetcher — binary entrypoint.
//! `finsight` runs one fetch and rewrites the CSV snapshot;
//! `finsight serve` exposes that snapshot as read-only JSON.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use finsight::api::{self, AppState};
use finsight::cli::{Cli, Command, FetchArgs, ServeArgs};
use finsight::dashboard::SnapshotCache;
use finsight::ingest::config::{load_config_default, load_config_from, FetchConfig};
use finsight::logging::init_tracing;
use finsight::metrics::Metrics;
use finsight::pipeline::{run_with_config, RunOutcome};

const EXIT_EMPTY: u8 = 1;
const EXIT_FAILED: u8 = 2;

fn load_config(cli: &Cli) -> Result<FetchConfig> {
    match &cli.config {
        Some(p) => {
            let mut cfg = load_config_from(p)?;
            cfg.apply_env_overrides();
            Ok(cfg)
        }
        None => load_config_default(),
    }
}

async fn fetch(mut cfg: FetchConfig, args: &FetchArgs) -> ExitCode {
    args.apply(&mut cfg);
    match run_with_config(&cfg).await {
        Ok(report) => match report.outcome {
            RunOutcome::Written { records } => {
                tracing::info!(records, path = %cfg.output_path.display(), "FinSight data refreshed");
                ExitCode::SUCCESS
            }
            RunOutcome::Empty => {
                tracing::error!(
                    failed = report.aggregate.failed,
                    skipped = report.aggregate.skipped,
                    path = %cfg.output_path.display(),
                    "no articles obtained; wrote header-only snapshot"
                );
                ExitCode::from(EXIT_EMPTY)
            }
        },
        Err(e) => {
            tracing::error!(error = ?e, "run failed");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

async fn serve(cfg: FetchConfig, args: &ServeArgs) -> Result<()> {
    let path = args.file.clone().unwrap_or(cfg.output_path);
    let metrics = Metrics::init()?;
    let state = AppState::new(SnapshotCache::new(path.clone()));
    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    tracing::info!(addr = %args.addr, snapshot = %path.display(), "serving snapshot");
    axum::serve(listener, app).await.context("http server")
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "config error");
            return ExitCode::from(EXIT_FAILED);
        }
    };

    match &cli.command {
        None => fetch(cfg, &FetchArgs::default()).await,
        Some(Command::Fetch(args)) => fetch(cfg, args).await,
        Some(Command::Serve(args)) => match serve(cfg, args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = ?e, "serve failed");
                ExitCode::from(EXIT_FAILED)
            }
        },
    }
}

//! Command-line interface. With no subcommand the binary runs one fetch.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::ingest::config::FetchConfig;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Config file (TOML or JSON); overrides FINSIGHT_CONFIG_PATH
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Fetch all sources once and rewrite the CSV snapshot (default)
    Fetch(FetchArgs),
    /// Serve the snapshot as read-only JSON
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct FetchArgs {
    /// Output CSV path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep at most this many articles
    #[arg(long)]
    pub max_articles: Option<usize>,

    /// Keep rows with unparsable dates or no url instead of dropping them
    #[arg(long)]
    pub permissive: bool,
}

impl FetchArgs {
    pub fn apply(&self, cfg: &mut FetchConfig) {
        if let Some(o) = &self.output {
            cfg.output_path = o.clone();
        }
        if let Some(n) = self.max_articles.filter(|n| *n > 0) {
            cfg.max_articles = n;
        }
        if self.permissive {
            cfg.strict_dates = false;
        }
    }
}

#[derive(Args, Debug, PartialEq)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Snapshot to serve; defaults to the configured output path
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

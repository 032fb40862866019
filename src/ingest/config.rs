// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::clean::{CleanOptions, DEFAULT_MAX_ARTICLES};

pub const ENV_CONFIG_PATH: &str = "FINSIGHT_CONFIG_PATH";
pub const ENV_OUTPUT_PATH: &str = "FINSIGHT_OUTPUT_PATH";
pub const ENV_MAX_ARTICLES: &str = "FINSIGHT_MAX_ARTICLES";
pub const ENV_STRICT_DATES: &str = "FINSIGHT_STRICT_DATES";
pub const ENV_LOOKBACK_DAYS: &str = "FINSIGHT_LOOKBACK_DAYS";

pub const DEFAULT_CONFIG_TOML: &str = "config/finsight.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/finsight.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data/finance_news.csv";

const DEFAULT_TOPICS: &[&str] = &[
    "Mutual Fund India",
    "ETF",
    "IPO",
    "NPS",
    "Income Tax",
    "MOU Sign",
    "Stock market",
    "Gold",
    "Silver",
    "Commodity",
    "NSE",
    "BSE",
    "Nifty 50",
    "Nifty 100",
    "Nifty",
    "Stock price",
    "Intraday stock",
    "Pharma",
    "Pharmaceutical stocks",
    "Odisha Investment",
    "MOU Deal",
];

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}
fn default_max_articles() -> usize {
    DEFAULT_MAX_ARTICLES
}
fn default_true() -> bool {
    true
}
fn default_lookback_days() -> u32 {
    3
}
fn default_http_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    format!("finsight/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FetchConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "default_true")]
    pub strict_dates: bool,
    /// Recency window for topic-search feeds; 0 disables it.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub feeds: Vec<OutletFeedConfig>,
    #[serde(default)]
    pub news_api: NewsApiConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub hl: String,
    pub gl: String,
    pub ceid: String,
    pub topics: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com/rss/search".to_string(),
            hl: "en-IN".to_string(),
            gl: "IN".to_string(),
            ceid: "IN:en".to_string(),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutletFeedConfig {
    pub name: String,
    pub url: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsApiConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub category: String,
    pub country: String,
    pub page_size: u32,
    /// Name of the env var holding the key, never the key itself.
    pub api_key_env: String,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://newsapi.org/v2/top-headlines".to_string(),
            category: "business".to_string(),
            country: "in".to_string(),
            page_size: 50,
            api_key_env: "NEWS_API_KEY".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            max_articles: default_max_articles(),
            strict_dates: true,
            lookback_days: default_lookback_days(),
            http_timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
            search: SearchConfig::default(),
            feeds: Vec::new(),
            news_api: NewsApiConfig::default(),
        }
    }
}

impl FetchConfig {
    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            strict_dates: self.strict_dates,
            max_articles: self.max_articles,
        }
    }

    /// Apply `FINSIGHT_*` env overrides. Bad values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(p) = std::env::var(ENV_OUTPUT_PATH) {
            if !p.trim().is_empty() {
                self.output_path = PathBuf::from(p.trim());
            }
        }
        if let Some(v) = env_parsed::<usize>(ENV_MAX_ARTICLES) {
            self.max_articles = v;
        }
        if let Ok(raw) = std::env::var(ENV_STRICT_DATES) {
            match parse_bool(&raw) {
                Some(b) => self.strict_dates = b,
                None => tracing::warn!(var = ENV_STRICT_DATES, value = %raw, "ignoring bad env override"),
            }
        }
        if let Some(v) = env_parsed::<u32>(ENV_LOOKBACK_DAYS) {
            self.lookback_days = v;
        }
        self.sanitize();
    }

    fn sanitize(&mut self) {
        if self.max_articles == 0 {
            self.max_articles = DEFAULT_MAX_ARTICLES;
        }
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = default_http_timeout_secs();
        }
        self.search.topics = clean_list(std::mem::take(&mut self.search.topics));
    }
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring bad env override");
            None
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<FetchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.sanitize();
    Ok(cfg)
}

/// Load config using env var + fallbacks, then apply env overrides:
/// 1) $FINSIGHT_CONFIG_PATH
/// 2) config/finsight.toml
/// 3) config/finsight.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<FetchConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else if Path::new(DEFAULT_CONFIG_TOML).exists() {
        load_config_from(Path::new(DEFAULT_CONFIG_TOML))?
    } else if Path::new(DEFAULT_CONFIG_JSON).exists() {
        load_config_from(Path::new(DEFAULT_CONFIG_JSON))?
    } else {
        FetchConfig::default()
    };
    cfg.apply_env_overrides();
    Ok(cfg)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FetchConfig> {
    let looks_json = s.trim_start().starts_with('{');
    if hint_ext == "json" || (hint_ext != "toml" && looks_json) {
        return serde_json::from_str(s).context("invalid JSON config");
    }
    match toml::from_str(s) {
        Ok(cfg) => Ok(cfg),
        Err(e) if hint_ext != "toml" => {
            serde_json::from_str(s).map_err(|_| anyhow!("unsupported config format: {e}"))
        }
        Err(e) => Err(anyhow!(e).context("invalid TOML config")),
    }
}

/// Trim, drop empties and duplicates; keeps first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

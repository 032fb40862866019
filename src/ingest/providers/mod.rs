// src/ingest/providers/mod.rs
pub mod feed;
pub mod news_api;
pub mod rss;

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::ingest::config::FetchConfig;
use crate::ingest::types::SourceAdapter;
use feed::{OutletFeedAdapter, SearchFeedAdapter};
use news_api::NewsApiAdapter;

pub fn http_client(cfg: &FetchConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .user_agent(cfg.user_agent.clone())
        .build()
        .context("building http client")
}

pub(crate) async fn http_get_text(req: reqwest::RequestBuilder, provider: &str) -> Result<String> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("{provider}: http get"))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("{provider}: http status {status}");
    }
    resp.text()
        .await
        .with_context(|| format!("{provider}: reading body"))
}

/// Every adapter the config describes, in a stable order: topic searches,
/// outlet feeds, then the news API.
pub fn adapters_from_config(cfg: &FetchConfig) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let client = http_client(cfg)?;
    let lookback = (cfg.lookback_days > 0)
        .then(|| Duration::from_secs(u64::from(cfg.lookback_days) * 24 * 3600));

    let mut out: Vec<Box<dyn SourceAdapter>> = Vec::new();
    for topic in &cfg.search.topics {
        out.push(Box::new(
            SearchFeedAdapter::from_config(&cfg.search, topic, client.clone())
                .with_lookback(lookback),
        ));
    }
    for feed in &cfg.feeds {
        out.push(Box::new(OutletFeedAdapter::from_config(feed, client.clone())));
    }
    if cfg.news_api.enabled {
        out.push(Box::new(NewsApiAdapter::from_config(&cfg.news_api, client)));
    }
    Ok(out)
}

// src/ingest/providers/news_api.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;

use super::http_get_text;
use crate::ingest::config::NewsApiConfig;
use crate::ingest::types::{RawItem, Readiness, SourceAdapter};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    #[serde(default)]
    source: Option<ApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

enum Mode {
    Fixture(String),
    Http {
        cfg: NewsApiConfig,
        client: reqwest::Client,
    },
}

/// Structured news API (NewsAPI-compatible `articles[]` payload).
pub struct NewsApiAdapter {
    category: String,
    mode: Mode,
}

impl NewsApiAdapter {
    pub fn from_config(cfg: &NewsApiConfig, client: reqwest::Client) -> Self {
        Self {
            category: cfg.category.clone(),
            mode: Mode::Http {
                cfg: cfg.clone(),
                client,
            },
        }
    }

    pub fn from_fixture(category: &str, json: &str) -> Self {
        Self {
            category: category.to_string(),
            mode: Mode::Fixture(json.to_string()),
        }
    }

    fn api_key(cfg: &NewsApiConfig) -> Option<String> {
        std::env::var(&cfg.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    fn parse_articles(&self, body: &str) -> Result<Vec<RawItem>> {
        let resp: ApiResponse = serde_json::from_str(body).context("parsing news api json")?;
        if !resp.status.eq_ignore_ascii_case("ok") {
            return Err(anyhow!(
                "news api returned status '{}': {}",
                resp.status,
                resp.message.unwrap_or_default()
            ));
        }

        let out: Vec<RawItem> = resp
            .articles
            .into_iter()
            .map(|a| RawItem {
                title: a.title,
                summary: a.description,
                link: a.url,
                source: a.source.and_then(|s| s.name),
                published_at: a
                    .published_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                published: a.published_at,
                category: Some(self.category.clone()),
                image_url: a.url_to_image,
            })
            .collect();

        counter!("ingest_events_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn name(&self) -> &str {
        "news-api"
    }

    fn readiness(&self) -> Readiness {
        match &self.mode {
            Mode::Fixture(_) => Readiness::Ready,
            Mode::Http { cfg, .. } => match Self::api_key(cfg) {
                Some(_) => Readiness::Ready,
                None => Readiness::MissingCredential {
                    var: cfg.api_key_env.clone(),
                },
            },
        }
    }

    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Http { cfg, client } => {
                // Key may have vanished since readiness was checked.
                let Some(key) = Self::api_key(cfg) else {
                    return Ok(Vec::new());
                };
                let page_size = cfg.page_size.to_string();
                let req = client
                    .get(&cfg.endpoint)
                    .query(&[
                        ("category", cfg.category.as_str()),
                        ("country", cfg.country.as_str()),
                        ("pageSize", page_size.as_str()),
                    ])
                    .header("X-Api-Key", key);
                http_get_text(req, self.name()).await?
            }
        };
        self.parse_articles(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_is_a_source_failure() {
        let a = NewsApiAdapter::from_fixture("business", "");
        let err = a
            .parse_articles(r#"{"status":"error","code":"apiKeyInvalid","message":"bad key"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn missing_key_means_not_ready() {
        let cfg = NewsApiConfig {
            api_key_env: "FINSIGHT_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..NewsApiConfig::default()
        };
        let a = NewsApiAdapter::from_config(&cfg, reqwest::Client::new());
        assert_eq!(
            a.readiness(),
            Readiness::MissingCredential {
                var: "FINSIGHT_TEST_KEY_THAT_IS_NEVER_SET".into()
            }
        );
    }
}

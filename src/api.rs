use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use tower_http::cors::CorsLayer;

use crate::dashboard::{
    category_breakdown, summarize, timeline, ArticleFilter, CategoryCount, DayCount, Snapshot,
    SnapshotCache, Summary,
};
use crate::ingest::types::NewsRecord;

const DEFAULT_ARTICLE_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    cache: Arc<SnapshotCache>,
}

impl AppState {
    pub fn new(cache: SnapshotCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }
}

type ApiError = (StatusCode, String);

fn load(state: &AppState) -> Result<Snapshot, ApiError> {
    state.cache.load().map_err(|e| {
        tracing::warn!(error = ?e, path = %state.cache.path().display(), "snapshot load failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to load snapshot: {e:#}"),
        )
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/summary", get(summary))
        .route("/api/articles", get(articles))
        .route("/api/categories", get(categories))
        .route("/api/timeline", get(days))
        .route("/api/export.csv", get(export_csv))
        .route("/admin/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct SummaryOut {
    /// True when the fetch step has not produced a file yet.
    missing: bool,
    /// When the snapshot file was last written.
    file_modified: Option<DateTime<Utc>>,
    #[serde(flatten)]
    summary: Summary,
}

async fn summary(State(state): State<AppState>) -> Result<Json<SummaryOut>, ApiError> {
    let snap = load(&state)?;
    let today = Utc::now().date_naive();
    Ok(Json(SummaryOut {
        missing: snap.missing,
        file_modified: snap.modified,
        summary: summarize(&snap.records, today),
    }))
}

#[derive(serde::Deserialize)]
struct ArticlesQuery {
    category: Option<String>,
    source: Option<String>,
    q: Option<String>,
    since: Option<NaiveDate>,
    limit: Option<usize>,
}

async fn articles(
    State(state): State<AppState>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Json<Vec<NewsRecord>>, ApiError> {
    let snap = load(&state)?;
    let filter = ArticleFilter {
        category: query.category,
        source: query.source,
        q: query.q,
        since: query.since,
    };
    let limit = query.limit.unwrap_or(DEFAULT_ARTICLE_LIMIT);
    let out = filter
        .apply(&snap.records)
        .into_iter()
        .take(limit)
        .cloned()
        .collect();
    Ok(Json(out))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    let snap = load(&state)?;
    Ok(Json(category_breakdown(&snap.records)))
}

async fn days(State(state): State<AppState>) -> Result<Json<Vec<DayCount>>, ApiError> {
    let snap = load(&state)?;
    Ok(Json(timeline(&snap.records)))
}

/// The snapshot file as written by the fetch step.
async fn export_csv(
    State(state): State<AppState>,
) -> Result<([(HeaderName, String); 2], Vec<u8>), ApiError> {
    let path = state.cache.path();
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err((StatusCode::NOT_FOUND, "no snapshot has been written yet".into()));
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "snapshot export failed");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read snapshot: {e}"),
            ));
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_else(|| "finance_news.csv".into());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    ))
}

async fn refresh(State(state): State<AppState>) -> Result<String, ApiError> {
    state.cache.invalidate();
    let snap = load(&state)?;
    Ok(format!("reloaded {} articles", snap.records.len()))
}

//! HTTP server for the assistant and the public knowledge base.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/assistant` | Run one assistant turn |
//! | `GET`  | `/articles` | Browse public articles (`?category=`, `?limit=`) |
//! | `GET`  | `/articles/{id}` | Read one public article; counts a view |
//! | `DELETE` | `/interactions/{session_id}` | Delete a session's interaction records |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": "An error occurred processing your request", "details": "completion service timed out after 30s" }
//! ```
//!
//! Input errors are 400 with no `details`. Fatal turn errors are 500 with the
//! generic message and the underlying cause in `details`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser chat clients
//! can call the API directly.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use civic_assist_core::error::{AssistError, GENERIC_FAILURE};
use civic_assist_core::models::{Article, ArticleFilter};
use civic_assist_core::store::{AnalyticsSink, ArticleStore};

use crate::articles::view_article;
use crate::assistant::{build_assistant, Assistant, AssistantRequest, AssistantResponse};
use crate::config::Config;
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

/// Shared state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    assistant: Assistant,
    store: Arc<dyn ArticleStore>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl AppState {
    pub fn new(
        assistant: Assistant,
        store: Arc<dyn ArticleStore>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            assistant,
            store,
            analytics,
        }
    }
}

/// Build the router with CORS and request tracing applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/assistant", post(handle_assistant))
        .route("/articles", get(handle_list_articles))
        .route("/articles/{id}", get(handle_get_article))
        .route("/interactions/{session_id}", delete(handle_forget))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until Ctrl-C.
///
/// Applies migrations first, so a fresh database path is usable directly.
/// On shutdown, queued interaction records are written before returning.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let store = SqliteStore::new(pool.clone());
    let assistant = build_assistant(config, store.clone())?;
    let logger = assistant.logger().clone();
    let state = AppState::new(assistant, Arc::new(store.clone()), Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        provider = %config.completion.provider,
        "civic assist server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    logger.shutdown().await;
    pool.close().await;
    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AssistError> for AppError {
    fn from(e: AssistError) -> Self {
        AppError {
            status: StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            error: e.public_message().to_string(),
            details: e.details(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: GENERIC_FAILURE.to_string(),
            details: Some(e.to_string()),
        }
    }
}

fn bad_request(message: impl Into<String>, details: Option<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        error: message.into(),
        details,
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        error: message.into(),
        details: None,
    }
}

// ============ POST /assistant ============

async fn handle_assistant(
    State(state): State<AppState>,
    payload: Result<Json<AssistantRequest>, JsonRejection>,
) -> Result<Json<AssistantResponse>, AppError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "rejecting malformed assistant request");
        AppError::from(AssistError::InvalidQuery)
    })?;

    let response = state.assistant.answer(request).await?;
    Ok(Json(response))
}

// ============ GET /articles ============

#[derive(Debug, Deserialize)]
struct ListParams {
    category: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ArticleListResponse {
    articles: Vec<Article>,
}

async fn handle_list_articles(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ArticleListResponse>, AppError> {
    let Query(params) =
        params.map_err(|e| bad_request("Invalid query parameters", Some(e.body_text())))?;

    let filter = ArticleFilter {
        category: params.category.filter(|c| !c.trim().is_empty()),
        limit: params.limit,
    };
    let articles = state.store.list_articles(&filter).await?;
    Ok(Json(ArticleListResponse { articles }))
}

// ============ GET /articles/{id} ============

async fn handle_get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, AppError> {
    match view_article(state.store.as_ref(), &id).await? {
        Some(article) => Ok(Json(article)),
        None => Err(not_found("Article not found")),
    }
}

// ============ DELETE /interactions/{session_id} ============

#[derive(Serialize)]
struct ForgetResponse {
    deleted: u64,
}

async fn handle_forget(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ForgetResponse>, AppError> {
    let deleted = state.analytics.delete_interactions(&session_id).await?;
    tracing::info!(deleted, "interaction records deleted for session");
    Ok(Json(ForgetResponse { deleted }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

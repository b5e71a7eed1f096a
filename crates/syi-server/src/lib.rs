//! Read-only query surface over the Time-Series Store (§6.2) plus the
//! process entrypoint. Deliberately thin — auth, rate limiting and
//! webhooks are out of scope here — it exists to make the store's query
//! contract testable end-to-end.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use syi_core::{IndexCode, IndexValue};
use syi_scheduler::Scheduler;
use timeseries_store::Store;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod routes;

/// Wraps a stored `IndexValue` with the §4.5/§7/§8 staleness check the
/// store itself never computes (`observed_at` is frozen at publish time;
/// "has this gone stale" is relative to *now*, not something the record
/// can carry on its own). `is_stale` is `true` once `now - observed_at`
/// exceeds the index's configured `hard_staleness`.
#[derive(Debug, Serialize)]
pub struct IndexValueResponse {
    #[serde(flatten)]
    pub value: IndexValue,
    pub is_stale: bool,
}

impl IndexValueResponse {
    pub fn new(value: IndexValue, hard_staleness: chrono::Duration) -> Self {
        let is_stale = Utc::now() - value.observed_at > hard_staleness;
        Self { value, is_stale }
    }
}

/// Shared, cheaply-`Clone`-able handle every route gets via `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub scheduler: Arc<Scheduler>,
}

/// Uniform response envelope shared by every route in this router.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Wraps any handler failure into a JSON error body with the right status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Parses a path segment into an `IndexCode`, the uniform way every route
/// that takes `:code` does it.
pub fn parse_index_code(raw: &str) -> Result<IndexCode, AppError> {
    match raw.to_ascii_uppercase().as_str() {
        "SYI" => Ok(IndexCode::Syi),
        "SYC" => Ok(IndexCode::Syc),
        "SYCEFI" => Ok(IndexCode::Sycefi),
        "SYDEFI" => Ok(IndexCode::Sydefi),
        "SYRPI" => Ok(IndexCode::Syrpi),
        other => Err(AppError::BadRequest(format!("unknown index code {other:?}"))),
    }
}

/// Assembles the full router over every route module, with CORS and
/// request tracing layered on top.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::index_routes())
        .merge(routes::symbol_routes())
        .merge(routes::regime_routes())
        .merge(routes::scheduler_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

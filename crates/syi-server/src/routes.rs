use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use syi_core::{Constituent, LiquidityMetrics, PegMetrics, RAYRecord, RegimeSample};
use timeseries_store::{IndexRangeResult, IndexStatistics};

use crate::{parse_index_code, ApiResponse, AppError, AppState, IndexValueResponse};

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub max_points: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_stats_days")]
    pub days: i64,
}

fn default_stats_days() -> i64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct SymbolRangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegimeHistoryQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub limit: Option<usize>,
}

pub fn index_routes() -> Router<AppState> {
    Router::new()
        .route("/api/index/:code/latest", get(latest_index_value))
        .route("/api/index/:code/range", get(index_range))
        .route("/api/index/:code/constituents", get(index_constituents))
        .route("/api/index/:code/statistics", get(index_statistics))
}

pub fn symbol_routes() -> Router<AppState> {
    Router::new()
        .route("/api/symbols/:symbol/peg", get(symbol_peg_metrics))
        .route("/api/symbols/:symbol/liquidity", get(symbol_liquidity_metrics))
        .route("/api/symbols/:symbol/ray", get(symbol_ray_series))
}

pub fn regime_routes() -> Router<AppState> {
    Router::new()
        .route("/api/regime/:code/state", get(regime_state))
        .route("/api/regime/:code/history", get(regime_history))
}

pub fn scheduler_routes() -> Router<AppState> {
    Router::new().route("/api/scheduler/:code/status", get(scheduler_status))
}

async fn latest_index_value(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<ApiResponse<IndexValueResponse>>, AppError> {
    let code = parse_index_code(&code)?;
    let value = state
        .store
        .latest_index_value(code)
        .ok_or_else(|| AppError::NotFound(format!("no index value published yet for {code}")))?;
    let hard_staleness = state.scheduler.config().compositor_config(code).hard_staleness;
    Ok(Json(ApiResponse::success(IndexValueResponse::new(value, hard_staleness))))
}

async fn index_range(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ApiResponse<IndexRangeResult>>, AppError> {
    let code = parse_index_code(&code)?;
    if query.from > query.to {
        return Err(AppError::BadRequest("from must not be after to".into()));
    }
    let result = state.store.index_range(code, query.from, query.to, query.max_points);
    Ok(Json(ApiResponse::success(result)))
}

async fn index_constituents(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<ApiResponse<Vec<Constituent>>>, AppError> {
    let code = parse_index_code(&code)?;
    let value = state
        .store
        .latest_index_value(code)
        .ok_or_else(|| AppError::NotFound(format!("no index value published yet for {code}")))?;
    Ok(Json(ApiResponse::success(value.constituents)))
}

async fn index_statistics(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<IndexStatistics>>, AppError> {
    let code = parse_index_code(&code)?;
    if query.days <= 0 {
        return Err(AppError::BadRequest("days must be positive".into()));
    }
    let stats = state.store.index_statistics(code, query.days, Utc::now());
    Ok(Json(ApiResponse::success(stats)))
}

async fn symbol_peg_metrics(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SymbolRangeQuery>,
) -> Result<Json<ApiResponse<Vec<PegMetrics>>>, AppError> {
    let series = state.store.peg_metrics_range(&symbol, query.from, query.to);
    Ok(Json(ApiResponse::success(series)))
}

async fn symbol_liquidity_metrics(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SymbolRangeQuery>,
) -> Result<Json<ApiResponse<Vec<LiquidityMetrics>>>, AppError> {
    let series = state.store.liquidity_metrics_range(&symbol, query.from, query.to);
    Ok(Json(ApiResponse::success(series)))
}

async fn symbol_ray_series(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SymbolRangeQuery>,
) -> Result<Json<ApiResponse<Vec<RAYRecord>>>, AppError> {
    let series = state.store.ray_range_for_symbol(&symbol, query.from, query.to);
    Ok(Json(ApiResponse::success(series)))
}

async fn regime_state(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<ApiResponse<RegimeSample>>, AppError> {
    let code = parse_index_code(&code)?;
    let sample = state
        .store
        .latest_regime_sample(code)
        .ok_or_else(|| AppError::NotFound(format!("no regime sample recorded yet for {code}")))?;
    Ok(Json(ApiResponse::success(sample)))
}

async fn regime_history(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<RegimeHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<RegimeSample>>>, AppError> {
    let code = parse_index_code(&code)?;
    if query.from > query.to {
        return Err(AppError::BadRequest("from must not be after to".into()));
    }
    let history = state.store.regime_history(code, query.from, query.to, query.limit);
    Ok(Json(ApiResponse::success(history)))
}

async fn scheduler_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<syi_scheduler::SchedulerStatus>>, AppError> {
    let code = parse_index_code(&code)?;
    let status = state.scheduler.status(code).unwrap_or_default();
    Ok(Json(ApiResponse::success(status)))
}

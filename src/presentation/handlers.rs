// HTTP request handlers
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_DAYS: u32 = 7;
const MAX_DAYS: u32 = 366;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub days: Option<u32>,
}

async fn respond<T: Serialize>(data: &T, headers: &HeaderMap) -> Response {
    match json_response(StatusCode::OK, data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all tanks
pub async fn list_tanks(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let tanks = state.tank_service.list_tanks().await?;
    Ok(respond(&tanks, &headers).await)
}

/// Daily summaries for a tank over the requested window
pub async fn tank_daily_usage(
    Path(id): Path<String>,
    query: Result<Query<RangeQuery>, QueryRejection>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}, got {}",
            MAX_DAYS, days
        )));
    }

    let usage = state.billing_service.daily_usage(&id, days).await?;
    Ok(respond(&usage, &headers).await)
}

/// Current-month bill for a tank
pub async fn monthly_bill(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let bill = state.billing_service.monthly_bill(&id).await?;
    Ok(respond(&bill, &headers).await)
}

/// Summaries and bill for an uploaded `{ records, capacity }` payload
pub async fn summarize_records(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let records = body.get("records").unwrap_or(&Value::Null);
    let capacity = body.get("capacity").unwrap_or(&Value::Null);

    let report = state.billing_service.summarize_raw(records, capacity);
    respond(&report, &headers).await
}

// Presentation layer - HTTP routes and handlers
pub mod app_state;
pub mod error;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_tanks, monthly_bill, summarize_records, tank_daily_usage,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/tanks", get(list_tanks))
        .route("/api/tanks/:id/daily", get(tank_daily_usage))
        .route("/api/tanks/:id/bill", get(monthly_bill))
        .route("/api/billing/summarize", post(summarize_records))
        .with_state(state)
}

//! Persisted pattern handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Local;
use serde::Deserialize;

use crate::{get_user, AppError, AppState, MAX_UPCOMING_DAYS};
use recur_core::{
    forecast::{monthly_equivalents, upcoming, MonthlySummary},
    models::RecurringPattern,
};

/// Query params for the upcoming window
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    /// Horizon in days; parsed by hand so bad values get a JSON error
    pub days: Option<String>,
}

/// GET /api/patterns - List the caller's patterns
pub async fn list_patterns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<RecurringPattern>>, AppError> {
    let user = get_user(&headers);
    Ok(Json(state.db.list_patterns(&user)?))
}

/// GET /api/patterns/:merchant_key - One of the caller's patterns
pub async fn get_pattern(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(merchant_key): Path<String>,
) -> Result<Json<RecurringPattern>, AppError> {
    let user = get_user(&headers);
    state
        .db
        .get_pattern(&user, &merchant_key)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("No pattern for {}", merchant_key)))
}

/// GET /api/patterns/upcoming - Patterns due within `days`
///
/// `days` defaults to the policy's horizon (30 unless overridden).
pub async fn upcoming_patterns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<RecurringPattern>>, AppError> {
    let days = match query.days.as_deref() {
        None => state.detector.policy().upcoming_horizon_days,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|d| *d <= MAX_UPCOMING_DAYS)
            .ok_or_else(|| {
                AppError::bad_request(&format!(
                    "days must be between 0 and {}",
                    MAX_UPCOMING_DAYS
                ))
            })?,
    };

    let user = get_user(&headers);
    let patterns = state.db.list_patterns(&user)?;
    let today = Local::now().date_naive();

    Ok(Json(upcoming(&patterns, today, days)))
}

/// GET /api/patterns/monthly - Monthly-equivalent cost of each pattern
pub async fn monthly_patterns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MonthlySummary>, AppError> {
    let user = get_user(&headers);
    let patterns = state.db.list_patterns(&user)?;
    Ok(Json(monthly_equivalents(&patterns)))
}

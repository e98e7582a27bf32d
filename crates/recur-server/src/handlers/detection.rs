//! Detection handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use tracing::debug;

use super::transactions::parse_inputs;
use crate::{get_user, AppError, AppState};
use recur_core::{
    models::{RecurringPattern, TransactionRecord},
    refresh::{refresh_patterns, RefreshSummary},
};

/// POST /api/detect - Detect patterns in the posted transactions
///
/// Nothing is stored. Entries with no merchant or description are skipped.
pub async fn run_detection(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Vec<RecurringPattern>>, AppError> {
    let inputs = parse_inputs(&body)?;

    let records: Vec<TransactionRecord> = inputs
        .iter()
        .filter_map(|input| {
            TransactionRecord::from_input(input)
                .map_err(|e| debug!(error = %e, "Skipping transaction"))
                .ok()
        })
        .collect();

    Ok(Json(state.detector.detect(&records)))
}

/// POST /api/patterns/refresh - Re-detect the caller's stored patterns
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RefreshSummary>, AppError> {
    let user = get_user(&headers);
    let summary = refresh_patterns(&state.db, &state.db, &state.detector, &user)?;
    Ok(Json(summary))
}

//! Transaction storage handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::{debug, info};

use crate::{get_user, AppError, AppState};
use recur_core::{import::prepare_transaction, models::TransactionInput};

/// Transaction upload response
#[derive(Debug, Serialize)]
pub struct AddTransactionsResponse {
    pub inserted: usize,
    pub duplicates: usize,
    /// Entries with no merchant or description, or a non-positive amount
    pub rejected: usize,
}

/// Decode a JSON array of transaction inputs
pub(crate) fn parse_inputs(body: &Bytes) -> Result<Vec<TransactionInput>, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejected transaction body");
        AppError::bad_request(&format!("Invalid transaction list: {}", e))
    })
}

/// POST /api/transactions - Store transactions for the caller
pub async fn add_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddTransactionsResponse>, AppError> {
    let user = get_user(&headers);
    let inputs = parse_inputs(&body)?;

    let mut prepared = Vec::with_capacity(inputs.len());
    let mut rejected = 0;
    for input in &inputs {
        match prepare_transaction(&user, input) {
            Ok(tx) => prepared.push(tx),
            Err(e) => {
                debug!(error = %e, "Rejected transaction");
                rejected += 1;
            }
        }
    }

    let summary = state.db.insert_transactions(&user, &prepared)?;

    info!(
        user = %user,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected,
        "Stored transactions"
    );

    Ok(Json(AddTransactionsResponse {
        inserted: summary.inserted,
        duplicates: summary.duplicates,
        rejected,
    }))
}

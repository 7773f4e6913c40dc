//! HTTP handlers: transfer intake, status/history/balance queries, health.
//!
//! The principal (`fromOwner`) arrives already validated by the upstream
//! auth layer; this surface trusts it.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::response::{ApiError, ApiResult, error_codes, ok};
use super::state::AppState;
use crate::core_types::TransferId;
use crate::transfer::types::{HistoryEntry, Transfer};
use crate::transfer::{SubmitRequest, TransferError};

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// `POST /api/v1/transfer` body. The recipient is named either by owner
/// alias (`toOwner`) or by the account-pair
/// (`toRoutingId` + `toAccountNumber`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub from_owner: String,
    #[serde(default)]
    pub to_owner: Option<String>,
    #[serde(default)]
    pub to_routing_id: Option<String>,
    #[serde(default)]
    pub to_account_number: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferResponse {
    pub transfer_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStatusResponse {
    pub transfer_id: String,
    pub status: String,
    pub amount: Decimal,
    pub to_routing_id: String,
    pub to_account_number: String,
    pub to_owner_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<Transfer> for TransferStatusResponse {
    fn from(t: Transfer) -> Self {
        Self {
            transfer_id: t.id.to_string(),
            status: t.status.to_string(),
            amount: t.amount,
            to_routing_id: t.to_routing_id,
            to_account_number: t.to_account_number,
            to_owner_name: t.to_owner_name,
            created_at: t.created_at,
            processed_at: t.processed_at,
            error_message: t.error_message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub owner: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create transfer endpoint.
///
/// `POST /api/v1/transfer`
///
/// Returns immediately with the Pending record; settlement happens
/// asynchronously and the outcome is pushed over `/ws` or polled.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransferRequest>,
) -> ApiResult<CreateTransferResponse> {
    let submit = SubmitRequest {
        from_owner: req.from_owner,
        to_owner: req.to_owner,
        to_routing_id: req.to_routing_id,
        to_account_number: req.to_account_number,
        amount: req.amount,
        currency: req.currency,
    };

    match state.intake.submit(submit).await {
        Ok(transfer) => ok(CreateTransferResponse {
            transfer_id: transfer.id.to_string(),
            status: transfer.status.to_string(),
            message: "transfer accepted for settlement".to_string(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Transfer rejected at intake");
            ApiError::from(e).into_err()
        }
    }
}

/// Transfer status query.
///
/// `GET /api/v1/transfer/{id}` — 404 when the id is unknown to both the
/// intake cache and the store.
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<TransferStatusResponse> {
    let transfer_id: TransferId = id
        .parse()
        .map_err(|_| ApiError::bad_request("invalid transfer id format"))?;

    match state.intake.resolve_status(&transfer_id) {
        Some(record) => ok(record.into()),
        None => ApiError::from(TransferError::TransferNotFound(id)).into_err(),
    }
}

/// Per-owner transaction history, most recent first.
///
/// `GET /api/v1/history/{owner}` — empty list when there is none, never an
/// error.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> ApiResult<Vec<HistoryEntry>> {
    ok(state.store.get_history(&owner))
}

/// Balance query: store snapshot first, live ledger view as fallback.
///
/// `GET /api/v1/balance/{owner}`
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> ApiResult<BalanceResponse> {
    let balance = state
        .store
        .get_balance(&owner)
        .or_else(|| state.ledger.balance_of(&owner));

    match balance {
        Some(balance) => ok(BalanceResponse { owner, balance }),
        None => ApiError::not_found(error_codes::OWNER_NOT_FOUND, "owner not found").into_err(),
    }
}

/// Liveness probe.
///
/// `GET /health`
pub async fn health() -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
    })
}

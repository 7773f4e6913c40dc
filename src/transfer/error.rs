//! Transfer error types.
//!
//! Validation errors are rejected synchronously at intake and never enter
//! the queue; resolution and business-rule failures become Failed status on
//! the record; infrastructure errors surface as 500-class responses.

use thiserror::Error;

use super::queue::QueueError;
use crate::ledger::LedgerError;

/// Transfer error taxonomy for intake and queries.
#[derive(Debug, Clone, Error)]
pub enum TransferError {
    // === Validation errors (never enqueued) ===
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("recipient is required")]
    MissingRecipient,

    // === Resolution / business-rule errors ===
    #[error("recipient not found")]
    RecipientNotFound,

    #[error("sender not found")]
    SenderNotFound,

    #[error("insufficient balance")]
    InsufficientBalance,

    // === Query errors ===
    #[error("transfer not found: {0}")]
    TransferNotFound(String),

    // === Infrastructure errors ===
    #[error("transfer queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::MissingRecipient => "MISSING_RECIPIENT",
            TransferError::RecipientNotFound => "RECIPIENT_NOT_FOUND",
            TransferError::SenderNotFound => "SENDER_NOT_FOUND",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            TransferError::QueueUnavailable(_) => "QUEUE_UNAVAILABLE",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code suggestion.
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount | TransferError::MissingRecipient => 400,
            TransferError::RecipientNotFound
            | TransferError::SenderNotFound
            | TransferError::InsufficientBalance => 422,
            TransferError::TransferNotFound(_) => 404,
            TransferError::QueueUnavailable(_) => 503,
            TransferError::Internal(_) => 500,
        }
    }
}

impl From<LedgerError> for TransferError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::SenderNotFound => TransferError::SenderNotFound,
            LedgerError::RecipientNotFound => TransferError::RecipientNotFound,
            LedgerError::InsufficientBalance => TransferError::InsufficientBalance,
        }
    }
}

impl From<QueueError> for TransferError {
    fn from(e: QueueError) -> Self {
        TransferError::QueueUnavailable(e.to_string())
    }
}

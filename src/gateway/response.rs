//! Unified API response envelope and error mapping.
//!
//! Every endpoint returns `{code, msg, data}`: code 0 on success, a stable
//! numeric error code otherwise.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::transfer::TransferError;

/// Unified API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 0 for success, non-zero for errors.
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

/// Standard API error codes.
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Validation errors (1xxx)
    pub const INVALID_AMOUNT: i32 = 1001;
    pub const MISSING_RECIPIENT: i32 = 1002;
    pub const INVALID_PARAMETER: i32 = 1003;

    // Business errors (2xxx)
    pub const RECIPIENT_NOT_FOUND: i32 = 2001;
    pub const SENDER_NOT_FOUND: i32 = 2002;
    pub const INSUFFICIENT_BALANCE: i32 = 2003;

    // Resource errors (4xxx)
    pub const TRANSFER_NOT_FOUND: i32 = 4001;
    pub const OWNER_NOT_FOUND: i32 = 4002;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const QUEUE_UNAVAILABLE: i32 = 5001;
}

/// API error carrying the HTTP status, numeric code, and message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn not_found(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &e {
            TransferError::InvalidAmount => error_codes::INVALID_AMOUNT,
            TransferError::MissingRecipient => error_codes::MISSING_RECIPIENT,
            TransferError::RecipientNotFound => error_codes::RECIPIENT_NOT_FOUND,
            TransferError::SenderNotFound => error_codes::SENDER_NOT_FOUND,
            TransferError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            TransferError::TransferNotFound(_) => error_codes::TRANSFER_NOT_FOUND,
            TransferError::QueueUnavailable(_) => error_codes::QUEUE_UNAVAILABLE,
            TransferError::Internal(_) => error_codes::INTERNAL_ERROR,
        };
        Self::new(status, code, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            code: self.code,
            msg: self.msg,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Handler result type: success envelope or mapped error.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap data in the success envelope.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::success(42);
        assert_eq!(resp.code, 0);
        assert_eq!(resp.msg, "ok");
        assert_eq!(resp.data, Some(42));
    }

    #[test]
    fn test_transfer_error_mapping() {
        let err: ApiError = TransferError::InvalidAmount.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INVALID_AMOUNT);

        let err: ApiError = TransferError::InsufficientBalance.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = TransferError::QueueUnavailable("down".into()).into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, error_codes::QUEUE_UNAVAILABLE);
    }
}

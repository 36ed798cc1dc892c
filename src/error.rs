//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used at the HTTP boundary.
//! Every failure that reaches a client is rendered as the same JSON envelope:
//!
//! ```json
//! { "code": 2000, "message": "Todo not found", "data": null }
//! ```
//!
//! The numeric `code` is an [`ErrorCode`]; the HTTP status is derived from it through
//! [`ErrorCode::http_status`], which falls back to `500` for codes it does not know.
//! Store and internal failures are logged in full but only the generic message for
//! their code is sent to the caller.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::TokenError;
use crate::store::StoreError;

/// `ResponseError` has no access to a component's `LogContext`, so failures
/// rendered at the HTTP boundary log under this fixed target.
pub const HTTP_LOG_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::http");

/// Numeric error code carried in the error envelope.
///
/// System codes live in the 1000 range, todo-specific codes in the 2000 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const INTERNAL: ErrorCode = ErrorCode(1000);
    pub const INVALID_PARAMS: ErrorCode = ErrorCode(1001);
    pub const UNAUTHORIZED: ErrorCode = ErrorCode(1002);
    pub const FORBIDDEN: ErrorCode = ErrorCode(1003);
    pub const NOT_FOUND: ErrorCode = ErrorCode(1004);
    pub const TIMEOUT: ErrorCode = ErrorCode(1005);
    pub const TOO_MANY_REQUESTS: ErrorCode = ErrorCode(1006);
    pub const TODO_NOT_FOUND: ErrorCode = ErrorCode(2000);
    pub const TODO_ALREADY_EXISTS: ErrorCode = ErrorCode(2001);
    pub const INVALID_TODO_STATUS: ErrorCode = ErrorCode(2002);

    /// Maps the code to the HTTP status sent with it. Unknown codes are `500`.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::INVALID_PARAMS | Self::INVALID_TODO_STATUS => StatusCode::BAD_REQUEST,
            Self::UNAUTHORIZED => StatusCode::UNAUTHORIZED,
            Self::FORBIDDEN => StatusCode::FORBIDDEN,
            Self::NOT_FOUND | Self::TODO_NOT_FOUND => StatusCode::NOT_FOUND,
            Self::TIMEOUT => StatusCode::GATEWAY_TIMEOUT,
            Self::TOO_MANY_REQUESTS => StatusCode::TOO_MANY_REQUESTS,
            Self::TODO_ALREADY_EXISTS => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic client-facing message for the code.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::INVALID_PARAMS => "Invalid request parameters",
            Self::UNAUTHORIZED => "Unauthorized",
            Self::FORBIDDEN => "Forbidden",
            Self::NOT_FOUND => "Resource not found",
            Self::TIMEOUT => "Request timed out",
            Self::TOO_MANY_REQUESTS => "Too many requests",
            Self::TODO_NOT_FOUND => "Todo not found",
            Self::TODO_ALREADY_EXISTS => "Todo already exists",
            Self::INVALID_TODO_STATUS => "Invalid todo status",
            _ => "Internal server error",
        }
    }
}

/// The uniform error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Represents all possible errors that can surface from a request handler.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or was missing (HTTP 401).
    Unauthorized(String),
    /// The request could not be parsed (HTTP 400).
    BadRequest(String),
    /// The payload parsed but failed validation (HTTP 400, details in `data`).
    ValidationError(ValidationErrors),
    /// A failure reported by the todo repository. A missing or foreign todo is
    /// `StoreError::NotFound` (HTTP 404); other failures are logged, never sent.
    Store(StoreError),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthorized(_) => ErrorCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::ValidationError(_) => ErrorCode::INVALID_PARAMS,
            AppError::Store(err) if err.is_not_found() => ErrorCode::TODO_NOT_FOUND,
            AppError::Store(err) if err.is_timeout() => ErrorCode::TIMEOUT,
            AppError::Store(_) => ErrorCode::INTERNAL,
        }
    }

    /// The message placed in the envelope.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) => msg.clone(),
            _ => self.code().default_message().to_string(),
        }
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code(),
            message: self.client_message(),
            data: self.data(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ValidationError(errors) => write!(f, "Validation Error: {}", errors),
            AppError::Store(err) => write!(f, "Store Error: {}", err),
        }
    }
}

/// Converts `AppError` variants into the JSON error envelope.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.code().http_status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!(target: HTTP_LOG_TARGET, "request failed with {}: {}", status, self);
        }
        HttpResponse::build(status).json(self.to_response_body())
    }
}

/// Store errors keep their kind; the envelope code is chosen in [`AppError::code`].
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        AppError::Store(error)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error)
    }
}

/// Every token failure is a 401; the classification survives in the message.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

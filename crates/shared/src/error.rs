use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes reported by the entry service in a unary error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Canceled,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// Code to assume when a failed response carries no decodable error body.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::Internal,
            401 => ErrorCode::Unauthenticated,
            403 => ErrorCode::PermissionDenied,
            404 => ErrorCode::Unimplemented,
            429 | 502 | 503 | 504 => ErrorCode::Unavailable,
            _ => ErrorCode::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Canceled => "canceled",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::DeadlineExceeded => "deadline_exceeded",
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::ResourceExhausted => "resource_exhausted",
            ErrorCode::FailedPrecondition => "failed_precondition",
            ErrorCode::Aborted => "aborted",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::Unimplemented => "unimplemented",
            ErrorCode::Internal => "internal",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::DataLoss => "data_loss",
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::Unknown => "unknown",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Canceled => "the request was canceled",
            ErrorCode::InvalidArgument => "the request was rejected as invalid",
            ErrorCode::DeadlineExceeded => "the request timed out",
            ErrorCode::NotFound => "the requested resource was not found",
            ErrorCode::AlreadyExists => "the entry already exists",
            ErrorCode::PermissionDenied => "permission denied",
            ErrorCode::ResourceExhausted => "the service is over capacity",
            ErrorCode::FailedPrecondition => "the service refused the request in its current state",
            ErrorCode::Aborted => "the request was aborted",
            ErrorCode::OutOfRange => "a value was out of range",
            ErrorCode::Unimplemented => "the service does not support this operation",
            ErrorCode::Internal => "the service reported an internal error",
            ErrorCode::Unavailable => "the service is unavailable",
            ErrorCode::DataLoss => "the service reported data loss",
            ErrorCode::Unauthenticated => "authentication is required",
            ErrorCode::Unknown => "the service reported an unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

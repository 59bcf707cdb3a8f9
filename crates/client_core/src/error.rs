use reqwest::StatusCode;
use shared::error::ErrorCode;
use thiserror::Error;

use crate::form::DraftField;

const FALLBACK_MESSAGE: &str = "Unknown error";

/// A required field was empty after trimming. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: DraftField,
    pub message: String,
}

impl ValidationError {
    pub fn required(field: DraftField) -> Self {
        Self {
            field,
            message: format!("{} is required", field.label()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("an entry submission is already in flight")]
    InFlight,
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("remote error ({code}): {message}")]
    Remote { code: ErrorCode, message: String },
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn http_status(status: StatusCode) -> Self {
        let message = match status.canonical_reason() {
            Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
            None => format!("HTTP {}", status.as_u16()),
        };
        ClientError::Transport {
            status: Some(status.as_u16()),
            message,
        }
    }

    /// Text safe to show next to the form. Never empty.
    pub fn user_message(&self) -> String {
        let message = match self {
            ClientError::Validation(err) => err.message.clone(),
            ClientError::InFlight => "A submission is already in progress".to_string(),
            ClientError::Transport { message, .. } => message.clone(),
            ClientError::MalformedResponse(detail) => {
                format!("Unexpected response from the entry service: {detail}")
            }
            ClientError::Remote { code, message } if message.trim().is_empty() => {
                capitalize(code.description())
            }
            ClientError::Remote { message, .. } => message.clone(),
            ClientError::Config(message) => message.clone(),
        };

        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Whether this error ends an attempt that actually reached the dispatch step.
    pub fn is_attempt_failure(&self) -> bool {
        !matches!(self, ClientError::Validation(_) | ClientError::InFlight)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::MalformedResponse(format!("body could not be decoded: {err}"));
        }

        let status = err.status().map(|status| status.as_u16());
        let message = if err.is_timeout() {
            "The entry service did not respond in time".to_string()
        } else if err.is_connect() {
            "Could not reach the entry service".to_string()
        } else if let Some(status) = err.status() {
            return ClientError::http_status(status);
        } else {
            format!("Request failed: {err}")
        };
        ClientError::Transport { status, message }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

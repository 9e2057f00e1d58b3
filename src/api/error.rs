//! Client-side error taxonomy for calls to the UniVault API.
//!
//! Every failed call resolves to exactly one [`ClientError`] kind. Server
//! rejections keep the payload the server sent; transport failures use a
//! fixed, user-legible message so callers can offer a retry.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Shown whenever no response came back at all
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

/// Shown when a call could not even be constructed
pub const REQUEST_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthExpired,
    Server,
    Network,
    Request,
    Decode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthExpired => "auth_expired",
            ErrorKind::Server => "server",
            ErrorKind::Network => "network",
            ErrorKind::Request => "request",
            ErrorKind::Decode => "decode",
        }
    }
}

/// Additional error details sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// Field-level validation errors
    ValidationErrors(HashMap<String, Vec<String>>),
    /// Generic key-value details
    Generic(HashMap<String, Value>),
}

/// Error payload returned by the server, kept as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<String>,
    pub details: Option<ErrorDetails>,
    /// Body exactly as sent; `Value::Null` when it was not JSON
    pub body: Value,
}

impl ServerError {
    /// Interpret a non-success response body.
    ///
    /// Understands `{ success: false, message }`, `{ error: "..." }` and
    /// `{ error: { code, message, details } }`.
    pub fn from_body(status: StatusCode, text: &str) -> Self {
        let body: Value = serde_json::from_str(text).unwrap_or(Value::Null);
        let nested = body.get("error").filter(|e| e.is_object());

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .or_else(|| nested.and_then(|e| e.get("message")).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty() && body.is_null()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        let code = body
            .get("code")
            .or_else(|| nested.and_then(|e| e.get("code")))
            .and_then(Value::as_str)
            .map(str::to_string);

        let details = body
            .get("errors")
            .or_else(|| body.get("details"))
            .or_else(|| nested.and_then(|e| e.get("details")))
            .and_then(|d| serde_json::from_value::<ErrorDetails>(d.clone()).ok());

        Self {
            status,
            message,
            code,
            details,
            body,
        }
    }

    /// Messages for one field, if the server sent field-level errors
    pub fn field_errors(&self, field: &str) -> &[String] {
        match &self.details {
            Some(ErrorDetails::ValidationErrors(errors)) => {
                errors.get(field).map(Vec::as_slice).unwrap_or_default()
            }
            _ => &[],
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    /// Credentials rejected (401); the session was already cleared
    #[error("Session expired: {message}")]
    AuthExpired { message: String },

    #[error("[{}] {}", .0.status.as_u16(), .0.message)]
    Server(ServerError),

    /// No response received
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] reqwest::Error),

    #[error("{}", REQUEST_ERROR_MESSAGE)]
    Request(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::AuthExpired { .. } => ErrorKind::AuthExpired,
            ClientError::Server(_) => ErrorKind::Server,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Request(_) => ErrorKind::Request,
            ClientError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Only transport failures are plausibly transient
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            ClientError::Server(e) => Some(e),
            _ => None,
        }
    }

    /// Message suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

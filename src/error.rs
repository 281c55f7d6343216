use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Closed set of failure kinds the notebook service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    InvalidCredentials,
    ValidationError,
    NotFound,
    Conflict,
    DatabaseError,
    InternalError,
    Unknown,
}

impl ErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "UNAUTHORIZED" => Self::Unauthorized,
            "INVALID_CREDENTIALS" => Self::InvalidCredentials,
            "VALIDATION_ERROR" => Self::ValidationError,
            "NOT_FOUND" => Self::NotFound,
            "CONFLICT" => Self::Conflict,
            "DATABASE_ERROR" => Self::DatabaseError,
            "INTERNAL_ERROR" => Self::InternalError,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// A failed gateway call, classified.
///
/// `status_code` is `None` when no HTTP response was involved: transport
/// failures, request encoding failures and locally rejected operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code,
        }
    }

    pub fn local(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None)
    }

    pub fn unauthorized() -> Self {
        Self::local(ErrorKind::Unauthorized, "Authentication required")
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::local(ErrorKind::Unknown, message)
    }

    /// Classifies a non-success response from its status and raw body.
    ///
    /// Bodies that are not a JSON object map to `Unknown` with the raw text
    /// (or a generic message when the body is empty).
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => {
                let kind = parsed
                    .error
                    .as_deref()
                    .map(ErrorKind::from_code)
                    .unwrap_or(ErrorKind::Unknown);
                let message = parsed
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| body.to_string());
                Self::new(kind, message, Some(status))
            }
            Err(_) => {
                let message = if body.is_empty() {
                    format!("HTTP error: {status}")
                } else {
                    body.to_string()
                };
                Self::new(ErrorKind::Unknown, message, Some(status))
            }
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

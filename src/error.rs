//! Error taxonomy shared by every layer of the engine.
//!
//! Every variant carries a human-readable `message` and structured JSON
//! `details`. Callers that sit behind a transport map variants to protocol
//! responses through [`AppError::status_code`] and [`AppError::code`].

use serde::Serialize;
use serde_json::{Value, json};

/// Name of the unique constraint guarding `links.short_key`.
pub const SHORT_KEY_CONSTRAINT: &str = "links_short_key_key";

/// Serializable error payload for callers that render errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed custom key, URL or expiry input.
    #[error("{message}")]
    InvalidFormat { message: String, details: Value },

    /// Requested custom key is already in use.
    #[error("{message}")]
    KeyTaken { message: String, details: Value },

    /// Storage-level uniqueness gate rejected an insert.
    ///
    /// Recovered internally by the key generation loop and never returned
    /// from [`crate::application::services::LinkService`].
    #[error("{message}")]
    DuplicateKey { message: String, details: Value },

    /// Key generation retries ran out. Safe to retry the whole operation.
    #[error("{message}")]
    Exhausted { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The link exists but is past its expiry.
    #[error("{message}")]
    Expired { message: String, details: Value },

    #[error("{message}")]
    Forbidden { message: String, details: Value },

    /// Transient storage failure (connection loss, pool timeout).
    #[error("{message}")]
    Unavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn invalid_format(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidFormat {
            message: message.into(),
            details,
        }
    }
    pub fn key_taken(message: impl Into<String>, details: Value) -> Self {
        Self::KeyTaken {
            message: message.into(),
            details,
        }
    }
    pub fn duplicate_key(message: impl Into<String>, details: Value) -> Self {
        Self::DuplicateKey {
            message: message.into(),
            details,
        }
    }
    pub fn exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::Exhausted {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn expired(message: impl Into<String>, details: Value) -> Self {
        Self::Expired {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidFormat { .. } => "invalid_format",
            AppError::KeyTaken { .. } => "key_taken",
            AppError::DuplicateKey { .. } => "duplicate_key",
            AppError::Exhausted { .. } => "exhausted",
            AppError::NotFound { .. } => "not_found",
            AppError::Expired { .. } => "expired",
            AppError::Forbidden { .. } => "forbidden",
            AppError::Unavailable { .. } => "unavailable",
            AppError::Internal { .. } => "internal_error",
        }
    }

    /// HTTP-equivalent status for transports built on top of the engine.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidFormat { .. } => 400,
            AppError::KeyTaken { .. } | AppError::DuplicateKey { .. } => 409,
            AppError::NotFound { .. } => 404,
            AppError::Expired { .. } => 410,
            AppError::Forbidden { .. } => 403,
            AppError::Exhausted { .. } | AppError::Unavailable { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }

    /// Returns true for storage failures that a read may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Unavailable { .. })
    }

    pub fn details(&self) -> &Value {
        match self {
            AppError::InvalidFormat { details, .. }
            | AppError::KeyTaken { details, .. }
            | AppError::DuplicateKey { details, .. }
            | AppError::Exhausted { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Expired { details, .. }
            | AppError::Forbidden { details, .. }
            | AppError::Unavailable { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
            details: self.details().clone(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() && db.constraint() == Some(SHORT_KEY_CONSTRAINT) {
                return AppError::duplicate_key(
                    "Short key already exists",
                    json!({ "constraint": SHORT_KEY_CONSTRAINT }),
                );
            }
            if db.is_foreign_key_violation() {
                return AppError::not_found(
                    "Referenced link does not exist",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => {
                tracing::warn!("Transient database error: {}", e);
                AppError::unavailable("Database temporarily unavailable", json!({}))
            }
            sqlx::Error::RowNotFound => AppError::not_found("Row not found", json!({})),
            other => {
                tracing::error!("Database error: {}", other);
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        AppError::invalid_format("Validation failed", json!({ "fields": details }))
    }
}

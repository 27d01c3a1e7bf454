//! Unified error handling for HTTP.
//!
//! Every failure leaving a handler is an [`AppError`]. Client errors are
//! rendered verbatim; database and internal errors are logged and replaced
//! with a generic message so no internal detail reaches the client.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, FIELD_PASSWORD, MSG_VALIDATION_FAILED};
use serde::Serialize;
use thiserror::Error;

/// Field name mapped to its validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Status used for a missing or mismatched anti-forgery token.
const CSRF_MISMATCH_STATUS: u16 = 419;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    // Validation
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    // Request forgery protection
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: FieldErrors,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::CsrfMismatch => "CSRF_TOKEN_MISMATCH",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::CsrfMismatch => {
                StatusCode::from_u16(CSRF_MISMATCH_STATUS).unwrap_or(StatusCode::FORBIDDEN)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),

            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }

    /// Field-keyed messages, if this is a validation error
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.user_message();
        let code = self.code().to_string();
        let fields = match self {
            AppError::Validation { fields, .. } => fields,
            _ => FieldErrors::new(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                fields,
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Password(msg) => AppError::field(FIELD_PASSWORD, msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(entity))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound(entity.into())
    }

    /// Validation failure that is not tied to a single field
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation {
            message: msg.into(),
            fields: FieldErrors::new(),
        }
    }

    /// Validation failure on one field
    pub fn field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), vec![msg.clone()]);
        AppError::Validation {
            message: msg,
            fields,
        }
    }

    /// Validation failure on several fields; `None` when `fields` is empty
    pub fn from_fields(fields: FieldErrors) -> Option<Self> {
        if fields.values().all(Vec::is_empty) {
            return None;
        }
        let message = fields
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| MSG_VALIDATION_FAILED.to_string());
        Some(AppError::Validation { message, fields })
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_field_error_renders_422_with_fields() {
        let (status, json) = body_json(AppError::field("email", "taken")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "taken");
        assert_eq!(json["error"]["fields"]["email"][0], "taken");
    }

    #[tokio::test]
    async fn test_not_found_renders_404_without_fields() {
        let (status, json) = body_json(AppError::not_found("User")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["message"], "User not found");
        assert!(json["error"].get("fields").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, json) = body_json(AppError::internal("connection refused on 10.0.0.3")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_csrf_mismatch_status() {
        let (status, json) = body_json(AppError::CsrfMismatch).await;

        assert_eq!(status.as_u16(), 419);
        assert_eq!(json["error"]["code"], "CSRF_TOKEN_MISMATCH");
    }

    #[test]
    fn test_from_fields_uses_first_message() {
        let mut fields = FieldErrors::new();
        fields.insert("roles".to_string(), vec!["pick one".to_string()]);
        fields.insert("email".to_string(), vec!["bad email".to_string()]);

        let err = AppError::from_fields(fields).unwrap();
        // BTreeMap orders keys, so "email" comes first
        assert_eq!(err.to_string(), "bad email");
        assert_eq!(err.field_errors().unwrap().len(), 2);
    }

    #[test]
    fn test_from_fields_empty_is_none() {
        assert!(AppError::from_fields(FieldErrors::new()).is_none());
    }

    #[test]
    fn test_domain_password_error_maps_to_password_field() {
        let err = AppError::from(DomainError::password("too short"));
        assert!(err.field_errors().unwrap().contains_key("password"));
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<i32> = None;
        assert!(matches!(
            missing.ok_or_not_found("Role"),
            Err(AppError::NotFound(entity)) if entity == "Role"
        ));
    }
}

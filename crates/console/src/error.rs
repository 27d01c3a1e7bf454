//! Client-side error types.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Field name mapped to its validation messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected input (422)
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Any other non-success response
    #[error("{code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Transport or decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    fields: FieldErrors,
}

impl ClientError {
    /// Build an error from a non-success status and its raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error);

        match (status, parsed) {
            (StatusCode::NOT_FOUND, Some(body)) => ClientError::NotFound(body.message),
            (StatusCode::NOT_FOUND, None) => ClientError::NotFound("Resource not found".to_string()),
            (StatusCode::UNPROCESSABLE_ENTITY, Some(body)) => ClientError::Validation {
                message: body.message,
                fields: body.fields,
            },
            (status, Some(body)) => ClientError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            },
            (status, None) => ClientError::Api {
                status: status.as_u16(),
                code: "HTTP_ERROR".to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string(),
            },
        }
    }

    /// Field-keyed messages, if the server rejected the input
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

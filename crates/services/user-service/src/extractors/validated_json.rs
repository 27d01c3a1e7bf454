//! Validated JSON extractor.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use common::{AppError, FieldErrors};

/// JSON extractor that validates the payload and reports errors per field.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value.validate().map_err(into_app_error)?;

        Ok(ValidatedJson(value))
    }
}

fn into_app_error(errors: ValidationErrors) -> AppError {
    let mut fields = FieldErrors::new();
    for (field, failures) in errors.field_errors() {
        let messages = failures
            .iter()
            .map(|failure| match &failure.message {
                Some(message) => message.to_string(),
                None => format!("The {} field is invalid.", field.replace('_', " ")),
            })
            .collect();
        fields.insert(field.to_string(), messages);
    }

    AppError::from_fields(fields).unwrap_or_else(|| AppError::validation("Validation failed"))
}

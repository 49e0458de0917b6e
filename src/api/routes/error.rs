//! API error handling utilities.
//!
//! Validation failures return 400 with per-field message lists
//! ({"field": ["msg", ...]} or {"non_field_errors": [...]}); everything
//! else returns {"detail": "..."} with the matching status code.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::storage::StorageError;

/// Request body extractor whose rejection speaks the same JSON error
/// dialect as the rest of the API.
#[derive(axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Per-field validation messages. BTreeMap keeps the field order in
/// responses stable.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn accumulated messages into a 400 error, or pass when clean.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

/// API error response
#[derive(Debug)]
pub enum ApiError {
    /// 400 with per-field messages
    Validation(FieldErrors),
    /// 400 with `non_field_errors` messages
    NonField(Vec<String>),
    /// 400 with a `detail` message (malformed request body)
    ParseError(String),
    /// 401 with a `detail` message
    Unauthorized(String),
    /// 403 with a `detail` message
    PermissionDenied(String),
    /// 404 with a `detail` message
    NotFound(String),
    /// 500; the message is logged, the body stays generic
    Internal(String),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        ApiError::NonField(vec![message.into()])
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    pub fn invalid_token() -> Self {
        ApiError::Unauthorized("Invalid token.".to_string())
    }

    pub fn permission_denied() -> Self {
        ApiError::PermissionDenied("You do not have permission to perform this action.".to_string())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_string())
    }

    pub fn invalid_page() -> Self {
        ApiError::NotFound("Invalid page.".to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, axum::Json(json!(errors.errors))).into_response()
            }
            ApiError::NonField(messages) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "non_field_errors": messages })),
            )
                .into_response(),
            ApiError::ParseError(detail) => detail_response(StatusCode::BAD_REQUEST, &detail),
            ApiError::Unauthorized(detail) => detail_response(StatusCode::UNAUTHORIZED, &detail),
            ApiError::PermissionDenied(detail) => detail_response(StatusCode::FORBIDDEN, &detail),
            ApiError::NotFound(detail) => detail_response(StatusCode::NOT_FOUND, &detail),
            ApiError::Internal(message) => {
                error!("internal error: {}", message);
                detail_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.",
                )
            }
        }
    }
}

fn detail_response(status: StatusCode, detail: &str) -> Response {
    (status, axum::Json(json!({ "detail": detail }))).into_response()
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ApiError::not_found(),
            // FK target vanished mid-request; to the client the object
            // simply does not exist
            StorageError::InvalidReference { .. } => ApiError::not_found(),
            StorageError::AlreadyExists { entity_type } => {
                ApiError::non_field(format!("This {} already exists.", entity_type))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ParseError(format!("JSON parse error - {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_in_order() {
        let mut errors = FieldErrors::new();
        errors.add("email", "This field is required.");
        errors.add("username", "This field is required.");
        errors.add("email", "Enter a valid email address.");
        assert!(!errors.is_empty());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn empty_field_errors_pass() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn storage_not_found_maps_to_404() {
        let err: ApiError = StorageError::not_found("recipe", 7).into();
        assert!(matches!(err, ApiError::NotFound(ref d) if d == "Not found."));
    }

    #[test]
    fn storage_duplicate_maps_to_400() {
        let err: ApiError = StorageError::AlreadyExists {
            entity_type: "favorite",
        }
        .into();
        assert!(matches!(err, ApiError::NonField(_)));
    }
}

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use lehrmatch_gateway::chat::ChatError;
use lehrmatch_types::api::ErrorBody;

/// API error with the wire shape `{message, code, details?}`.
/// `details` maps a field path to its validation messages.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation(
        message: impl Into<String>,
        details: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::bad_request(message)
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Conflicts carry a specific code so clients can tell "already acted"
    /// apart from a generic failure.
    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            message,
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Unhandled error: {:#}", err);
        Self::internal()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::MatchNotFound => Self::not_found("Match not found"),
            ChatError::NotParty => Self::forbidden("Not authorized to access this chat"),
            ChatError::InvalidContent => Self::bad_request(err.to_string()),
            ChatError::Internal(inner) => inner.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            code: self.code.to_string(),
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_keeps_its_specific_code() {
        let err = ApiError::conflict("Already swiped on this listing", "ALREADY_SWIPED");
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "ALREADY_SWIPED");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut details = HashMap::new();
        details.insert("email".to_string(), vec!["must be a valid email".to_string()]);
        let err = ApiError::validation("Invalid input", details);

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.details.unwrap().contains_key("email"));
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::response::{ErrorResponse, OutcomeViolation};
use crate::narrative::NarrativeError;
use crate::validation::ValidationError;

/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("missing or invalid API key")]
    Unauthorized,

    #[error(transparent)]
    OutcomeViolation(#[from] OutcomeViolation),

    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::OutcomeViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Narrative(NarrativeError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Narrative(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Validation(e) => {
                let body = ErrorResponse::new(e.to_string(), "VALIDATION_ERROR");
                match e.field() {
                    Some(field) => body.with_field(field),
                    None => body,
                }
            }
            ApiError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            ApiError::Unauthorized => ErrorResponse::new(self.to_string(), "UNAUTHORIZED"),
            // Internal detail stays in the logs
            ApiError::OutcomeViolation(_) => ErrorResponse::internal_error("Internal server error"),
            ApiError::Narrative(NarrativeError::NotConfigured) => ErrorResponse::new(
                "Narrative generation is not configured",
                "NARRATIVE_UNAVAILABLE",
            ),
            ApiError::Narrative(e) => ErrorResponse::new(e.to_string(), "NARRATIVE_FAILED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::OutcomeViolation(v) = &self {
            error!(
                endpoint = v.endpoint.path(),
                decision = %v.decision,
                fault = "OutcomeEnumViolation",
                "Decision outside endpoint's allowed outcomes"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::domain::EvaluationDecision;

#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowerTypeRequest {
    pub borrower_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowerIdRequest {
    pub is_verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenBankingRequest {
    pub is_connected: bool,
}

/// Narrative to check against the decision it describes.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckNarrativeRequest {
    pub narrative: String,
    pub evaluation_decision: EvaluationDecision,
}

/// JSON body extractor that rejects with [`ApiError::BadRequest`].
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
                    JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing 'Content-Type: application/json' header".to_string()
                    }
                    other => format!("Failed to parse JSON: {}", other),
                };
                Err(ApiError::BadRequest(message))
            }
        }
    }
}

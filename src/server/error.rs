use crate::cache::CacheError;
use crate::commands::FETCH_FAILED_MESSAGE;
use crate::question::TriviaResponse;
use crate::transport::FetchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Count must be between 1 and 10")]
    InvalidCount,

    #[error("Malformed payload")]
    MalformedPayload(String),

    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,

    #[error("Failed to generate trivia questions")]
    Generation(#[source] FetchError),

    #[error("{}", FETCH_FAILED_MESSAGE)]
    Unavailable(#[source] CacheError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCount | ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey | ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::MalformedPayload(reason) => Some(reason.clone()),
            ApiError::Generation(e) => Some(e.to_string()),
            ApiError::Unavailable(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();
        if status.is_server_error() {
            error!(%status, error = %self, details = ?details, "Request failed");
        }

        let body = TriviaResponse::error(self.to_string(), details);
        (status, Json(body)).into_response()
    }
}

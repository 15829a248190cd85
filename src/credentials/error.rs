use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure modes of token issuance
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("userId is required")]
    InvalidUser,

    #[error("API key or secret not configured")]
    Configuration,

    /// The backing service rejected the upsert or the token could not be signed.
    /// The detail is for server logs only.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IssueError::InvalidUser => (StatusCode::BAD_REQUEST, self.to_string()),
            IssueError::Configuration => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            IssueError::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to generate token".to_string(),
            ),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

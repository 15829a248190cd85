use super::state::AppState;
use crate::credentials::IssueError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(rename = "userId", default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/token
/// Upsert the user and mint a token for it
pub async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, IssueError> {
    info!("Token requested for user: {}", req.user_id);

    let token = state.issuer.issue_token(&req.user_id).await?;

    Ok(Json(TokenResponse {
        token: token.into_string(),
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

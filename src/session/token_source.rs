use super::error::SessionError;
use crate::credentials::{AccessToken, CredentialIssuer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Where a joining participant gets its token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self, user_id: &str) -> Result<AccessToken, SessionError>;
}

#[async_trait]
impl TokenSource for CredentialIssuer {
    async fn fetch_token(&self, user_id: &str) -> Result<AccessToken, SessionError> {
        self.issue_token(user_id).await.map_err(|e| {
            error!("Error generating token for {}: {}", user_id, e);
            SessionError::Unavailable
        })
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
}

#[derive(Deserialize)]
struct TokenReply {
    token: Option<String>,
    error: Option<String>,
}

/// Fetches tokens from the issuance endpoint (`POST /api/token`)
pub struct HttpTokenSource {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTokenSource {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/token", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch_token(&self, user_id: &str) -> Result<AccessToken, SessionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&TokenRequest { user_id })
            .send()
            .await
            .map_err(|e| {
                error!("Token request to {} failed: {}", self.endpoint, e);
                SessionError::Unavailable
            })?;

        let status = response.status();
        let reply: TokenReply = response.json().await.map_err(|e| {
            error!("Unreadable token response ({}): {}", status, e);
            SessionError::Unavailable
        })?;

        match reply.token {
            Some(token) if status.is_success() && !token.is_empty() => {
                info!("Fetched token for {}", user_id);
                Ok(AccessToken::from_raw(user_id, token))
            }
            _ => {
                error!(
                    "Failed to fetch token for {} ({}): {}",
                    user_id,
                    status,
                    reply.error.unwrap_or_default()
                );
                Err(SessionError::Unavailable)
            }
        }
    }
}

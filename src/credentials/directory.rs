use super::error::IssueError;
use super::token::sign_server_token;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A user as registered with the backing real-time service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub role: String,
    pub name: String,
}

/// The backing service's user registry
///
/// `upsert_user` must be idempotent: repeating it for the same id overwrites
/// the record rather than creating a second identity.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), IssueError>;
}

/// User directory backed by the hosted service's REST API
pub struct StreamUserDirectory {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Serialize)]
struct UpsertUsersRequest<'a> {
    users: HashMap<&'a str, &'a UserRecord>,
}

impl StreamUserDirectory {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for StreamUserDirectory {
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), IssueError> {
        let server_token = sign_server_token(&self.api_secret)?;
        let body = UpsertUsersRequest {
            users: HashMap::from([(user.id.as_str(), user)]),
        };

        debug!("Upserting user {} with role {}", user.id, user.role);

        let response = self
            .http
            .post(format!("{}/users", self.base_url))
            .query(&[("api_key", self.api_key.as_str())])
            .header("Authorization", server_token)
            .header("stream-auth-type", "jwt")
            .json(&body)
            .send()
            .await
            .map_err(|e| IssueError::Upstream(format!("user upsert request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(IssueError::Upstream(format!(
                "user upsert rejected with {}: {}",
                status, detail
            )));
        }

        info!("Upserted user {}", user.id);
        Ok(())
    }
}

/// Process-local user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<UserRecord> {
        self.users.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), IssueError> {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

use super::directory::{StreamUserDirectory, UserDirectory, UserRecord};
use super::error::IssueError;
use super::token::{sign_user_token, AccessToken, TokenClaims};
use crate::config::StreamConfig;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Server-side key/secret pair
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// How tokens are scoped and how long they live
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    /// Role given to every upserted user
    pub role: String,

    /// Token lifetime measured from the backdated issued-at
    pub validity: Duration,

    /// How far issued-at is moved into the past
    pub clock_skew: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            role: "user".to_string(),
            validity: Duration::from_secs(60 * 60 * 24),
            clock_skew: Duration::from_secs(60),
        }
    }
}

impl From<&StreamConfig> for TokenPolicy {
    fn from(cfg: &StreamConfig) -> Self {
        Self {
            role: cfg.default_role.clone(),
            validity: Duration::from_secs(cfg.token_validity_secs),
            clock_skew: Duration::from_secs(cfg.clock_skew_secs),
        }
    }
}

struct IssuerBackend {
    credentials: ApiCredentials,
    directory: Arc<dyn UserDirectory>,
}

/// Mints participant tokens
///
/// Holds no per-request state; share it behind an `Arc` and call it
/// concurrently. An issuer built without credentials still serves requests,
/// answering each with [`IssueError::Configuration`].
pub struct CredentialIssuer {
    backend: Option<IssuerBackend>,
    policy: TokenPolicy,
}

impl CredentialIssuer {
    pub fn new(
        credentials: ApiCredentials,
        directory: Arc<dyn UserDirectory>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            backend: Some(IssuerBackend {
                credentials,
                directory,
            }),
            policy,
        }
    }

    /// An issuer whose secrets are missing
    pub fn unconfigured(policy: TokenPolicy) -> Self {
        Self {
            backend: None,
            policy,
        }
    }

    /// Build from configuration, talking to the hosted user directory
    pub fn from_config(cfg: &StreamConfig) -> Self {
        let policy = TokenPolicy::from(cfg);
        match Self::credentials_from(cfg) {
            Some(credentials) => {
                let directory = Arc::new(StreamUserDirectory::new(
                    cfg.base_url.clone(),
                    credentials.api_key.clone(),
                    credentials.api_secret.clone(),
                ));
                Self::new(credentials, directory, policy)
            }
            None => Self::unconfigured(policy),
        }
    }

    /// Build from configuration with a caller-supplied directory
    pub fn with_directory(cfg: &StreamConfig, directory: Arc<dyn UserDirectory>) -> Self {
        let policy = TokenPolicy::from(cfg);
        match Self::credentials_from(cfg) {
            Some(credentials) => Self::new(credentials, directory, policy),
            None => Self::unconfigured(policy),
        }
    }

    fn credentials_from(cfg: &StreamConfig) -> Option<ApiCredentials> {
        let api_key = cfg.api_key.as_deref().filter(|k| !k.is_empty())?;
        let api_secret = cfg.api_secret.as_deref().filter(|s| !s.is_empty())?;
        Some(ApiCredentials {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Upsert `user_id` and mint a token for it
    pub async fn issue_token(&self, user_id: &str) -> Result<AccessToken, IssueError> {
        self.issue_token_at(user_id, Utc::now()).await
    }

    /// Same as [`issue_token`](Self::issue_token) with an explicit clock reading
    pub async fn issue_token_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, IssueError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(IssueError::InvalidUser);
        }

        let backend = self.backend.as_ref().ok_or_else(|| {
            error!("Token requested for {} but API key or secret is missing", user_id);
            IssueError::Configuration
        })?;

        let record = UserRecord {
            id: user_id.to_string(),
            role: self.policy.role.clone(),
            name: user_id.to_string(),
        };

        if let Err(e) = backend.directory.upsert_user(&record).await {
            error!("Error upserting user {}: {}", user_id, e);
            return Err(e);
        }

        let claims = self.claims_for(user_id, now);
        let token = sign_user_token(&claims, &backend.credentials.api_secret).map_err(|e| {
            error!("Error generating token for {}: {}", user_id, e);
            e
        })?;

        info!(
            "Issued token for {} (iat={}, exp={})",
            user_id, claims.iat, claims.exp
        );

        Ok(token)
    }

    fn claims_for(&self, user_id: &str, now: DateTime<Utc>) -> TokenClaims {
        let iat = now.timestamp() - self.policy.clock_skew.as_secs() as i64;
        TokenClaims {
            user_id: user_id.to_string(),
            iat,
            exp: iat + self.policy.validity.as_secs() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_claims_window_is_backdated() {
        let issuer = CredentialIssuer::unconfigured(TokenPolicy::default());
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let claims = issuer.claims_for("alice", now);

        assert_eq!(claims.iat, 1_700_000_000 - 60);
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_policy_from_config() {
        let cfg = StreamConfig {
            default_role: "guest".to_string(),
            token_validity_secs: 600,
            clock_skew_secs: 5,
            ..StreamConfig::default()
        };
        let policy = TokenPolicy::from(&cfg);
        assert_eq!(policy.role, "guest");
        assert_eq!(policy.validity, Duration::from_secs(600));
        assert_eq!(policy.clock_skew, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_secret_leaves_issuer_unconfigured() {
        let cfg = StreamConfig {
            api_key: Some("key".to_string()),
            api_secret: Some(String::new()),
            ..StreamConfig::default()
        };
        assert!(!CredentialIssuer::from_config(&cfg).is_configured());
    }
}

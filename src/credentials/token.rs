use super::error::IssueError;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by a participant token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    /// Issued-at, seconds since the epoch (already backdated)
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Claims for the service's own server-side token
#[derive(Debug, Serialize)]
struct ServerClaims {
    server: bool,
}

/// A signed, short-lived credential scoped to one identity.
///
/// Held in memory for the session only. The raw value is redacted from
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    user_id: String,
    issued_at: i64,
    expires_at: i64,
}

impl AccessToken {
    /// Wrap a token received from the issuance endpoint
    ///
    /// The validity window is unknown on the client side, so both
    /// timestamps are zero.
    pub fn from_raw(user_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            user_id: user_id.into(),
            issued_at: 0,
            expires_at: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.issued_at, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires_at, 0).single()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("user_id", &self.user_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Sign participant claims with the API secret (HS256)
pub(crate) fn sign_user_token(
    claims: &TokenClaims,
    secret: &str,
) -> Result<AccessToken, IssueError> {
    if claims.exp <= claims.iat {
        return Err(IssueError::Upstream(format!(
            "token expiry {} is not after issued-at {}",
            claims.exp, claims.iat
        )));
    }

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    let value = encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| IssueError::Upstream(format!("JWT signing operation failed: {}", e)))?;

    Ok(AccessToken {
        value,
        user_id: claims.user_id.clone(),
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}

/// Sign the server-side token used to authenticate against the user directory
pub(crate) fn sign_server_token(secret: &str) -> Result<String, IssueError> {
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &ServerClaims { server: true },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| IssueError::Upstream(format!("server token signing failed: {}", e)))
}

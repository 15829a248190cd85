use crate::credentials::CredentialIssuer;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Token issuer shared by all requests
    pub issuer: Arc<CredentialIssuer>,
}

impl AppState {
    pub fn new(issuer: CredentialIssuer) -> Self {
        Self {
            issuer: Arc::new(issuer),
        }
    }
}

use super::error::ProviderError;
use crate::credentials::AccessToken;
use crate::identity::Identity;
use async_trait::async_trait;
use std::sync::Arc;

/// A live chat connection for one user
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn user_id(&self) -> &str;

    async fn disconnect_user(&self) -> Result<(), ProviderError>;
}

/// Opens chat connections
///
/// Every call returns a fresh connection; no instance is shared between
/// sessions.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn connect_user(
        &self,
        api_key: &str,
        identity: &Identity,
        token: &AccessToken,
    ) -> Result<Arc<dyn ChatClient>, ProviderError>;
}

use super::error::ProviderError;
use crate::credentials::AccessToken;
use crate::identity::Identity;
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Supplies the current token on demand so the transport can refresh it
/// without involving whoever built the client.
pub type TokenProvider =
    Arc<dyn Fn() -> BoxFuture<'static, Result<AccessToken, ProviderError>> + Send + Sync>;

/// Token provider that always resolves to the same token
pub fn static_token_provider(token: AccessToken) -> TokenProvider {
    Arc::new(move || future::ready(Ok::<_, ProviderError>(token.clone())).boxed())
}

/// A room member and the role it holds in the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub user_id: String,
    pub role: String,
}

/// Data sent with create-or-get
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSetup {
    pub creator_id: String,
    pub members: Vec<RoomMember>,
}

impl RoomSetup {
    /// Room created by `identity`, with `identity` as its only `call_member`
    pub fn for_creator(identity: &Identity) -> Self {
        Self {
            creator_id: identity.id.clone(),
            members: vec![RoomMember {
                user_id: identity.id.clone(),
                role: "call_member".to_string(),
            }],
        }
    }
}

/// A caption line produced by the provider's transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedCaption {
    pub speaker_id: String,
    pub text: String,
}

/// Notifications pushed by a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The session was ended for everyone (`call.session_ended`)
    SessionEnded,
    ClosedCaption(ClosedCaption),
    ParticipantJoined { user_id: String },
    ParticipantLeft { user_id: String },
}

/// A call addressed by `(room_type, room_id)`
#[async_trait]
pub trait Room: Send + Sync {
    fn room_type(&self) -> &str;

    fn id(&self) -> &str;

    async fn get_or_create(&self, setup: &RoomSetup) -> Result<(), ProviderError>;

    async fn join(&self) -> Result<(), ProviderError>;

    async fn start_closed_captions(&self, language: &str) -> Result<(), ProviderError>;

    async fn stop_closed_captions(&self) -> Result<(), ProviderError>;

    async fn leave(&self) -> Result<(), ProviderError>;

    /// Subscribe to room notifications
    fn subscribe(&self) -> broadcast::Receiver<RoomEvent>;
}

/// A media connection scoped to one identity
#[async_trait]
pub trait MediaClient: Send + Sync {
    fn user_id(&self) -> &str;

    /// Handle to a room; nothing is sent until the room is used
    fn room(&self, room_type: &str, room_id: &str) -> Arc<dyn Room>;

    async fn disconnect(&self) -> Result<(), ProviderError>;
}

/// Builds media clients
///
/// Construction is local; the transport fetches its token lazily through
/// the supplied [`TokenProvider`].
pub trait MediaProvider: Send + Sync {
    fn create_client(
        &self,
        api_key: &str,
        identity: &Identity,
        tokens: TokenProvider,
    ) -> Result<Arc<dyn MediaClient>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_same_token() {
        let provider = static_token_provider(AccessToken::from_raw("alice", "tok"));
        let first = provider().await.unwrap();
        let second = provider().await.unwrap();
        assert_eq!(first.as_str(), "tok");
        assert_eq!(first, second);
    }

    #[test]
    fn test_setup_lists_creator_as_member() {
        let setup = RoomSetup::for_creator(&Identity::new("alice", "Alice"));
        assert_eq!(setup.creator_id, "alice");
        assert_eq!(setup.members.len(), 1);
        assert_eq!(setup.members[0].role, "call_member");
    }
}

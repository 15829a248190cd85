use super::error::SessionError;
use super::token_source::TokenSource;
use crate::call::{CallController, CallSession, CallSettings, CallTrigger};
use crate::identity::Identity;
use crate::registry::{Acquire, ClientPair, SessionClientRegistry};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Joins participants to rooms: token, clients, then the call
pub struct MeetingSession {
    api_key: String,
    tokens: Arc<dyn TokenSource>,
    registry: Arc<SessionClientRegistry>,
    settings: CallSettings,
}

impl MeetingSession {
    pub fn new(
        api_key: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        registry: Arc<SessionClientRegistry>,
        settings: CallSettings,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            tokens,
            registry,
            settings,
        }
    }

    /// Join `room_id` as `display_name`
    ///
    /// `on_leave` fires once when the call is over, whichever way it ends.
    /// On a join failure the clients are released before returning. A blank
    /// display name joins as `Anonymous`.
    pub async fn join(
        &self,
        display_name: &str,
        room_id: &str,
        on_leave: impl Fn() + Send + Sync + 'static,
    ) -> Result<ActiveMeeting, SessionError> {
        if room_id.trim().is_empty() {
            warn!("Join requested without a room id");
            return Err(SessionError::MissingRoom);
        }

        let identity = Identity::from_display_name(display_name);
        info!("Starting session for {} in room {}", identity.id, room_id);

        let token = self.tokens.fetch_token(&identity.id).await?;

        let pair = match self
            .registry
            .acquire(Some(&self.api_key), Some(&identity), Some(&token))
            .await
        {
            Ok(Acquire::Ready(pair)) => pair,
            Ok(other) => {
                warn!("Clients for {} not ready: {:?}", identity.id, other);
                return Err(SessionError::Unavailable);
            }
            Err(e) => {
                error!("Error connecting clients for {}: {}", identity.id, e);
                return Err(SessionError::Unavailable);
            }
        };

        let controller = CallController::new(
            pair.media(),
            identity.clone(),
            room_id,
            self.settings.clone(),
            on_leave,
        );

        let meeting = ActiveMeeting {
            identity,
            controller,
            pair,
            registry: Arc::clone(&self.registry),
        };

        if let Err(e) = meeting.controller.dispatch(CallTrigger::InputsReady).await {
            meeting.closed().await;
            return Err(SessionError::Join(e));
        }

        Ok(meeting)
    }
}

/// A joined call and the clients it borrows
pub struct ActiveMeeting {
    identity: Identity,
    controller: Arc<CallController>,
    pair: Arc<ClientPair>,
    registry: Arc<SessionClientRegistry>,
}

impl ActiveMeeting {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn controller(&self) -> &Arc<CallController> {
        &self.controller
    }

    pub fn pair(&self) -> &Arc<ClientPair> {
        &self.pair
    }

    /// The participant pressed leave
    pub async fn leave(&self) {
        self.controller.exit(CallTrigger::UserLeaveRequested).await;
    }

    /// The owning context is going away
    ///
    /// Leaving and releasing the clients continue in the background, so the
    /// meeting can be dropped right away.
    pub fn teardown(&self) -> JoinHandle<()> {
        self.controller.teardown();

        let controller = Arc::clone(&self.controller);
        let registry = Arc::clone(&self.registry);
        let pair = Arc::clone(&self.pair);
        tokio::spawn(async move {
            release_when_over(&controller, &registry, &pair).await;
        })
    }

    /// Wait until the call is over, then release the clients
    pub async fn closed(self) -> CallSession {
        let session = release_when_over(&self.controller, &self.registry, &self.pair).await;
        info!(
            "Session for {} in room {} closed ({})",
            self.identity.id, session.room_id, session.state
        );
        session
    }
}

async fn release_when_over(
    controller: &CallController,
    registry: &SessionClientRegistry,
    pair: &Arc<ClientPair>,
) -> CallSession {
    let mut updates = controller.subscribe();
    let reached = updates
        .wait_for(|s| s.state.is_terminal())
        .await
        .map(|s| (*s).clone());
    let session = reached.unwrap_or_else(|_| controller.session());

    registry.release(pair).await;
    session
}

// Fake real-time providers shared by the integration tests.
//
// Every fake counts the calls it receives and can be told to fail or to
// block until released, so tests can force specific interleavings.

#![allow(dead_code)]

use async_trait::async_trait;
use meeting_room::call::CallSettings;
use meeting_room::credentials::{AccessToken, IssueError, UserDirectory, UserRecord};
use meeting_room::providers::{
    ChatClient, ChatProvider, MediaClient, MediaProvider, ProviderError, Room, RoomEvent,
    RoomSetup, TokenProvider,
};
use meeting_room::Identity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Yield until `cond` holds (bounded so a broken test fails instead of hanging)
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn fast_settings() -> CallSettings {
    CallSettings {
        join_timeout: Duration::from_secs(5),
        leave_timeout: Duration::from_secs(5),
        ..CallSettings::default()
    }
}

// ============================================================================
// Media
// ============================================================================

#[derive(Default)]
pub struct FakeRoom {
    pub get_or_create_calls: AtomicUsize,
    pub join_calls: AtomicUsize,
    pub start_captions_calls: AtomicUsize,
    pub stop_captions_calls: AtomicUsize,
    pub leave_calls: AtomicUsize,

    pub join_error: Mutex<Option<String>>,
    pub start_captions_fails: bool,
    pub stop_captions_fails: bool,
    pub leave_fails: bool,

    /// When set, join waits for a permit before completing
    pub join_gate: Option<Arc<Notify>>,

    pub last_setup: Mutex<Option<RoomSetup>>,
    pub last_language: Mutex<Option<String>>,
    pub events: Mutex<Option<broadcast::Sender<RoomEvent>>>,
}

impl FakeRoom {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            events: Mutex::new(Some(tx)),
            ..Self::default()
        }
    }

    pub fn failing_join(message: &str) -> Self {
        let room = Self::new();
        *room.join_error.lock().unwrap() = Some(message.to_string());
        room
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            join_gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn emit(&self, event: RoomEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Receivers still subscribed to room events
    pub fn subscribers(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .as_ref()
            .map_or(0, |tx| tx.receiver_count())
    }

    /// Drop the sender so subscribers see the channel close
    pub fn close_events(&self) {
        self.events.lock().unwrap().take();
    }
}

#[async_trait]
impl Room for FakeRoom {
    fn room_type(&self) -> &str {
        "default"
    }

    fn id(&self) -> &str {
        "fake-room"
    }

    async fn get_or_create(&self, setup: &RoomSetup) -> Result<(), ProviderError> {
        self.get_or_create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_setup.lock().unwrap() = Some(setup.clone());
        Ok(())
    }

    async fn join(&self) -> Result<(), ProviderError> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.join_gate {
            gate.notified().await;
        }
        let error = self.join_error.lock().unwrap().clone();
        match error {
            Some(message) => Err(ProviderError::Rejected(message)),
            None => Ok(()),
        }
    }

    async fn start_closed_captions(&self, language: &str) -> Result<(), ProviderError> {
        self.start_captions_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_language.lock().unwrap() = Some(language.to_string());
        if self.start_captions_fails {
            return Err(ProviderError::Rejected("captions unavailable".to_string()));
        }
        Ok(())
    }

    async fn stop_closed_captions(&self) -> Result<(), ProviderError> {
        self.stop_captions_calls.fetch_add(1, Ordering::SeqCst);
        if self.stop_captions_fails {
            return Err(ProviderError::Transport("captions already stopped".to_string()));
        }
        Ok(())
    }

    async fn leave(&self) -> Result<(), ProviderError> {
        self.leave_calls.fetch_add(1, Ordering::SeqCst);
        if self.leave_fails {
            return Err(ProviderError::Transport("socket closed".to_string()));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        match self.events.lock().unwrap().as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }
}

pub struct FakeMediaClient {
    pub user_id: String,
    pub room: Arc<FakeRoom>,
    pub tokens: Option<TokenProvider>,
    pub disconnect_calls: AtomicUsize,
    pub disconnect_fails: bool,
}

impl FakeMediaClient {
    pub fn new(room: Arc<FakeRoom>) -> Self {
        Self {
            user_id: "alice".to_string(),
            room,
            tokens: None,
            disconnect_calls: AtomicUsize::new(0),
            disconnect_fails: false,
        }
    }
}

#[async_trait]
impl MediaClient for FakeMediaClient {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn room(&self, _room_type: &str, _room_id: &str) -> Arc<dyn Room> {
        self.room.clone()
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.disconnect_fails {
            return Err(ProviderError::Transport("already gone".to_string()));
        }
        Ok(())
    }
}

/// Builds one `FakeMediaClient` per call, all sharing `room`
pub struct FakeMediaProvider {
    pub room: Arc<FakeRoom>,
    pub clients: Mutex<Vec<Arc<FakeMediaClient>>>,
    pub disconnect_fails: bool,
}

impl FakeMediaProvider {
    pub fn new(room: Arc<FakeRoom>) -> Self {
        Self {
            room,
            clients: Mutex::new(Vec::new()),
            disconnect_fails: false,
        }
    }

    pub fn created(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    pub fn client(&self, index: usize) -> Arc<FakeMediaClient> {
        self.clients.lock().unwrap()[index].clone()
    }
}

impl MediaProvider for FakeMediaProvider {
    fn create_client(
        &self,
        _api_key: &str,
        identity: &Identity,
        tokens: TokenProvider,
    ) -> Result<Arc<dyn MediaClient>, ProviderError> {
        let client = Arc::new(FakeMediaClient {
            user_id: identity.id.clone(),
            room: self.room.clone(),
            tokens: Some(tokens),
            disconnect_calls: AtomicUsize::new(0),
            disconnect_fails: self.disconnect_fails,
        });
        self.clients.lock().unwrap().push(client.clone());
        Ok(client)
    }
}

// ============================================================================
// Chat
// ============================================================================

pub struct FakeChatClient {
    pub user_id: String,
    pub token: String,
    pub disconnect_calls: AtomicUsize,
    pub disconnect_fails: bool,
}

#[async_trait]
impl ChatClient for FakeChatClient {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn disconnect_user(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.disconnect_fails {
            return Err(ProviderError::Transport("already gone".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeChatProvider {
    pub connect_calls: AtomicUsize,
    pub fail_connect: bool,
    pub disconnect_fails: bool,
    /// Connects presenting these tokens wait for a permit first
    pub gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub clients: Mutex<Vec<Arc<FakeChatClient>>>,
}

impl FakeChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn gate(&self, token: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(token.to_string(), gate.clone());
        gate
    }

    pub fn client(&self, index: usize) -> Arc<FakeChatClient> {
        self.clients.lock().unwrap()[index].clone()
    }

    pub fn connected(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for FakeChatProvider {
    async fn connect_user(
        &self,
        _api_key: &str,
        identity: &Identity,
        token: &AccessToken,
    ) -> Result<Arc<dyn ChatClient>, ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(token.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_connect {
            return Err(ProviderError::Rejected("invalid token".to_string()));
        }

        let client = Arc::new(FakeChatClient {
            user_id: identity.id.clone(),
            token: token.as_str().to_string(),
            disconnect_calls: AtomicUsize::new(0),
            disconnect_fails: self.disconnect_fails,
        });
        self.clients.lock().unwrap().push(client.clone());
        Ok(client)
    }
}

// ============================================================================
// User directory
// ============================================================================

/// Directory that rejects every upsert
pub struct RejectingDirectory;

#[async_trait]
impl UserDirectory for RejectingDirectory {
    async fn upsert_user(&self, _user: &UserRecord) -> Result<(), IssueError> {
        Err(IssueError::Upstream(
            "401 Unauthorized: api_key not valid".to_string(),
        ))
    }
}

use crate::providers::{ChatClient, MediaClient};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Registry key: one pair per API key and identity id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub api_key: String,
    pub identity_id: String,
}

impl ClientKey {
    pub fn new(api_key: impl Into<String>, identity_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            identity_id: identity_id.into(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_key, self.identity_id)
    }
}

/// Both live connections behind one session
///
/// Only ever built with both members connected. Disconnected at most once.
pub struct ClientPair {
    key: ClientKey,
    generation: u64,
    media: Arc<dyn MediaClient>,
    chat: Arc<dyn ChatClient>,
    released: AtomicBool,
}

impl ClientPair {
    pub(crate) fn new(
        key: ClientKey,
        generation: u64,
        media: Arc<dyn MediaClient>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            key,
            generation,
            media,
            chat,
            released: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    /// Attempt id of the acquire that built this pair
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Borrow the media client; callers must not disconnect it
    pub fn media(&self) -> Arc<dyn MediaClient> {
        Arc::clone(&self.media)
    }

    pub fn chat(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&self.chat)
    }

    /// Whether both clients have been disconnected
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Claim the disconnect; only the first caller gets `true`
    pub(crate) fn mark_released(&self) -> bool {
        !self.released.swap(true, Ordering::SeqCst)
    }
}

impl fmt::Debug for ClientPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPair")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Outcome of an acquire
#[derive(Debug, Clone)]
pub enum Acquire {
    /// An input is missing; nothing was attempted
    Waiting,
    /// A connect for these inputs is in flight, or this attempt was superseded
    Pending,
    Ready(Arc<ClientPair>),
}

impl Acquire {
    pub fn ready(self) -> Option<Arc<ClientPair>> {
        match self {
            Acquire::Ready(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Acquire::Ready(_))
    }
}

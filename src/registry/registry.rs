use super::error::ConnectError;
use super::pair::{Acquire, ClientKey, ClientPair};
use crate::credentials::AccessToken;
use crate::identity::Identity;
use crate::providers::{static_token_provider, ChatProvider, MediaProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

enum EntryState {
    Connecting,
    Ready(Arc<ClientPair>),
}

struct Entry {
    generation: u64,
    token: AccessToken,
    state: EntryState,
}

/// Establishes and releases the client pairs of live sessions
pub struct SessionClientRegistry {
    media_provider: Arc<dyn MediaProvider>,
    chat_provider: Arc<dyn ChatProvider>,

    /// Live or connecting pairs (key → entry)
    entries: Mutex<HashMap<ClientKey, Entry>>,

    /// Attempt id source; strictly increasing per registry
    next_generation: AtomicU64,
}

impl SessionClientRegistry {
    pub fn new(
        media_provider: Arc<dyn MediaProvider>,
        chat_provider: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            media_provider,
            chat_provider,
            entries: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Establish (or reuse) the client pair for these inputs
    ///
    /// Returns [`Acquire::Waiting`] without doing anything when an input is
    /// missing. A connect that finishes after a newer acquire for the same
    /// key has started is discarded and reported as [`Acquire::Pending`].
    pub async fn acquire(
        &self,
        api_key: Option<&str>,
        identity: Option<&Identity>,
        token: Option<&AccessToken>,
    ) -> Result<Acquire, ConnectError> {
        let (api_key, identity, token) = match (api_key, identity, token) {
            (Some(k), Some(i), Some(t)) if !k.is_empty() && !i.is_empty() && !t.is_empty() => {
                (k, i, t)
            }
            _ => {
                debug!("Acquire skipped: waiting for api key, identity and token");
                return Ok(Acquire::Waiting);
            }
        };

        let key = ClientKey::new(api_key, identity.id.clone());
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

        let superseded = {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if entry.token == *token {
                    return Ok(match &entry.state {
                        EntryState::Ready(pair) => Acquire::Ready(Arc::clone(pair)),
                        EntryState::Connecting => Acquire::Pending,
                    });
                }
            }

            entries
                .insert(
                    key.clone(),
                    Entry {
                        generation,
                        token: token.clone(),
                        state: EntryState::Connecting,
                    },
                )
                .and_then(|old| match old.state {
                    EntryState::Ready(pair) => Some(pair),
                    EntryState::Connecting => None,
                })
        };

        if let Some(old) = superseded {
            info!("Token changed for {}; releasing previous clients", key);
            Self::disconnect(&old).await;
        }

        info!("Connecting clients for {} (attempt {})", key, generation);

        let pair = match self.connect(&key, generation, identity, token).await {
            Ok(pair) => Arc::new(pair),
            Err(e) => {
                error!("Error initializing clients for {}: {}", key, e);
                let mut entries = self.entries.lock().await;
                if entries.get(&key).map(|entry| entry.generation) == Some(generation) {
                    entries.remove(&key);
                }
                return Err(e);
            }
        };

        let adopted = {
            let mut entries = self.entries.lock().await;
            match entries.get_mut(&key) {
                Some(entry) if entry.generation == generation => {
                    entry.state = EntryState::Ready(Arc::clone(&pair));
                    true
                }
                _ => false,
            }
        };

        if adopted {
            info!("Clients ready for {} (attempt {})", key, generation);
            Ok(Acquire::Ready(pair))
        } else {
            warn!(
                "Discarding stale clients for {} (attempt {} was superseded)",
                key, generation
            );
            Self::disconnect(&pair).await;
            Ok(Acquire::Pending)
        }
    }

    /// Disconnect both clients of `pair`
    ///
    /// Never fails; disconnect errors are logged. A pair that was already
    /// disconnected, for example because a token change replaced it, is left
    /// alone.
    pub async fn release(&self, pair: &Arc<ClientPair>) {
        {
            let mut entries = self.entries.lock().await;
            let owned = matches!(
                entries.get(pair.key()),
                Some(Entry { state: EntryState::Ready(current), .. }) if Arc::ptr_eq(current, pair)
            );
            if owned {
                entries.remove(pair.key());
            }
        }

        if pair.is_released() {
            debug!("Clients for {} already released", pair.key());
            return;
        }

        info!("Releasing clients for {}", pair.key());
        Self::disconnect(pair).await;
    }

    /// The ready pair for `key`, if any
    pub async fn get(&self, key: &ClientKey) -> Option<Arc<ClientPair>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(Entry {
                state: EntryState::Ready(pair),
                ..
            }) => Some(Arc::clone(pair)),
            _ => None,
        }
    }

    /// Number of pairs that are connecting or ready
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn connect(
        &self,
        key: &ClientKey,
        generation: u64,
        identity: &Identity,
        token: &AccessToken,
    ) -> Result<ClientPair, ConnectError> {
        let media = self
            .media_provider
            .create_client(&key.api_key, identity, static_token_provider(token.clone()))
            .map_err(ConnectError::Media)?;

        let chat = match self
            .chat_provider
            .connect_user(&key.api_key, identity, token)
            .await
        {
            Ok(chat) => chat,
            Err(e) => {
                // Never leave the media half connected on its own
                if let Err(disconnect_err) = media.disconnect().await {
                    warn!(
                        "Failed to disconnect media client for {}: {}",
                        key, disconnect_err
                    );
                }
                return Err(ConnectError::Chat(e));
            }
        };

        Ok(ClientPair::new(key.clone(), generation, media, chat))
    }

    async fn disconnect(pair: &ClientPair) {
        if !pair.mark_released() {
            return;
        }

        if let Err(e) = pair.chat().disconnect_user().await {
            warn!("Failed to disconnect chat client for {}: {}", pair.key(), e);
        }
        if let Err(e) = pair.media().disconnect().await {
            warn!("Failed to disconnect media client for {}: {}", pair.key(), e);
        }
    }
}

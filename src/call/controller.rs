use super::error::JoinError;
use super::settings::CallSettings;
use super::state::{CallSession, CallState, CallTrigger};
use super::transcript::TranscriptSegment;
use crate::identity::Identity;
use crate::providers::{ClosedCaption, MediaClient, Room, RoomEvent, RoomSetup};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Called once when the owning context should navigate away
pub type OnLeave = Box<dyn Fn() + Send + Sync>;

enum ExitAction {
    Leave,
    NotifyOnly,
    Deferred,
    AlreadyLeaving,
}

/// Drives one participant through one room
///
/// The media client is borrowed: the controller never disconnects it.
pub struct CallController {
    room_id: String,
    identity: Identity,
    media: Arc<dyn MediaClient>,
    settings: CallSettings,

    /// Set by the first join attempt
    joined: AtomicBool,

    /// Set by every exit trigger, read when a join resolves
    exit_requested: AtomicBool,

    /// Set when the owner has been notified
    notified: AtomicBool,

    /// Current snapshot; state transitions are check-then-set inside the
    /// sender's lock
    session: watch::Sender<CallSession>,

    /// The joined room
    room: Mutex<Option<Arc<dyn Room>>>,

    /// Caption lines collected while active
    transcript: Mutex<Vec<TranscriptSegment>>,

    on_leave: OnLeave,
}

impl CallController {
    pub fn new(
        media: Arc<dyn MediaClient>,
        identity: Identity,
        room_id: impl Into<String>,
        settings: CallSettings,
        on_leave: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        let room_id = room_id.into();
        let (session, _) = watch::channel(CallSession::new(room_id.clone()));

        Arc::new(Self {
            room_id,
            identity,
            media,
            settings,
            joined: AtomicBool::new(false),
            exit_requested: AtomicBool::new(false),
            notified: AtomicBool::new(false),
            session,
            room: Mutex::new(None),
            transcript: Mutex::new(Vec::new()),
            on_leave: Box::new(on_leave),
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn session(&self) -> CallSession {
        self.session.borrow().clone()
    }

    pub fn state(&self) -> CallState {
        self.session.borrow().state
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<CallSession> {
        self.session.subscribe()
    }

    /// Whether the owner has been told to navigate away
    pub fn has_notified(&self) -> bool {
        self.notified.load(Ordering::SeqCst)
    }

    /// Caption lines received so far
    pub async fn transcript(&self) -> Vec<TranscriptSegment> {
        let segments = self.transcript.lock().await;
        segments.clone()
    }

    /// Feed a trigger into the state machine
    ///
    /// Only `InputsReady` can fail. Teardown is fire-and-forget and returns
    /// as soon as the cleanup task is spawned.
    pub async fn dispatch(self: &Arc<Self>, trigger: CallTrigger) -> Result<(), JoinError> {
        match trigger {
            CallTrigger::InputsReady => self.join().await,
            CallTrigger::UserLeaveRequested | CallTrigger::RemoteEnded => {
                self.exit(trigger).await;
                Ok(())
            }
            CallTrigger::TeardownRequested => {
                self.teardown();
                Ok(())
            }
        }
    }

    /// Create-or-get the room and join it
    ///
    /// Only the first call does anything. Joining runs to completion; an
    /// exit requested meanwhile is carried out once the join resolves.
    pub async fn join(self: &Arc<Self>) -> Result<(), JoinError> {
        if self.room_id.trim().is_empty() {
            debug!("Join skipped: no room id yet");
            return Ok(());
        }

        if self
            .joined
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Join already attempted for call {}", self.room_id);
            return Ok(());
        }

        let started = self.session.send_if_modified(|s| {
            if s.state == CallState::Uninitialized {
                s.state = CallState::Joining;
                true
            } else {
                false
            }
        });
        if !started {
            info!("Call {} exited before joining", self.room_id);
            return Ok(());
        }

        info!("Joining call {} as {}", self.room_id, self.identity.id);

        let room = self.media.room(&self.settings.call_type, &self.room_id);
        let setup = RoomSetup::for_creator(&self.identity);
        let attempt = async {
            match room.get_or_create(&setup).await {
                Ok(()) => room.join().await,
                Err(e) => Err(e),
            }
        };

        let result = match timeout(self.settings.join_timeout, attempt).await {
            Ok(joined) => joined.map_err(JoinError::from),
            Err(_) => Err(JoinError::Timeout(self.settings.join_timeout)),
        };

        if let Err(e) = result {
            error!("Failed to join call {}: {}", self.room_id, e);
            let message = e.to_string();
            self.session.send_modify(|s| {
                s.state = CallState::Failed;
                s.error = Some(message);
            });
            if self.exit_requested.load(Ordering::SeqCst) {
                self.notify_owner();
            }
            return Err(e);
        }

        // Subscribe before anything else can end the session
        let events = room.subscribe();

        {
            let mut joined_room = self.room.lock().await;
            *joined_room = Some(Arc::clone(&room));
        }

        let mut leave_now = false;
        self.session.send_modify(|s| {
            if self.exit_requested.load(Ordering::SeqCst) {
                s.state = CallState::Leaving;
                leave_now = true;
            } else {
                s.state = CallState::Active;
            }
        });

        if leave_now {
            info!(
                "Exit was requested while joining call {}; leaving",
                self.room_id
            );
            self.run_leave(&room).await;
            return Ok(());
        }

        info!("Joined call {}", self.room_id);

        match room
            .start_closed_captions(&self.settings.caption_language)
            .await
        {
            Ok(()) => {
                self.session.send_if_modified(|s| {
                    if s.state == CallState::Active {
                        s.captions_enabled = true;
                        true
                    } else {
                        false
                    }
                });
            }
            Err(e) => warn!("Failed to enable captions for call {}: {}", self.room_id, e),
        }

        self.spawn_listener(events);

        Ok(())
    }

    /// Leave because of `trigger`
    ///
    /// The first exit wins; later ones are no-ops. Exits before the room
    /// was joined only notify the owner.
    pub async fn exit(self: &Arc<Self>, trigger: CallTrigger) {
        self.exit_requested.store(true, Ordering::SeqCst);

        let mut action = ExitAction::AlreadyLeaving;
        self.session.send_if_modified(|s| match s.state {
            CallState::Uninitialized => {
                s.state = CallState::Left;
                action = ExitAction::NotifyOnly;
                true
            }
            CallState::Active => {
                s.state = CallState::Leaving;
                action = ExitAction::Leave;
                true
            }
            CallState::Failed => {
                action = ExitAction::NotifyOnly;
                false
            }
            CallState::Joining => {
                action = ExitAction::Deferred;
                false
            }
            CallState::Leaving | CallState::Left => false,
        });

        match action {
            ExitAction::Leave => {
                info!("Leaving call {} ({:?})", self.room_id, trigger);
                let room = self.room.lock().await.clone();
                match room {
                    Some(room) => self.run_leave(&room).await,
                    None => {
                        self.session.send_modify(|s| s.state = CallState::Left);
                        self.notify_owner();
                    }
                }
            }
            ExitAction::NotifyOnly => {
                debug!("Call {} has no room to leave ({:?})", self.room_id, trigger);
                self.notify_owner();
            }
            ExitAction::Deferred => {
                info!(
                    "{:?} while joining call {}; leaving once join resolves",
                    trigger, self.room_id
                );
            }
            ExitAction::AlreadyLeaving => {
                debug!("Call {} already leaving ({:?})", self.room_id, trigger);
            }
        }
    }

    /// Start cleanup without waiting for it
    pub fn teardown(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.exit(CallTrigger::TeardownRequested).await;
        })
    }

    async fn run_leave(&self, room: &Arc<dyn Room>) {
        if let Err(e) = room.stop_closed_captions().await {
            debug!("Ignoring caption stop failure for call {}: {}", self.room_id, e);
        }
        self.session.send_modify(|s| s.captions_enabled = false);

        match timeout(self.settings.leave_timeout, room.leave()).await {
            Ok(Ok(())) => info!("Left call {}", self.room_id),
            Ok(Err(e)) => warn!("Error leaving call {}: {}", self.room_id, e),
            Err(_) => warn!(
                "Timed out leaving call {} after {:?}",
                self.room_id, self.settings.leave_timeout
            ),
        }

        self.room.lock().await.take();
        self.session.send_modify(|s| s.state = CallState::Left);
        self.notify_owner();
    }

    /// Forward room events until the call is over or the room closes its
    /// event channel
    fn spawn_listener(self: &Arc<Self>, mut events: broadcast::Receiver<RoomEvent>) {
        let controller = Arc::downgrade(self);
        let mut updates = self.session.subscribe();
        let room_id = self.room_id.clone();

        tokio::spawn(async move {
            debug!("Room event listener started for call {}", room_id);

            loop {
                let received = tokio::select! {
                    received = events.recv() => received,
                    _ = wait_until_over(&mut updates) => break,
                };

                let event = match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Dropped {} room events for call {}", skipped, room_id);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let Some(this) = controller.upgrade() else {
                    break;
                };

                match event {
                    RoomEvent::SessionEnded => {
                        info!("Call {} ended", room_id);
                        this.exit(CallTrigger::RemoteEnded).await;
                        break;
                    }
                    RoomEvent::ClosedCaption(caption) => this.record_caption(caption).await,
                    RoomEvent::ParticipantJoined { user_id } => {
                        info!("Participant joined call {}: {}", room_id, user_id)
                    }
                    RoomEvent::ParticipantLeft { user_id } => {
                        info!("Participant left call {}: {}", room_id, user_id)
                    }
                }
            }

            debug!("Room event listener stopped for call {}", room_id);
        });
    }

    async fn record_caption(&self, caption: ClosedCaption) {
        if self.state() != CallState::Active || caption.text.trim().is_empty() {
            return;
        }

        debug!("[{}]: {}", caption.speaker_id, caption.text);

        let mut segments = self.transcript.lock().await;
        segments.push(TranscriptSegment {
            speaker_id: caption.speaker_id,
            text: caption.text,
            timestamp: Utc::now(),
        });
    }

    fn notify_owner(&self) {
        if self.notified.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Call {} closed; notifying owner", self.room_id);
        (self.on_leave)();
    }
}

/// Resolves once the call reaches `Left` or `Failed`, or the controller is gone
async fn wait_until_over(updates: &mut watch::Receiver<CallSession>) {
    let _ = updates.wait_for(|s| s.state.is_terminal()).await;
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Uninitialized,
    Joining,
    Active,
    Leaving,
    Left,
    Failed,
}

impl CallState {
    /// No further transitions happen from here
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Left | CallState::Failed)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Uninitialized => "uninitialized",
            CallState::Joining => "joining",
            CallState::Active => "active",
            CallState::Leaving => "leaving",
            CallState::Left => "left",
            CallState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Events that drive a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTrigger {
    /// Media client and room id are available
    InputsReady,
    UserLeaveRequested,
    /// The provider ended the session for everyone
    RemoteEnded,
    /// The owning context is going away
    TeardownRequested,
}

/// Observable snapshot of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    pub room_id: String,
    pub state: CallState,
    pub captions_enabled: bool,
    /// Join error text, set only in `Failed`
    pub error: Option<String>,
}

impl CallSession {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            state: CallState::Uninitialized,
            captions_enabled: false,
            error: None,
        }
    }
}

//! Call lifecycle controller
//!
//! This module drives one participant through a room:
//! - Create-or-get the room and join it, at most once
//! - Enable captions and collect caption lines while active
//! - Leave exactly once, whichever exit trigger arrives first
//! - Notify the owning context exactly once, even if leave fails

mod controller;
mod error;
mod settings;
mod state;
mod transcript;

pub use controller::{CallController, OnLeave};
pub use error::JoinError;
pub use settings::CallSettings;
pub use state::{CallSession, CallState, CallTrigger};
pub use transcript::TranscriptSegment;

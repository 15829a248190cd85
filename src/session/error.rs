use crate::call::JoinError;
use thiserror::Error;

/// What the participant sees when a session cannot start
#[derive(Debug, Error)]
pub enum SessionError {
    /// Token fetch or client connect failed; detail is in the logs
    #[error("Unable to connect to the meeting. Please try again.")]
    Unavailable,

    #[error("A meeting room id is required")]
    MissingRoom,

    #[error("{0}")]
    Join(#[from] JoinError),
}

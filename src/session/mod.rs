//! Meeting session
//!
//! Headless version of the meeting page flow:
//! - Derive the participant identity from the display name
//! - Fetch a token from the issuer (in-process or over HTTP)
//! - Acquire the media + chat client pair
//! - Join the call and release the clients once it is over

mod error;
mod meeting;
mod token_source;

pub use error::SessionError;
pub use meeting::{ActiveMeeting, MeetingSession};
pub use token_source::{HttpTokenSource, TokenSource};

pub mod call;
pub mod config;
pub mod credentials;
pub mod http;
pub mod identity;
pub mod providers;
pub mod registry;
pub mod session;

pub use call::{
    CallController, CallSession, CallSettings, CallState, CallTrigger, JoinError, TranscriptSegment,
};
pub use config::Config;
pub use credentials::{
    AccessToken, CredentialIssuer, InMemoryUserDirectory, IssueError, TokenPolicy, UserDirectory,
};
pub use http::{create_router, AppState};
pub use identity::Identity;
pub use providers::{
    ChatClient, ChatProvider, MediaClient, MediaProvider, ProviderError, Room, RoomEvent,
};
pub use registry::{Acquire, ClientPair, ConnectError, SessionClientRegistry};
pub use session::{ActiveMeeting, HttpTokenSource, MeetingSession, SessionError, TokenSource};

//! Capability contracts for the hosted real-time services
//!
//! The media transport and chat delivery are owned by an external provider.
//! These traits are the only surface the registry and the call controller
//! depend on:
//! - `MediaProvider` / `MediaClient` / `Room` - audio/video rooms with captions
//! - `ChatProvider` / `ChatClient` - per-user chat connections

mod chat;
mod error;
mod media;

pub use chat::{ChatClient, ChatProvider};
pub use error::ProviderError;
pub use media::{
    static_token_provider, ClosedCaption, MediaClient, MediaProvider, Room, RoomEvent, RoomMember,
    RoomSetup, TokenProvider,
};

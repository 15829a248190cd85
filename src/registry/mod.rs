//! Session client registry
//!
//! Owns the media + chat connections behind one session:
//! - Builds both clients for an `(api_key, identity)` pair
//! - Reuses a ready pair for unchanged inputs
//! - Drops results that a newer acquire superseded
//! - Disconnects both clients on release, logging failures

mod error;
mod pair;
mod registry;

pub use error::ConnectError;
pub use pair::{Acquire, ClientKey, ClientPair};
pub use registry::SessionClientRegistry;

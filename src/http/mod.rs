//! HTTP API for the meeting client
//!
//! - POST /api/token - Mint a participant token (`{ "userId": ... }`)
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

//! Credential issuance
//!
//! Mints short-lived access tokens for meeting participants:
//! - Upserts the participant into the backing service's user directory
//! - Signs an HS256 token scoped to the participant's user id
//! - Backdates issued-at to absorb clock skew between issuer and validator

mod directory;
mod error;
mod issuer;
mod token;

pub use directory::{InMemoryUserDirectory, StreamUserDirectory, UserDirectory, UserRecord};
pub use error::IssueError;
pub use issuer::{ApiCredentials, CredentialIssuer, TokenPolicy};
pub use token::{AccessToken, TokenClaims};

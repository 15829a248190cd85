use crate::providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    #[error("failed to create media client: {0}")]
    Media(ProviderError),

    #[error("failed to connect chat client: {0}")]
    Chat(ProviderError),
}

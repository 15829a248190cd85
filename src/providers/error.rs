use thiserror::Error;

/// Failure reported by an external real-time service
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

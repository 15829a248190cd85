use crate::providers::ProviderError;
use std::time::Duration;
use thiserror::Error;

/// Why a join attempt ended in `Failed`
#[derive(Debug, Clone, Error)]
pub enum JoinError {
    #[error("{0}")]
    Room(#[from] ProviderError),

    #[error("timed out joining the call after {0:?}")]
    Timeout(Duration),
}

use crate::config::CallConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSettings {
    /// Room type passed to create-or-get (e.g., "default")
    pub call_type: String,

    /// Caption language enabled after joining
    pub caption_language: String,

    /// Upper bound for create-or-get plus join
    pub join_timeout: Duration,

    /// Upper bound for leave
    pub leave_timeout: Duration,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            call_type: "default".to_string(),
            caption_language: "en".to_string(),
            join_timeout: Duration::from_secs(30),
            leave_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&CallConfig> for CallSettings {
    fn from(cfg: &CallConfig) -> Self {
        Self {
            call_type: cfg.call_type.clone(),
            caption_language: cfg.caption_language.clone(),
            join_timeout: Duration::from_secs(cfg.join_timeout_secs),
            leave_timeout: Duration::from_secs(cfg.leave_timeout_secs),
        }
    }
}

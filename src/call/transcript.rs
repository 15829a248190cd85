use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single caption line received while the call was active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Participant who spoke
    pub speaker_id: String,

    /// Caption text
    pub text: String,

    /// When this segment was received
    pub timestamp: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};
use crate::entry::TranscriptEntry;

/// The persisted conversation record.
///
/// Serialized wholesale under a fixed storage key on every transcript
/// mutation; a reload restores exactly what was last acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub transcript: Vec<TranscriptEntry>,
    pub updated_at: String,
}

impl Session {
    pub fn new(transcript: Vec<TranscriptEntry>) -> Self {
        Self {
            transcript,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
